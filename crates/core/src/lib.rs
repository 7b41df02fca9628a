pub mod account;
pub mod appointment;
pub mod blood_group;
pub mod code;
pub mod donation;
pub mod donor;
pub mod error;
pub mod inventory;
pub mod principal;
pub mod request;
pub mod state_machine;
pub mod types;
pub mod validate;

pub use account::{Account, AccountKind, AccountProfile, BloodBank};
pub use appointment::{Appointment, AppointmentStatus, NewAppointment};
pub use blood_group::BloodGroup;
pub use code::generate_code;
pub use donation::{Donation, DonationInput, DonorRef};
pub use donor::{Donor, Gender, normalize_phone};
pub use error::{TransitionError, ValidationError};
pub use inventory::{DEFAULT_MIN_STOCK, InventoryItem, InventorySet, InventoryView};
pub use principal::Principal;
pub use request::{BloodRequest, NewBloodRequest, RequestPatch, RequestStatus, Urgency};
pub use state_machine::RequestAction;
pub use types::{AccountId, AppointmentId, BankId, DonationId, DonorId, RequestId, now};
