pub mod error;
pub mod filter;
pub mod store;
pub mod testing;

pub use error::StoreError;
pub use filter::{
    AppointmentFilter, BankFilter, DonationFilter, DonorFilter, InventoryFilter, RequestFilter,
};
pub use store::{BloodBankStore, CasResult};
