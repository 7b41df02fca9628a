use async_trait::async_trait;
use chrono::{DateTime, Utc};

use ebloodbank_core::{
    Account, AccountId, Appointment, AppointmentId, BankId, BloodBank, BloodGroup, BloodRequest,
    Donation, Donor, DonorId, InventoryItem, InventorySet, RequestId,
};

use crate::error::StoreError;
use crate::filter::{
    AppointmentFilter, BankFilter, DonationFilter, DonorFilter, InventoryFilter, RequestFilter,
};

/// Result of a compare-and-swap on a versioned row.
#[derive(Debug, Clone, PartialEq)]
pub enum CasResult<T> {
    /// The row now holds the new value.
    Swapped(T),
    /// Another writer got there first; this is the row as it stands now.
    Conflict { current: T },
}

/// Persistence for every ebloodbank entity.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Each method is one atomic unit: on error nothing it would have written
/// is visible.
#[async_trait]
pub trait BloodBankStore: Send + Sync {
    // -- accounts & banks ----------------------------------------------------

    /// Insert or replace an account mirrored from the identity collaborator.
    async fn upsert_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Look an account up by e-mail, trimmed and ignoring case.
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Insert or replace a bank by id.
    ///
    /// Fails with `NotFound` when the operator account does not exist and
    /// with `Duplicate` when another bank already uses the code or operator.
    async fn upsert_bank(&self, bank: &BloodBank) -> Result<(), StoreError>;

    async fn get_bank(&self, id: BankId) -> Result<Option<BloodBank>, StoreError>;

    /// The bank operated by `account`, if any.
    async fn find_bank_by_account(
        &self,
        account: AccountId,
    ) -> Result<Option<BloodBank>, StoreError>;

    /// Banks ordered by name.
    async fn list_banks(&self, filter: &BankFilter) -> Result<Vec<BloodBank>, StoreError>;

    // -- requests ------------------------------------------------------------

    /// Insert a new request. Fails with `Duplicate` if its id or code is
    /// taken.
    async fn insert_request(&self, request: &BloodRequest) -> Result<(), StoreError>;

    async fn get_request(&self, id: RequestId) -> Result<Option<BloodRequest>, StoreError>;

    /// Requests matching `filter`, newest first.
    async fn list_requests(&self, filter: &RequestFilter)
    -> Result<Vec<BloodRequest>, StoreError>;

    /// Replace the stored request with `updated` only if its version is still
    /// `expected_version`. Fails with `NotFound` if the request is gone.
    async fn compare_and_swap_request(
        &self,
        updated: &BloodRequest,
        expected_version: i64,
    ) -> Result<CasResult<BloodRequest>, StoreError>;

    // -- donors --------------------------------------------------------------

    async fn get_donor(&self, id: DonorId) -> Result<Option<Donor>, StoreError>;

    async fn find_donor_by_account(&self, account: AccountId)
    -> Result<Option<Donor>, StoreError>;

    /// Return the donor linked to `candidate.account`, inserting `candidate`
    /// if there is none. Concurrent callers for one account all get the same
    /// row.
    async fn get_or_create_donor(&self, candidate: &Donor) -> Result<Donor, StoreError>;

    async fn list_donors(&self, filter: &DonorFilter) -> Result<Vec<Donor>, StoreError>;

    // -- donations -----------------------------------------------------------

    /// Record a donation as one atomic unit:
    ///
    /// 1. insert `donation`;
    /// 2. add `units_donated` to the `(bloodbank, blood_group)` inventory row,
    ///    creating it with the default threshold if absent;
    /// 3. set the donor's `last_donation_date` to the donation date.
    ///
    /// Returns the credited inventory row. Fails with `NotFound` when the
    /// donor or bank is missing and `Duplicate` when the id or code is taken;
    /// in both cases none of the three effects is visible.
    async fn record_donation(&self, donation: &Donation) -> Result<InventoryItem, StoreError>;

    /// Donations matching `filter`, newest donation date first.
    async fn list_donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, StoreError>;

    // -- inventory -----------------------------------------------------------

    async fn get_inventory(
        &self,
        bloodbank: BankId,
        blood_group: BloodGroup,
    ) -> Result<Option<InventoryItem>, StoreError>;

    async fn list_inventory(
        &self,
        filter: &InventoryFilter,
    ) -> Result<Vec<InventoryItem>, StoreError>;

    /// Absolute set of one row, created if absent. Never adds to the
    /// existing count.
    async fn set_inventory(
        &self,
        bloodbank: BankId,
        set: &InventorySet,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem, StoreError>;

    // -- appointments --------------------------------------------------------

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), StoreError>;

    async fn get_appointment(&self, id: AppointmentId)
    -> Result<Option<Appointment>, StoreError>;

    /// Appointments matching `filter`, soonest first.
    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Replace an existing appointment. Fails with `NotFound` if absent.
    async fn update_appointment(&self, appointment: &Appointment) -> Result<(), StoreError>;
}
