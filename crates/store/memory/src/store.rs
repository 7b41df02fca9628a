use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;

use ebloodbank_core::{
    Account, AccountId, Appointment, AppointmentId, BankId, BloodBank, BloodGroup, BloodRequest,
    Donation, DonationId, Donor, DonorId, InventoryItem, InventorySet, RequestId,
};
use ebloodbank_store::error::StoreError;
use ebloodbank_store::filter::{
    AppointmentFilter, BankFilter, DonationFilter, DonorFilter, InventoryFilter, RequestFilter,
};
use ebloodbank_store::store::{BloodBankStore, CasResult};

/// Every entity except accounts, guarded together so that multi-row writes
/// are atomic.
#[derive(Debug, Default)]
struct Tables {
    banks: HashMap<BankId, BloodBank>,
    requests: HashMap<RequestId, BloodRequest>,
    request_codes: HashSet<String>,
    donors: HashMap<DonorId, Donor>,
    donor_by_account: HashMap<AccountId, DonorId>,
    donations: HashMap<DonationId, Donation>,
    donation_codes: HashSet<String>,
    inventory: HashMap<(BankId, BloodGroup), InventoryItem>,
    appointments: HashMap<AppointmentId, Appointment>,
}

/// In-memory [`BloodBankStore`].
///
/// Accounts live in a [`DashMap`]; they are only ever replaced whole and
/// never take part in a multi-row write. Everything else sits behind one
/// [`RwLock`], and each write method holds the write guard for its whole
/// duration, checking every precondition before touching any row.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: DashMap<AccountId, Account>,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BloodBankStore for MemoryStore {
    async fn upsert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(&id).map(|a| a.value().clone()))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let needle = email.trim();
        Ok(self
            .accounts
            .iter()
            .find(|a| a.email.trim().eq_ignore_ascii_case(needle))
            .map(|a| a.value().clone()))
    }

    async fn upsert_bank(&self, bank: &BloodBank) -> Result<(), StoreError> {
        if !self.accounts.contains_key(&bank.account) {
            return Err(StoreError::NotFound(format!("account {}", bank.account)));
        }
        let mut tables = self.tables.write().await;
        if let Some(other) = tables
            .banks
            .values()
            .find(|b| b.id != bank.id && (b.code == bank.code || b.account == bank.account))
        {
            return Err(StoreError::Duplicate(format!(
                "bank {} already uses this code or operator",
                other.id
            )));
        }
        tables.banks.insert(bank.id, bank.clone());
        Ok(())
    }

    async fn get_bank(&self, id: BankId) -> Result<Option<BloodBank>, StoreError> {
        Ok(self.tables.read().await.banks.get(&id).cloned())
    }

    async fn find_bank_by_account(
        &self,
        account: AccountId,
    ) -> Result<Option<BloodBank>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.banks.values().find(|b| b.account == account).cloned())
    }

    async fn list_banks(&self, filter: &BankFilter) -> Result<Vec<BloodBank>, StoreError> {
        let tables = self.tables.read().await;
        let mut banks: Vec<_> = tables
            .banks
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        banks.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(banks)
    }

    async fn insert_request(&self, request: &BloodRequest) -> Result<(), StoreError> {
        if !self.accounts.contains_key(&request.requester) {
            return Err(StoreError::NotFound(format!("account {}", request.requester)));
        }
        let mut tables = self.tables.write().await;
        if tables.requests.contains_key(&request.id) {
            return Err(StoreError::Duplicate(format!("request {}", request.id)));
        }
        if !tables.request_codes.insert(request.code.clone()) {
            return Err(StoreError::Duplicate(format!(
                "request code {}",
                request.code
            )));
        }
        tables.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<BloodRequest>, StoreError> {
        Ok(self.tables.read().await.requests.get(&id).cloned())
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<BloodRequest>, StoreError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<_> = tables
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn compare_and_swap_request(
        &self,
        updated: &BloodRequest,
        expected_version: i64,
    ) -> Result<CasResult<BloodRequest>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.requests.get_mut(&updated.id) else {
            return Err(StoreError::NotFound(format!("request {}", updated.id)));
        };
        if current.version != expected_version {
            return Ok(CasResult::Conflict {
                current: current.clone(),
            });
        }
        *current = updated.clone();
        Ok(CasResult::Swapped(updated.clone()))
    }

    async fn get_donor(&self, id: DonorId) -> Result<Option<Donor>, StoreError> {
        Ok(self.tables.read().await.donors.get(&id).cloned())
    }

    async fn find_donor_by_account(
        &self,
        account: AccountId,
    ) -> Result<Option<Donor>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .donor_by_account
            .get(&account)
            .and_then(|id| tables.donors.get(id))
            .cloned())
    }

    async fn get_or_create_donor(&self, candidate: &Donor) -> Result<Donor, StoreError> {
        if !self.accounts.contains_key(&candidate.account) {
            return Err(StoreError::NotFound(format!(
                "account {}",
                candidate.account
            )));
        }
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .donor_by_account
            .get(&candidate.account)
            .and_then(|id| tables.donors.get(id))
        {
            return Ok(existing.clone());
        }
        tables.donor_by_account.insert(candidate.account, candidate.id);
        tables.donors.insert(candidate.id, candidate.clone());
        Ok(candidate.clone())
    }

    async fn list_donors(&self, filter: &DonorFilter) -> Result<Vec<Donor>, StoreError> {
        let tables = self.tables.read().await;
        let mut donors: Vec<_> = tables
            .donors
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        donors.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(donors)
    }

    async fn record_donation(&self, donation: &Donation) -> Result<InventoryItem, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.donors.contains_key(&donation.donor) {
            return Err(StoreError::NotFound(format!("donor {}", donation.donor)));
        }
        if !tables.banks.contains_key(&donation.bloodbank) {
            return Err(StoreError::NotFound(format!(
                "blood bank {}",
                donation.bloodbank
            )));
        }
        if tables.donations.contains_key(&donation.id)
            || tables.donation_codes.contains(&donation.code)
        {
            return Err(StoreError::Duplicate(format!(
                "donation code {}",
                donation.code
            )));
        }

        let now = donation.created_at;
        let mut credited = tables
            .inventory
            .get(&(donation.bloodbank, donation.blood_group))
            .cloned()
            .unwrap_or_else(|| InventoryItem::empty(donation.bloodbank, donation.blood_group, now));
        credited.units_available = credited
            .units_available
            .checked_add(donation.units_donated)
            .ok_or_else(|| StoreError::Backend("inventory counter overflow".into()))?;
        credited.last_updated = now;

        // Every check has passed; nothing below can fail.
        tables.donation_codes.insert(donation.code.clone());
        tables.donations.insert(donation.id, donation.clone());
        tables
            .inventory
            .insert((donation.bloodbank, donation.blood_group), credited.clone());

        if let Some(donor) = tables.donors.get_mut(&donation.donor) {
            donor.last_donation_date = Some(donation.donation_date);
            donor.updated_at = now;
        }
        Ok(credited)
    }

    async fn list_donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, StoreError> {
        let tables = self.tables.read().await;
        let mut donations: Vec<_> = tables
            .donations
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        donations.sort_by(|a, b| {
            b.donation_date
                .cmp(&a.donation_date)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(donations)
    }

    async fn get_inventory(
        &self,
        bloodbank: BankId,
        blood_group: BloodGroup,
    ) -> Result<Option<InventoryItem>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.inventory.get(&(bloodbank, blood_group)).cloned())
    }

    async fn list_inventory(
        &self,
        filter: &InventoryFilter,
    ) -> Result<Vec<InventoryItem>, StoreError> {
        let tables = self.tables.read().await;
        let mut items: Vec<_> = tables
            .inventory
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.bloodbank, i.blood_group));
        Ok(items)
    }

    async fn set_inventory(
        &self,
        bloodbank: BankId,
        set: &InventorySet,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.banks.contains_key(&bloodbank) {
            return Err(StoreError::NotFound(format!("blood bank {bloodbank}")));
        }
        let key = (bloodbank, set.blood_group);
        let item = set.apply(bloodbank, tables.inventory.get(&key), now);
        tables.inventory.insert(key, item.clone());
        Ok(item)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.banks.contains_key(&appointment.bloodbank) {
            return Err(StoreError::NotFound(format!(
                "blood bank {}",
                appointment.bloodbank
            )));
        }
        if tables.appointments.contains_key(&appointment.id) {
            return Err(StoreError::Duplicate(format!(
                "appointment {}",
                appointment.id
            )));
        }
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn get_appointment(
        &self,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, StoreError> {
        Ok(self.tables.read().await.appointments.get(&id).cloned())
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<_> = tables
            .appointments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| (a.appointment_date, a.id));
        Ok(appointments)
    }

    async fn update_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.appointments.get_mut(&appointment.id) {
            Some(slot) => {
                *slot = appointment.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "appointment {}",
                appointment.id
            ))),
        }
    }
}
