use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use ebloodbank_core::{
    Account, AccountId, Appointment, AppointmentId, BankId, BloodBank, BloodGroup, BloodRequest,
    DEFAULT_MIN_STOCK, Donation, Donor, DonorId, InventoryItem, InventorySet, RequestId,
};
use ebloodbank_store::error::StoreError;
use ebloodbank_store::filter::{
    AppointmentFilter, BankFilter, DonationFilter, DonorFilter, InventoryFilter, RequestFilter,
};
use ebloodbank_store::store::{BloodBankStore, CasResult};

use crate::config::PostgresConfig;
use crate::migrations;
use crate::rows::{
    ACCOUNT_COLUMNS, APPOINTMENT_COLUMNS, AccountRow, AppointmentRow, BANK_COLUMNS, BankRow,
    DONATION_COLUMNS, DONOR_COLUMNS, DonationRow, DonorRow, INVENTORY_COLUMNS, InventoryRow,
    REQUEST_COLUMNS, RequestRow, convert_all,
};

/// Map a driver error onto the store taxonomy.
///
/// Unique violations become `Duplicate` and foreign-key violations become
/// `NotFound`, since every foreign key points at an entity the caller named.
fn map_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        match db.code().as_deref() {
            Some("23505") => return StoreError::Duplicate(db.message().to_owned()),
            Some("23503") => return StoreError::NotFound(db.message().to_owned()),
            _ => {}
        }
    }
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Connection(e.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

/// PostgreSQL-backed implementation of [`BloodBankStore`].
///
/// Multi-row writes run inside one `sqlx` transaction; get-or-create paths
/// use `INSERT ... ON CONFLICT` on the natural key, and inventory credits are
/// a single atomic upsert-increment.
pub struct PostgresStore {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl PostgresStore {
    /// Create a new `PostgresStore` from the provided configuration.
    ///
    /// Connects to `PostgreSQL`, creates the connection pool, and runs
    /// migrations to ensure the required tables exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if pool creation fails, or
    /// [`StoreError::Backend`] if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Self::from_pool(pool, config).await
    }

    /// Create a `PostgresStore` from an existing pool and config.
    ///
    /// Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if migrations fail.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, StoreError> {
        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        debug!(schema = %config.schema, prefix = %config.table_prefix, "postgres store ready");

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }
}

#[async_trait]
impl BloodBankStore for PostgresStore {
    async fn upsert_account(&self, account: &Account) -> Result<(), StoreError> {
        let table = self.config.accounts_table();
        let query = format!(
            "INSERT INTO {table} ({ACCOUNT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE \
             SET username = EXCLUDED.username, email = EXCLUDED.email, \
                 phone = EXCLUDED.phone, full_name = EXCLUDED.full_name, \
                 kind = EXCLUDED.kind, date_of_birth = EXCLUDED.date_of_birth, \
                 address = EXCLUDED.address, city = EXCLUDED.city, \
                 state = EXCLUDED.state, pincode = EXCLUDED.pincode"
        );
        let p = &account.profile;
        sqlx::query(&query)
            .bind(account.id.as_uuid())
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.phone)
            .bind(&account.full_name)
            .bind(account.kind.as_str())
            .bind(p.date_of_birth)
            .bind(p.address.as_deref())
            .bind(p.city.as_deref())
            .bind(p.state.as_deref())
            .bind(p.pincode.as_deref())
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let table = self.config.accounts_table();
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM {table} WHERE id = $1");
        let row: Option<AccountRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(Account::try_from).transpose()
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let table = self.config.accounts_table();
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {table} \
             WHERE lower(trim(email)) = lower($1) ORDER BY id LIMIT 1"
        );
        let row: Option<AccountRow> = sqlx::query_as(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(Account::try_from).transpose()
    }

    async fn upsert_bank(&self, bank: &BloodBank) -> Result<(), StoreError> {
        let table = self.config.banks_table();
        let query = format!(
            "INSERT INTO {table} ({BANK_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE \
             SET account_id = EXCLUDED.account_id, name = EXCLUDED.name, \
                 registration_number = EXCLUDED.registration_number, \
                 email = EXCLUDED.email, phone = EXCLUDED.phone, city = EXCLUDED.city, \
                 state = EXCLUDED.state, is_operational = EXCLUDED.is_operational, \
                 code = EXCLUDED.code"
        );
        sqlx::query(&query)
            .bind(bank.id.as_uuid())
            .bind(bank.account.as_uuid())
            .bind(&bank.name)
            .bind(&bank.registration_number)
            .bind(&bank.email)
            .bind(&bank.phone)
            .bind(&bank.city)
            .bind(&bank.state)
            .bind(bank.is_operational)
            .bind(&bank.code)
            .bind(bank.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn get_bank(&self, id: BankId) -> Result<Option<BloodBank>, StoreError> {
        let table = self.config.banks_table();
        let query = format!("SELECT {BANK_COLUMNS} FROM {table} WHERE id = $1");
        let row: Option<BankRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(row.map(BloodBank::from))
    }

    async fn find_bank_by_account(
        &self,
        account: AccountId,
    ) -> Result<Option<BloodBank>, StoreError> {
        let table = self.config.banks_table();
        let query = format!("SELECT {BANK_COLUMNS} FROM {table} WHERE account_id = $1");
        let row: Option<BankRow> = sqlx::query_as(&query)
            .bind(account.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(row.map(BloodBank::from))
    }

    async fn list_banks(&self, filter: &BankFilter) -> Result<Vec<BloodBank>, StoreError> {
        let table = self.config.banks_table();
        let query = format!(
            "SELECT {BANK_COLUMNS} FROM {table} \
             WHERE ($1::TEXT IS NULL OR lower(city) = lower($1)) \
             ORDER BY name, id"
        );
        let rows: Vec<BankRow> = sqlx::query_as(&query)
            .bind(filter.city.as_deref().map(str::trim))
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(rows.into_iter().map(BloodBank::from).collect())
    }

    async fn insert_request(&self, request: &BloodRequest) -> Result<(), StoreError> {
        let table = self.config.requests_table();
        let query = format!(
            "INSERT INTO {table} ({REQUEST_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                     $16, $17, $18, $19, $20, $21)"
        );
        sqlx::query(&query)
            .bind(request.id.as_uuid())
            .bind(&request.code)
            .bind(request.requester.as_uuid())
            .bind(request.bloodbank.map(|b| b.as_uuid()))
            .bind(&request.patient_name)
            .bind(request.blood_group.as_str())
            .bind(request.units_required)
            .bind(request.urgency.as_str())
            .bind(request.required_date)
            .bind(&request.hospital_name)
            .bind(&request.doctor_name)
            .bind(&request.contact_number)
            .bind(&request.reason)
            .bind(&request.admin_notes)
            .bind(request.status.as_str())
            .bind(request.approved_by.map(|a| a.as_uuid()))
            .bind(request.approved_at)
            .bind(request.fulfilled_at)
            .bind(request.created_at)
            .bind(request.updated_at)
            .bind(request.version)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<BloodRequest>, StoreError> {
        let table = self.config.requests_table();
        let query = format!("SELECT {REQUEST_COLUMNS} FROM {table} WHERE id = $1");
        let row: Option<RequestRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(BloodRequest::try_from).transpose()
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<BloodRequest>, StoreError> {
        let table = self.config.requests_table();
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM {table} \
             WHERE ($1::UUID IS NULL OR requester_id = $1) \
               AND ($2::UUID IS NULL OR bloodbank_id = $2) \
               AND ($3::TEXT IS NULL OR status = $3) \
               AND ($4::TEXT IS NULL OR blood_group = $4) \
             ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<RequestRow> = sqlx::query_as(&query)
            .bind(filter.requester.map(|a| a.as_uuid()))
            .bind(filter.bloodbank.map(|b| b.as_uuid()))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.blood_group.map(|g| g.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        convert_all(rows)
    }

    async fn compare_and_swap_request(
        &self,
        updated: &BloodRequest,
        expected_version: i64,
    ) -> Result<CasResult<BloodRequest>, StoreError> {
        let table = self.config.requests_table();
        let query = format!(
            "UPDATE {table} \
             SET bloodbank_id = $3, patient_name = $4, blood_group = $5, \
                 units_required = $6, urgency = $7, required_date = $8, \
                 hospital_name = $9, doctor_name = $10, contact_number = $11, \
                 reason = $12, admin_notes = $13, status = $14, approved_by = $15, \
                 approved_at = $16, fulfilled_at = $17, updated_at = $18, version = $19 \
             WHERE id = $1 AND version = $2 \
             RETURNING {REQUEST_COLUMNS}"
        );
        let swapped: Option<RequestRow> = sqlx::query_as(&query)
            .bind(updated.id.as_uuid())
            .bind(expected_version)
            .bind(updated.bloodbank.map(|b| b.as_uuid()))
            .bind(&updated.patient_name)
            .bind(updated.blood_group.as_str())
            .bind(updated.units_required)
            .bind(updated.urgency.as_str())
            .bind(updated.required_date)
            .bind(&updated.hospital_name)
            .bind(&updated.doctor_name)
            .bind(&updated.contact_number)
            .bind(&updated.reason)
            .bind(&updated.admin_notes)
            .bind(updated.status.as_str())
            .bind(updated.approved_by.map(|a| a.as_uuid()))
            .bind(updated.approved_at)
            .bind(updated.fulfilled_at)
            .bind(updated.updated_at)
            .bind(updated.version)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;

        if let Some(row) = swapped {
            return Ok(CasResult::Swapped(row.try_into()?));
        }
        // Requests are never deleted, so a miss is either a stale version or
        // an id that never existed.
        match self.get_request(updated.id).await? {
            Some(current) => Ok(CasResult::Conflict { current }),
            None => Err(StoreError::NotFound(format!("request {}", updated.id))),
        }
    }

    async fn get_donor(&self, id: DonorId) -> Result<Option<Donor>, StoreError> {
        let table = self.config.donors_table();
        let query = format!("SELECT {DONOR_COLUMNS} FROM {table} WHERE id = $1");
        let row: Option<DonorRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(Donor::try_from).transpose()
    }

    async fn find_donor_by_account(
        &self,
        account: AccountId,
    ) -> Result<Option<Donor>, StoreError> {
        let table = self.config.donors_table();
        let query = format!("SELECT {DONOR_COLUMNS} FROM {table} WHERE account_id = $1");
        let row: Option<DonorRow> = sqlx::query_as(&query)
            .bind(account.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(Donor::try_from).transpose()
    }

    async fn get_or_create_donor(&self, candidate: &Donor) -> Result<Donor, StoreError> {
        let table = self.config.donors_table();
        let insert = format!(
            "INSERT INTO {table} ({DONOR_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                     $16, $17, $18, $19) \
             ON CONFLICT (account_id) DO NOTHING"
        );
        let inserted = sqlx::query(&insert)
            .bind(candidate.id.as_uuid())
            .bind(candidate.account.as_uuid())
            .bind(&candidate.full_name)
            .bind(candidate.blood_group.as_str())
            .bind(candidate.date_of_birth)
            .bind(candidate.gender.as_str())
            .bind(&candidate.phone)
            .bind(&candidate.email)
            .bind(&candidate.address)
            .bind(&candidate.city)
            .bind(&candidate.state)
            .bind(&candidate.pincode)
            .bind(candidate.weight_kg)
            .bind(candidate.last_donation_date)
            .bind(candidate.is_eligible)
            .bind(&candidate.medical_conditions)
            .bind(&candidate.emergency_contact)
            .bind(candidate.created_at)
            .bind(candidate.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if inserted.rows_affected() == 0 {
            debug!(account = %candidate.account, "donor already exists for account");
        }

        self.find_donor_by_account(candidate.account)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("donor for account {}", candidate.account)))
    }

    async fn list_donors(&self, filter: &DonorFilter) -> Result<Vec<Donor>, StoreError> {
        let table = self.config.donors_table();
        let query = format!(
            "SELECT {DONOR_COLUMNS} FROM {table} \
             WHERE ($1::UUID IS NULL OR account_id = $1) \
               AND ($2::TEXT IS NULL OR blood_group = $2) \
               AND ($3::TEXT IS NULL OR lower(city) = lower($3)) \
               AND ($4::BOOLEAN IS NULL OR is_eligible = $4) \
             ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<DonorRow> = sqlx::query_as(&query)
            .bind(filter.account.map(|a| a.as_uuid()))
            .bind(filter.blood_group.map(|g| g.as_str()))
            .bind(filter.city.as_deref().map(str::trim))
            .bind(filter.is_eligible)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        convert_all(rows)
    }

    async fn record_donation(&self, donation: &Donation) -> Result<InventoryItem, StoreError> {
        let donations = self.config.donations_table();
        let inventory = self.config.inventory_table();
        let donors = self.config.donors_table();

        // Dropping `tx` on any early return rolls all three writes back.
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let insert = format!(
            "INSERT INTO {donations} ({DONATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&insert)
            .bind(donation.id.as_uuid())
            .bind(&donation.code)
            .bind(donation.donor.as_uuid())
            .bind(donation.bloodbank.as_uuid())
            .bind(donation.blood_group.as_str())
            .bind(donation.donation_date)
            .bind(donation.units_donated)
            .bind(donation.hemoglobin_level)
            .bind(donation.blood_pressure.as_deref())
            .bind(&donation.notes)
            .bind(&donation.verified_by)
            .bind(donation.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;

        let credit = format!(
            "INSERT INTO {inventory} ({INVENTORY_COLUMNS}) \
             VALUES ($1, $2, $3, {DEFAULT_MIN_STOCK}, $4, $4) \
             ON CONFLICT (bloodbank_id, blood_group) DO UPDATE \
             SET units_available = {inventory}.units_available + EXCLUDED.units_available, \
                 last_updated = EXCLUDED.last_updated \
             RETURNING {INVENTORY_COLUMNS}"
        );
        let credited: InventoryRow = sqlx::query_as(&credit)
            .bind(donation.bloodbank.as_uuid())
            .bind(donation.blood_group.as_str())
            .bind(donation.units_donated)
            .bind(donation.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_err)?;

        let touch = format!(
            "UPDATE {donors} SET last_donation_date = $2, updated_at = $3 WHERE id = $1"
        );
        let touched = sqlx::query(&touch)
            .bind(donation.donor.as_uuid())
            .bind(donation.donation_date)
            .bind(donation.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        if touched.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("donor {}", donation.donor)));
        }

        tx.commit().await.map_err(map_err)?;
        credited.try_into()
    }

    async fn list_donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, StoreError> {
        let table = self.config.donations_table();
        let query = format!(
            "SELECT {DONATION_COLUMNS} FROM {table} \
             WHERE ($1::UUID IS NULL OR bloodbank_id = $1) \
               AND ($2::UUID IS NULL OR donor_id = $2) \
             ORDER BY donation_date DESC, created_at DESC, id DESC"
        );
        let rows: Vec<DonationRow> = sqlx::query_as(&query)
            .bind(filter.bloodbank.map(|b| b.as_uuid()))
            .bind(filter.donor.map(|d| d.as_uuid()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        convert_all(rows)
    }

    async fn get_inventory(
        &self,
        bloodbank: BankId,
        blood_group: BloodGroup,
    ) -> Result<Option<InventoryItem>, StoreError> {
        let table = self.config.inventory_table();
        let query = format!(
            "SELECT {INVENTORY_COLUMNS} FROM {table} WHERE bloodbank_id = $1 AND blood_group = $2"
        );
        let row: Option<InventoryRow> = sqlx::query_as(&query)
            .bind(bloodbank.as_uuid())
            .bind(blood_group.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(InventoryItem::try_from).transpose()
    }

    async fn list_inventory(
        &self,
        filter: &InventoryFilter,
    ) -> Result<Vec<InventoryItem>, StoreError> {
        let table = self.config.inventory_table();
        let query = format!(
            "SELECT {INVENTORY_COLUMNS} FROM {table} \
             WHERE ($1::UUID IS NULL OR bloodbank_id = $1) \
               AND ($2::TEXT IS NULL OR blood_group = $2) \
             ORDER BY bloodbank_id, blood_group"
        );
        let rows: Vec<InventoryRow> = sqlx::query_as(&query)
            .bind(filter.bloodbank.map(|b| b.as_uuid()))
            .bind(filter.blood_group.map(|g| g.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        convert_all(rows)
    }

    async fn set_inventory(
        &self,
        bloodbank: BankId,
        set: &InventorySet,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem, StoreError> {
        let table = self.config.inventory_table();
        let query = format!(
            "INSERT INTO {table} ({INVENTORY_COLUMNS}) \
             VALUES ($1, $2, $3, COALESCE($4::INTEGER, {DEFAULT_MIN_STOCK}), $5, $5) \
             ON CONFLICT (bloodbank_id, blood_group) DO UPDATE \
             SET units_available = EXCLUDED.units_available, \
                 min_stock_level = COALESCE($4::INTEGER, {table}.min_stock_level), \
                 last_updated = EXCLUDED.last_updated \
             RETURNING {INVENTORY_COLUMNS}"
        );
        let row: InventoryRow = sqlx::query_as(&query)
            .bind(bloodbank.as_uuid())
            .bind(set.blood_group.as_str())
            .bind(set.units_available)
            .bind(set.min_stock_level)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        row.try_into()
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let table = self.config.appointments_table();
        let query = format!(
            "INSERT INTO {table} ({APPOINTMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        );
        sqlx::query(&query)
            .bind(appointment.id.as_uuid())
            .bind(appointment.account.as_uuid())
            .bind(appointment.bloodbank.as_uuid())
            .bind(appointment.appointment_date)
            .bind(&appointment.notes)
            .bind(appointment.status.as_str())
            .bind(appointment.created_at)
            .bind(appointment.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn get_appointment(
        &self,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, StoreError> {
        let table = self.config.appointments_table();
        let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM {table} WHERE id = $1");
        let row: Option<AppointmentRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(Appointment::try_from).transpose()
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, StoreError> {
        let table = self.config.appointments_table();
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM {table} \
             WHERE ($1::UUID IS NULL OR account_id = $1) \
               AND ($2::UUID IS NULL OR bloodbank_id = $2) \
             ORDER BY appointment_date, id"
        );
        let rows: Vec<AppointmentRow> = sqlx::query_as(&query)
            .bind(filter.account.map(|a| a.as_uuid()))
            .bind(filter.bloodbank.map(|b| b.as_uuid()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        convert_all(rows)
    }

    async fn update_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let table = self.config.appointments_table();
        let query = format!(
            "UPDATE {table} \
             SET appointment_date = $2, notes = $3, status = $4, updated_at = $5 \
             WHERE id = $1"
        );
        let result = sqlx::query(&query)
            .bind(appointment.id.as_uuid())
            .bind(appointment.appointment_date)
            .bind(&appointment.notes)
            .bind(appointment.status.as_str())
            .bind(appointment.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "appointment {}",
                appointment.id
            )));
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    fn test_config() -> PostgresConfig {
        PostgresConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/ebloodbank_test".to_string()),
            table_prefix: format!("test_{}_", uuid::Uuid::new_v4().simple()),
            ..PostgresConfig::default()
        }
    }

    #[tokio::test]
    async fn store_conformance() {
        let store = PostgresStore::new(test_config())
            .await
            .expect("pool creation should succeed");
        ebloodbank_store::testing::run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }
}
