//! Database row shapes and their conversion into domain types.
//!
//! Enumerations are stored as their canonical text spelling; a value that no
//! longer parses surfaces as [`StoreError::Serialization`].

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use ebloodbank_core::{
    Account, AccountKind, AccountProfile, Appointment, AppointmentStatus, BloodBank, BloodGroup,
    BloodRequest, Donation, Donor, Gender, InventoryItem, RequestStatus, Urgency,
};
use ebloodbank_store::error::StoreError;

fn parse<T>(column: &str, raw: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| StoreError::Serialization(format!("{column}: {e}")))
}

pub(crate) const ACCOUNT_COLUMNS: &str = "id, username, email, phone, full_name, kind, \
     date_of_birth, address, city, state, pincode";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    phone: String,
    full_name: String,
    kind: String,
    date_of_birth: Option<NaiveDate>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    pincode: Option<String>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            username: row.username,
            email: row.email,
            phone: row.phone,
            full_name: row.full_name,
            kind: parse::<AccountKind>("kind", &row.kind)?,
            profile: AccountProfile {
                date_of_birth: row.date_of_birth,
                address: row.address,
                city: row.city,
                state: row.state,
                pincode: row.pincode,
            },
        })
    }
}

pub(crate) const BANK_COLUMNS: &str = "id, account_id, name, registration_number, email, phone, \
     city, state, is_operational, code, created_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BankRow {
    id: Uuid,
    account_id: Uuid,
    name: String,
    registration_number: String,
    email: String,
    phone: String,
    city: String,
    state: String,
    is_operational: bool,
    code: String,
    created_at: DateTime<Utc>,
}

impl From<BankRow> for BloodBank {
    fn from(row: BankRow) -> Self {
        Self {
            id: row.id.into(),
            account: row.account_id.into(),
            name: row.name,
            registration_number: row.registration_number,
            email: row.email,
            phone: row.phone,
            city: row.city,
            state: row.state,
            is_operational: row.is_operational,
            code: row.code,
            created_at: row.created_at,
        }
    }
}

pub(crate) const REQUEST_COLUMNS: &str = "id, code, requester_id, bloodbank_id, patient_name, \
     blood_group, units_required, urgency, required_date, hospital_name, doctor_name, \
     contact_number, reason, admin_notes, status, approved_by, approved_at, fulfilled_at, \
     created_at, updated_at, version";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RequestRow {
    id: Uuid,
    code: String,
    requester_id: Uuid,
    bloodbank_id: Option<Uuid>,
    patient_name: String,
    blood_group: String,
    units_required: i32,
    urgency: String,
    required_date: NaiveDate,
    hospital_name: String,
    doctor_name: String,
    contact_number: String,
    reason: String,
    admin_notes: String,
    status: String,
    approved_by: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    fulfilled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<RequestRow> for BloodRequest {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            code: row.code,
            requester: row.requester_id.into(),
            bloodbank: row.bloodbank_id.map(Into::into),
            patient_name: row.patient_name,
            blood_group: parse::<BloodGroup>("blood_group", &row.blood_group)?,
            units_required: row.units_required,
            urgency: parse::<Urgency>("urgency", &row.urgency)?,
            required_date: row.required_date,
            hospital_name: row.hospital_name,
            doctor_name: row.doctor_name,
            contact_number: row.contact_number,
            reason: row.reason,
            admin_notes: row.admin_notes,
            status: parse::<RequestStatus>("status", &row.status)?,
            approved_by: row.approved_by.map(Into::into),
            approved_at: row.approved_at,
            fulfilled_at: row.fulfilled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

pub(crate) const DONOR_COLUMNS: &str = "id, account_id, full_name, blood_group, date_of_birth, \
     gender, phone, email, address, city, state, pincode, weight_kg, last_donation_date, \
     is_eligible, medical_conditions, emergency_contact, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DonorRow {
    id: Uuid,
    account_id: Uuid,
    full_name: String,
    blood_group: String,
    date_of_birth: NaiveDate,
    gender: String,
    phone: String,
    email: String,
    address: String,
    city: String,
    state: String,
    pincode: String,
    weight_kg: f64,
    last_donation_date: Option<NaiveDate>,
    is_eligible: bool,
    medical_conditions: String,
    emergency_contact: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DonorRow> for Donor {
    type Error = StoreError;

    fn try_from(row: DonorRow) -> Result<Self, Self::Error> {
        let gender = Gender::parse(&row.gender)
            .ok_or_else(|| StoreError::Serialization(format!("gender: '{}'", row.gender)))?;
        Ok(Self {
            id: row.id.into(),
            account: row.account_id.into(),
            full_name: row.full_name,
            blood_group: parse::<BloodGroup>("blood_group", &row.blood_group)?,
            date_of_birth: row.date_of_birth,
            gender,
            phone: row.phone,
            email: row.email,
            address: row.address,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            weight_kg: row.weight_kg,
            last_donation_date: row.last_donation_date,
            is_eligible: row.is_eligible,
            medical_conditions: row.medical_conditions,
            emergency_contact: row.emergency_contact,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) const DONATION_COLUMNS: &str = "id, code, donor_id, bloodbank_id, blood_group, \
     donation_date, units_donated, hemoglobin_level, blood_pressure, notes, verified_by, \
     created_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DonationRow {
    id: Uuid,
    code: String,
    donor_id: Uuid,
    bloodbank_id: Uuid,
    blood_group: String,
    donation_date: NaiveDate,
    units_donated: i32,
    hemoglobin_level: Option<f64>,
    blood_pressure: Option<String>,
    notes: String,
    verified_by: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = StoreError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            code: row.code,
            donor: row.donor_id.into(),
            bloodbank: row.bloodbank_id.into(),
            blood_group: parse::<BloodGroup>("blood_group", &row.blood_group)?,
            donation_date: row.donation_date,
            units_donated: row.units_donated,
            hemoglobin_level: row.hemoglobin_level,
            blood_pressure: row.blood_pressure,
            notes: row.notes,
            verified_by: row.verified_by,
            created_at: row.created_at,
        })
    }
}

pub(crate) const INVENTORY_COLUMNS: &str =
    "bloodbank_id, blood_group, units_available, min_stock_level, last_updated, created_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct InventoryRow {
    bloodbank_id: Uuid,
    blood_group: String,
    units_available: i32,
    min_stock_level: i32,
    last_updated: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InventoryRow> for InventoryItem {
    type Error = StoreError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            bloodbank: row.bloodbank_id.into(),
            blood_group: parse::<BloodGroup>("blood_group", &row.blood_group)?,
            units_available: row.units_available,
            min_stock_level: row.min_stock_level,
            last_updated: row.last_updated,
            created_at: row.created_at,
        })
    }
}

pub(crate) const APPOINTMENT_COLUMNS: &str =
    "id, account_id, bloodbank_id, appointment_date, notes, status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AppointmentRow {
    id: Uuid,
    account_id: Uuid,
    bloodbank_id: Uuid,
    appointment_date: NaiveDate,
    notes: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = StoreError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            account: row.account_id.into(),
            bloodbank: row.bloodbank_id.into(),
            appointment_date: row.appointment_date,
            notes: row.notes,
            status: parse::<AppointmentStatus>("status", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Convert a batch of rows, failing on the first bad one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}
