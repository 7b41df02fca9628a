use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::blood_group::BloodGroup;
use crate::error::ValidationError;
use crate::types::{AccountId, BankId, DonationId, DonorId};
use crate::validate;

pub const BLOOD_PRESSURE_MAX_LEN: usize = 20;
pub const VERIFIER_MAX_LEN: usize = 200;

/// A recorded donation. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Donation {
    pub id: DonationId,
    /// Six-digit human-readable code, unique across donations.
    pub code: String,
    pub donor: DonorId,
    pub bloodbank: BankId,
    /// Blood group credited to inventory, copied from the donor.
    pub blood_group: BloodGroup,
    pub donation_date: NaiveDate,
    pub units_donated: i32,
    pub hemoglobin_level: Option<f64>,
    pub blood_pressure: Option<String>,
    pub notes: String,
    pub verified_by: String,
    pub created_at: DateTime<Utc>,
}

/// How the donor of a donation is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DonorRef {
    Donor(DonorId),
    Email(String),
    Account(AccountId),
}

/// Body of a record-donation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DonationInput {
    /// An existing donor profile.
    pub donor: Option<DonorId>,
    /// Account to resolve (and lazily create) a donor profile for.
    pub account: Option<AccountId>,
    /// E-mail of the account, used when no account id is given.
    pub email: Option<String>,
    /// Blood group for a donor profile created by this call.
    pub blood_group: Option<BloodGroup>,
    pub units_donated: Option<i32>,
    pub donation_date: Option<NaiveDate>,
    pub hemoglobin_level: Option<f64>,
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub verified_by: String,
}

impl DonationInput {
    /// Units to credit; one when not supplied.
    #[must_use]
    pub fn units(&self) -> i32 {
        self.units_donated.unwrap_or(1)
    }

    /// Pick the donor reference: donor id, then e-mail (only without an
    /// account id), then account id.
    pub fn donor_ref(&self) -> Result<DonorRef, ValidationError> {
        if let Some(id) = self.donor {
            return Ok(DonorRef::Donor(id));
        }
        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        match (self.account, email) {
            (Some(account), _) => Ok(DonorRef::Account(account)),
            (None, Some(email)) => Ok(DonorRef::Email(email.to_owned())),
            (None, None) => Err(ValidationError::new(
                "donor",
                "a donor id, account id, or email is required",
            )),
        }
    }

    /// Check the donation fields. Does not look at the donor reference.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::positive("units_donated", self.units())?;
        if self.donation_date.is_none() {
            return Err(ValidationError::new("donation_date", "this field is required"));
        }
        validate::required_text("verified_by", &self.verified_by, VERIFIER_MAX_LEN)?;
        if let Some(h) = self.hemoglobin_level
            && !(h > 0.0 && h < 100.0)
        {
            return Err(ValidationError::new(
                "hemoglobin_level",
                "must be between 0 and 100",
            ));
        }
        if let Some(bp) = &self.blood_pressure {
            validate::optional_text("blood_pressure", bp, BLOOD_PRESSURE_MAX_LEN)?;
        }
        Ok(())
    }

    /// Validate and build the donation row for an already resolved donor.
    pub fn into_donation(
        self,
        donor: DonorId,
        blood_group: BloodGroup,
        bloodbank: BankId,
        code: String,
        now: DateTime<Utc>,
    ) -> Result<Donation, ValidationError> {
        self.validate()?;
        let units_donated = self.units();
        let donation_date = self
            .donation_date
            .ok_or_else(|| ValidationError::new("donation_date", "this field is required"))?;
        Ok(Donation {
            id: DonationId::generate(),
            code,
            donor,
            bloodbank,
            blood_group,
            donation_date,
            units_donated,
            hemoglobin_level: self.hemoglobin_level,
            blood_pressure: self.blood_pressure.filter(|bp| !bp.trim().is_empty()),
            notes: self.notes,
            verified_by: self.verified_by.trim().to_owned(),
            created_at: now,
        })
    }
}
