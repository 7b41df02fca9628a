use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::blood_group::BloodGroup;
use crate::types::{AccountId, DonorId};

/// Length every stored phone number is normalized to.
pub const PHONE_LEN: usize = 10;
/// Weight assigned to donors created without a profile, in kilograms.
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;
/// Placeholder for address fields with no profile value.
pub const NOT_PROVIDED: &str = "Not provided";
pub const DEFAULT_PINCODE: &str = "000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Gender {
    #[default]
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other => "O",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            "O" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A donor profile, linked one-to-one with an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Donor {
    pub id: DonorId,
    pub account: AccountId,
    pub full_name: String,
    pub blood_group: BloodGroup,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub weight_kg: f64,
    /// Only ever written by donation recording.
    pub last_donation_date: Option<NaiveDate>,
    pub is_eligible: bool,
    pub medical_conditions: String,
    pub emergency_contact: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donor {
    /// Build the minimal profile used when a donation arrives for an account
    /// that has never registered as a donor.
    ///
    /// Profile values on the account win; everything else falls back to
    /// fixed placeholders.
    #[must_use]
    pub fn minimal_for(
        account: &Account,
        blood_group: Option<BloodGroup>,
        now: DateTime<Utc>,
    ) -> Self {
        let profile = &account.profile;
        let phone = normalize_phone(&account.phone);
        let email = if account.email.trim().is_empty() {
            format!("user{}@example.com", account.id)
        } else {
            account.email.trim().to_owned()
        };
        let or_placeholder = |value: &Option<String>, fallback: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_owned()
        };

        Self {
            id: DonorId::generate(),
            account: account.id,
            full_name: account.display_name(),
            blood_group: blood_group.unwrap_or_default(),
            date_of_birth: profile.date_of_birth.unwrap_or_else(placeholder_birth_date),
            gender: Gender::default(),
            emergency_contact: phone.clone(),
            phone,
            email,
            address: or_placeholder(&profile.address, NOT_PROVIDED),
            city: or_placeholder(&profile.city, NOT_PROVIDED),
            state: or_placeholder(&profile.state, NOT_PROVIDED),
            pincode: or_placeholder(&profile.pincode, DEFAULT_PINCODE),
            weight_kg: DEFAULT_WEIGHT_KG,
            last_donation_date: None,
            is_eligible: true,
            medical_conditions: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// 2000-01-01, used when an account carries no date of birth.
#[must_use]
pub fn placeholder_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

/// Keep only digits, then right-pad with `0` or truncate to ten characters.
///
/// Input without any digit becomes `"0000000000"`.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).take(PHONE_LEN).collect();
    while digits.len() < PHONE_LEN {
        digits.push('0');
    }
    digits
}
