use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{AccountId, BankId};

/// The kind of account as registered with the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Requester,
    BloodBank,
    Admin,
}

impl AccountKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requester => "requester",
            Self::BloodBank => "bloodbank",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = ValidationError;

    /// Accepts `"donor"` as an alias for requester accounts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "requester" | "donor" => Ok(Self::Requester),
            "bloodbank" | "blood_bank" => Ok(Self::BloodBank),
            "admin" => Ok(Self::Admin),
            other => Err(ValidationError::new(
                "kind",
                format!("unknown account kind '{other}'"),
            )),
        }
    }
}

/// Optional profile details kept alongside an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AccountProfile {
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

/// An account mirrored from the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub full_name: String,
    pub kind: AccountKind,
    #[serde(default)]
    pub profile: AccountProfile,
}

impl Account {
    /// Name to show for this account: the full name, else the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = self.full_name.trim();
        if !full.is_empty() {
            return full.to_owned();
        }
        if !self.username.trim().is_empty() {
            return self.username.trim().to_owned();
        }
        format!("User {}", self.id)
    }
}

/// A blood-bank entity operated by exactly one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BloodBank {
    pub id: BankId,
    /// The operator account.
    pub account: AccountId,
    pub name: String,
    pub registration_number: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub state: String,
    pub is_operational: bool,
    /// Six-digit human-readable code.
    pub code: String,
    pub created_at: DateTime<Utc>,
}
