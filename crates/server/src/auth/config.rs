use std::collections::HashSet;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use ebloodbank_core::{Account, AccountId, AccountKind, AccountProfile, BankId, BloodBank};

/// Top-level schema for `auth.toml`.
#[derive(Debug, Deserialize)]
pub struct AuthFileConfig {
    pub settings: AuthSettings,
    #[serde(default)]
    pub users: Vec<UserConfig>,
    #[serde(default)]
    pub api_keys: Vec<ApiKeyConfig>,
}

/// Global auth settings.
#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    /// JWT signing secret.
    pub jwt_secret: SecretString,
    /// JWT token lifetime in seconds.
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_seconds: u64,
}

fn default_jwt_expiry() -> u64 {
    3600
}

/// A user that authenticates via username/password and receives a JWT.
///
/// Users are the accounts of the identity collaborator; the server mirrors
/// them (and the bank of each operator) into the store at startup.
#[derive(Debug, Deserialize)]
pub struct UserConfig {
    pub username: String,
    /// Argon2 password hash in PHC string format.
    pub password_hash: SecretString,
    /// `"requester"`, `"bloodbank"`, or `"admin"`.
    pub kind: AccountKind,
    /// Stable account id.
    pub account_id: AccountId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub profile: AccountProfile,
    /// The bank this user operates. Only valid for `bloodbank` users.
    pub bank: Option<BankConfig>,
}

impl UserConfig {
    /// The account record mirrored into the store.
    pub fn account(&self) -> Account {
        Account {
            id: self.account_id,
            username: self.username.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            full_name: self.full_name.clone(),
            kind: self.kind,
            profile: self.profile.clone(),
        }
    }
}

/// Blood bank record of an operator.
#[derive(Debug, Deserialize)]
pub struct BankConfig {
    pub id: BankId,
    pub name: String,
    #[serde(default)]
    pub registration_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    /// Six-digit code. Generated on first registration when empty.
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_operational")]
    pub is_operational: bool,
}

fn default_operational() -> bool {
    true
}

impl BankConfig {
    pub fn bank(&self, operator: AccountId, created_at: DateTime<Utc>) -> BloodBank {
        BloodBank {
            id: self.id,
            account: operator,
            name: self.name.clone(),
            registration_number: self.registration_number.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            is_operational: self.is_operational,
            code: self.code.trim().to_owned(),
            created_at,
        }
    }
}

/// An API key that authenticates via the `X-API-Key` header as one user.
#[derive(Debug, Deserialize)]
pub struct ApiKeyConfig {
    pub name: String,
    /// SHA-256 hash of the raw key, hex encoded.
    pub key_hash: SecretString,
    /// The user the key acts as.
    pub username: String,
}

impl AuthFileConfig {
    /// Check cross-references that serde cannot.
    pub fn validate(&self) -> Result<(), String> {
        if self.settings.jwt_secret.expose_secret().trim().is_empty() {
            return Err("settings.jwt_secret must not be empty".to_owned());
        }

        let mut usernames = HashSet::new();
        let mut accounts = HashSet::new();
        let mut banks = HashSet::new();
        for u in &self.users {
            if !usernames.insert(u.username.as_str()) {
                return Err(format!("duplicate user '{}'", u.username));
            }
            if !accounts.insert(u.account_id) {
                return Err(format!(
                    "account id {} is used by more than one user",
                    u.account_id
                ));
            }
            match (&u.bank, u.kind) {
                (Some(_), kind) if kind != AccountKind::BloodBank => {
                    return Err(format!(
                        "user '{}' has a bank but is of kind '{kind}'",
                        u.username
                    ));
                }
                (Some(bank), _) if !banks.insert(bank.id) => {
                    return Err(format!("bank {} is operated by more than one user", bank.id));
                }
                _ => {}
            }
        }

        for key in &self.api_keys {
            if !usernames.contains(key.username.as_str()) {
                return Err(format!(
                    "api key '{}' refers to unknown user '{}'",
                    key.name, key.username
                ));
            }
        }
        Ok(())
    }
}
