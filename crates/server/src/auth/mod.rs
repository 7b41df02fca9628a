pub mod api_key;
pub mod config;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod password;

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use ebloodbank_core::{AccountId, now};
use ebloodbank_gateway::{Gateway, GatewayError};

use self::api_key::{ApiKeyEntry, build_api_key_table, lookup_api_key};
use self::config::AuthFileConfig;
use self::identity::CallerIdentity;
use self::jwt::JwtManager;

/// In-memory user entry for fast lookup.
#[derive(Debug, Clone)]
pub struct UserEntry {
    pub password_hash: SecretString,
    pub account: AccountId,
}

/// Central auth provider built once at startup from `auth.toml`.
pub struct AuthProvider {
    jwt_manager: JwtManager,
    gateway: Arc<Gateway>,
    /// Username to `UserEntry` lookup table.
    users: HashMap<String, UserEntry>,
    /// SHA-256 hex hash to `ApiKeyEntry` lookup table.
    api_keys: HashMap<String, ApiKeyEntry>,
}

impl AuthProvider {
    /// Build the auth provider from a parsed config.
    ///
    /// Principals are resolved through `gateway` on every authenticated call.
    pub fn new(config: &AuthFileConfig, gateway: Arc<Gateway>) -> Result<Self, String> {
        config.validate()?;

        let jwt_manager = JwtManager::new(
            config.settings.jwt_secret.expose_secret(),
            config.settings.jwt_expiry_seconds,
        );

        let users = config
            .users
            .iter()
            .map(|u| {
                (
                    u.username.clone(),
                    UserEntry {
                        password_hash: u.password_hash.clone(),
                        account: u.account_id,
                    },
                )
            })
            .collect();

        Ok(Self {
            jwt_manager,
            gateway,
            users,
            api_keys: build_api_key_table(&config.api_keys),
        })
    }

    /// Authenticate a user by username/password and issue a JWT.
    pub fn login(&self, username: &str, password_candidate: &str) -> Result<(String, u64), String> {
        let user = self
            .users
            .get(username)
            .ok_or_else(|| "invalid credentials".to_owned())?;

        if !password::verify_password(user.password_hash.expose_secret(), password_candidate) {
            return Err("invalid credentials".to_owned());
        }

        self.jwt_manager.issue_token(username, user.account)
    }

    /// Validate a JWT token and return the caller identity.
    pub async fn validate_jwt(&self, token: &str) -> Result<CallerIdentity, String> {
        let claims = self.jwt_manager.validate_token(token)?;
        self.identity(claims.sub, claims.account, "jwt").await
    }

    /// Revoke a JWT token (logout).
    pub fn revoke_jwt(&self, token: &str) -> Result<(), String> {
        self.jwt_manager.revoke_token(token)?;
        Ok(())
    }

    /// Authenticate an API key and return the identity of the user it acts as.
    pub async fn authenticate_api_key(&self, raw_key: &str) -> Result<CallerIdentity, String> {
        let entry =
            lookup_api_key(raw_key, &self.api_keys).ok_or_else(|| "invalid API key".to_owned())?;
        let user = self
            .users
            .get(&entry.username)
            .ok_or_else(|| "invalid API key".to_owned())?;
        self.identity(entry.name.clone(), user.account, "api_key")
            .await
    }

    async fn identity(
        &self,
        id: String,
        account: AccountId,
        auth_method: &str,
    ) -> Result<CallerIdentity, String> {
        let principal = self.gateway.resolve_principal(account).await.map_err(|e| {
            warn!(caller = %id, error = %e, "could not resolve principal");
            "account is not registered".to_owned()
        })?;
        Ok(CallerIdentity {
            id,
            principal,
            auth_method: auth_method.to_owned(),
        })
    }
}

/// Mirror the configured accounts and their banks into the store.
///
/// A bank without a configured code keeps the code it was given on an earlier
/// start.
pub async fn mirror_directory(
    config: &AuthFileConfig,
    gateway: &Gateway,
) -> Result<(), GatewayError> {
    for user in &config.users {
        gateway.register_account(&user.account()).await?;
        let Some(bank_config) = &user.bank else {
            continue;
        };
        let mut bank = bank_config.bank(user.account_id, now());
        match gateway.get_bank(bank.id).await {
            Ok(existing) => {
                bank.created_at = existing.created_at;
                if bank.code.is_empty() {
                    bank.code = existing.code;
                }
            }
            Err(GatewayError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        gateway.register_bank(bank).await?;
    }
    info!(
        users = config.users.len(),
        api_keys = config.api_keys.len(),
        "auth directory mirrored"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use ebloodbank_core::Principal;
    use ebloodbank_gateway::GatewayBuilder;
    use ebloodbank_store_memory::MemoryStore;

    use super::api_key::hash_api_key;
    use super::password::hash_password;
    use super::*;

    fn auth_toml(hash: &str) -> String {
        format!(
            r#"
            [settings]
            jwt_secret = "unit-test-secret"
            jwt_expiry_seconds = 120

            [[users]]
            username = "cityblood"
            password_hash = "{hash}"
            kind = "bloodbank"
            account_id = "0192f0c4-8a5e-7c4e-9d41-3b0a6f2e1c01"

            [users.bank]
            id = "0192f0c4-8a5e-7c4e-9d41-3b0a6f2e1c02"
            name = "City Blood Bank"
            city = "Pune"

            [[users]]
            username = "asha"
            password_hash = "{hash}"
            kind = "requester"
            account_id = "0192f0c4-8a5e-7c4e-9d41-3b0a6f2e1c03"

            [[api_keys]]
            name = "front-desk"
            key_hash = "{key}"
            username = "cityblood"
            "#,
            key = hash_api_key("desk-key"),
        )
    }

    async fn provider() -> (AuthProvider, Arc<Gateway>, AuthFileConfig) {
        let config: AuthFileConfig = toml::from_str(&auth_toml(&hash_password("pw").unwrap())).unwrap();
        let gateway = Arc::new(
            GatewayBuilder::new()
                .store(Arc::new(MemoryStore::new()))
                .build()
                .unwrap(),
        );
        mirror_directory(&config, &gateway).await.unwrap();
        let provider = AuthProvider::new(&config, Arc::clone(&gateway)).unwrap();
        (provider, gateway, config)
    }

    #[tokio::test]
    async fn login_then_validate_resolves_principal() {
        let (auth, _, _) = provider().await;
        let (token, ttl) = auth.login("asha", "pw").unwrap();
        assert_eq!(ttl, 120);
        let identity = auth.validate_jwt(&token).await.unwrap();
        assert_eq!(identity.id, "asha");
        assert_eq!(identity.auth_method, "jwt");
        assert!(matches!(identity.principal, Principal::Requester { .. }));

        auth.revoke_jwt(&token).unwrap();
        assert!(auth.validate_jwt(&token).await.is_err());
    }

    #[tokio::test]
    async fn wrong_password_or_user_is_refused() {
        let (auth, _, _) = provider().await;
        assert_eq!(auth.login("asha", "nope").unwrap_err(), "invalid credentials");
        assert_eq!(auth.login("ghost", "pw").unwrap_err(), "invalid credentials");
    }

    #[tokio::test]
    async fn api_key_acts_as_bank_operator() {
        let (auth, _, config) = provider().await;
        let identity = auth.authenticate_api_key("desk-key").await.unwrap();
        assert_eq!(identity.id, "front-desk");
        assert_eq!(identity.auth_method, "api_key");
        let expected_bank = config.users[0].bank.as_ref().unwrap().id;
        assert_eq!(identity.principal.bank(), Some(expected_bank));
        assert!(auth.authenticate_api_key("other").await.is_err());
    }

    #[tokio::test]
    async fn mirroring_twice_keeps_the_generated_code() {
        let (_, gateway, config) = provider().await;
        let bank_id = config.users[0].bank.as_ref().unwrap().id;
        let first = gateway.get_bank(bank_id).await.unwrap();
        assert_eq!(first.code.len(), 6);

        mirror_directory(&config, &gateway).await.unwrap();
        let second = gateway.get_bank(bank_id).await.unwrap();
        assert_eq!(second.code, first.code);
        assert_eq!(second.created_at, first.created_at);
    }
}
