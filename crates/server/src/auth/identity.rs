use ebloodbank_core::{AccountId, Principal};

/// Server-side caller identity extracted from authentication.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    /// Caller identifier (username or API key name).
    pub id: String,
    /// The principal resolved from the caller's account for this request.
    pub principal: Principal,
    /// Authentication method (`"jwt"`, `"api_key"`, or `"anonymous"`).
    pub auth_method: String,
}

impl CallerIdentity {
    /// Build an anonymous admin identity (used when auth is disabled).
    pub fn anonymous() -> Self {
        Self {
            id: String::new(),
            principal: Principal::Admin {
                account: AccountId::from_uuid(uuid::Uuid::nil()),
            },
            auth_method: "anonymous".to_owned(),
        }
    }
}
