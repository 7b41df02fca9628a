use dashmap::DashMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use ebloodbank_core::AccountId;

/// JWT claims embedded in issued tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,
    /// Unique token ID for revocation tracking.
    pub jti: String,
    /// Account the token acts as.
    pub account: AccountId,
    /// Expiry (seconds since epoch).
    pub exp: usize,
}

/// Issues and validates HS256 tokens.
///
/// Revoked token ids are kept in memory until the token would have expired
/// anyway, so a restart forgets revocations.
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: u64,
    /// Revoked `jti` to its expiry timestamp.
    revoked: DashMap<String, u64>,
}

impl JwtManager {
    pub fn new(secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
            revoked: DashMap::new(),
        }
    }

    /// Issue a token for `username`; returns the token and its lifetime.
    pub fn issue_token(
        &self,
        username: &str,
        account: AccountId,
    ) -> Result<(String, u64), String> {
        #[allow(clippy::cast_possible_truncation)]
        let exp = (jsonwebtoken::get_current_timestamp() + self.expiry_seconds) as usize;

        let claims = Claims {
            sub: username.to_owned(),
            jti: uuid::Uuid::new_v4().to_string(),
            account,
            exp,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| format!("JWT encoding failed: {e}"))?;
        Ok((token, self.expiry_seconds))
    }

    /// Check signature and expiry, and that the token was not revoked.
    pub fn validate_token(&self, token: &str) -> Result<Claims, String> {
        let claims = self.decode(token)?;
        if self.revoked.contains_key(&claims.jti) {
            return Err("token has been revoked".to_owned());
        }
        Ok(claims)
    }

    /// Revoke a token; returns its `jti`.
    pub fn revoke_token(&self, token: &str) -> Result<String, String> {
        let claims = self.decode(token)?;
        let now = jsonwebtoken::get_current_timestamp();
        self.revoked.retain(|_, exp| *exp > now);
        self.revoked.insert(claims.jti.clone(), claims.exp as u64);
        Ok(claims.jti)
    }

    fn decode(&self, token: &str) -> Result<Claims, String> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| format!("invalid token: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates_until_revoked() {
        let jwt = JwtManager::new("test-secret", 600);
        let account = AccountId::generate();
        let (token, ttl) = jwt.issue_token("asha", account).unwrap();
        assert_eq!(ttl, 600);

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "asha");
        assert_eq!(claims.account, account);

        let jti = jwt.revoke_token(&token).unwrap();
        assert_eq!(jti, claims.jti);
        let err = jwt.validate_token(&token).unwrap_err();
        assert!(err.contains("revoked"));
    }

    #[test]
    fn other_secret_is_rejected() {
        let issuer = JwtManager::new("one", 600);
        let verifier = JwtManager::new("two", 600);
        let (token, _) = issuer.issue_token("asha", AccountId::generate()).unwrap();
        assert!(verifier.validate_token(&token).unwrap_err().contains("invalid token"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JwtManager::new("test-secret", 600);
        #[allow(clippy::cast_possible_truncation)]
        let claims = Claims {
            sub: "asha".into(),
            jti: "old".into(),
            account: AccountId::generate(),
            exp: (jsonwebtoken::get_current_timestamp() - 3600) as usize,
        };
        let token = encode(&Header::default(), &claims, &jwt.encoding_key).unwrap();
        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn revocations_of_expired_tokens_are_pruned() {
        let jwt = JwtManager::new("test-secret", 600);
        jwt.revoked.insert("stale".into(), 1);
        let (token, _) = jwt.issue_token("asha", AccountId::generate()).unwrap();
        jwt.revoke_token(&token).unwrap();
        assert!(!jwt.revoked.contains_key("stale"));
        assert_eq!(jwt.revoked.len(), 1);
    }
}
