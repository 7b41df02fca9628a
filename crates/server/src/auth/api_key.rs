use std::collections::HashMap;

use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use super::config::ApiKeyConfig;

/// An entry in the API key lookup table.
#[derive(Debug, Clone)]
pub struct ApiKeyEntry {
    /// Key name, for logs.
    pub name: String,
    /// The user whose account the key acts as.
    pub username: String,
}

/// Build an in-memory lookup from `sha256_hex(raw_key) -> ApiKeyEntry`.
///
/// The config stores pre-computed SHA-256 hashes of the raw keys; hex case is
/// ignored.
pub fn build_api_key_table(configs: &[ApiKeyConfig]) -> HashMap<String, ApiKeyEntry> {
    configs
        .iter()
        .map(|cfg| {
            (
                cfg.key_hash.expose_secret().trim().to_lowercase(),
                ApiKeyEntry {
                    name: cfg.name.clone(),
                    username: cfg.username.clone(),
                },
            )
        })
        .collect()
}

/// Hash a raw API key to the lookup format (lowercase hex SHA-256).
pub fn hash_api_key(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Look up a raw API key.
#[allow(clippy::implicit_hasher)]
pub fn lookup_api_key<'a>(
    raw_key: &str,
    table: &'a HashMap<String, ApiKeyEntry>,
) -> Option<&'a ApiKeyEntry> {
    table.get(&hash_api_key(raw_key))
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn lookup_ignores_configured_hex_case() {
        let table = build_api_key_table(&[ApiKeyConfig {
            name: "ci".into(),
            key_hash: SecretString::new(hash_api_key("raw-key").to_uppercase()),
            username: "cityblood".into(),
        }]);
        let entry = lookup_api_key("raw-key", &table).unwrap();
        assert_eq!(entry.name, "ci");
        assert_eq!(entry.username, "cityblood");
        assert!(lookup_api_key("other-key", &table).is_none());
    }
}
