use std::sync::Arc;

use ebloodbank_store::BloodBankStore;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::metrics::GatewayMetrics;

/// Default number of read-apply-swap rounds before a request update gives up.
pub const DEFAULT_MAX_CAS_ATTEMPTS: u32 = 8;

/// Default number of fresh codes tried when a generated code collides.
pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 5;

/// Fluent builder for constructing a [`Gateway`] instance.
///
/// A [`BloodBankStore`] must be supplied; the retry limits default to
/// [`DEFAULT_MAX_CAS_ATTEMPTS`] and [`DEFAULT_MAX_CODE_ATTEMPTS`].
pub struct GatewayBuilder {
    store: Option<Arc<dyn BloodBankStore>>,
    metrics: Option<Arc<GatewayMetrics>>,
    max_cas_attempts: u32,
    max_code_attempts: u32,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            metrics: None,
            max_cas_attempts: DEFAULT_MAX_CAS_ATTEMPTS,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }

    /// Set the store backend.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn BloodBankStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Share an existing metrics registry instead of creating a fresh one.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<GatewayMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// How many times a request update re-reads after losing a version race.
    #[must_use]
    pub fn max_cas_attempts(mut self, attempts: u32) -> Self {
        self.max_cas_attempts = attempts;
        self
    }

    /// How many codes to try when a generated code is already taken.
    #[must_use]
    pub fn max_code_attempts(mut self, attempts: u32) -> Self {
        self.max_code_attempts = attempts;
        self
    }

    /// Consume the builder and produce a [`Gateway`].
    ///
    /// Returns [`GatewayError::Configuration`] if no store was set or a retry
    /// limit is zero.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        let store = self
            .store
            .ok_or_else(|| GatewayError::Configuration("store is required".into()))?;

        if self.max_cas_attempts == 0 {
            return Err(GatewayError::Configuration(
                "max_cas_attempts must be at least 1".into(),
            ));
        }
        if self.max_code_attempts == 0 {
            return Err(GatewayError::Configuration(
                "max_code_attempts must be at least 1".into(),
            ));
        }

        Ok(Gateway {
            store,
            metrics: self.metrics.unwrap_or_default(),
            max_cas_attempts: self.max_cas_attempts,
            max_code_attempts: self.max_code_attempts,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use ebloodbank_store_memory::MemoryStore;

    use super::*;

    #[test]
    fn build_requires_store() {
        let err = GatewayBuilder::new().build().unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(ref m) if m.contains("store")));
    }

    #[test]
    fn build_rejects_zero_attempts() {
        let err = GatewayBuilder::new()
            .store(Arc::new(MemoryStore::new()))
            .max_cas_attempts(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));

        let err = GatewayBuilder::new()
            .store(Arc::new(MemoryStore::new()))
            .max_code_attempts(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn shares_metrics() {
        let metrics = Arc::new(GatewayMetrics::default());
        let gateway = GatewayBuilder::new()
            .store(Arc::new(MemoryStore::new()))
            .metrics(Arc::clone(&metrics))
            .build()
            .unwrap();
        gateway.metrics().increment_permission_denied();
        assert_eq!(metrics.snapshot().permission_denied, 1);
    }
}
