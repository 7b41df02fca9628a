use std::sync::Arc;

use ebloodbank_core::{AccountId, AccountKind, BankId, Principal};
use ebloodbank_store::BloodBankStore;
use tracing::{instrument, warn};

use crate::error::GatewayError;
use crate::metrics::GatewayMetrics;

/// Entry point for every blood-bank workflow.
///
/// The gateway owns permission checks, the request compare-and-swap loop,
/// donor resolution and code generation. The store it wraps owns atomicity.
/// Workflows live in sibling modules as further `impl Gateway` blocks.
pub struct Gateway {
    pub(crate) store: Arc<dyn BloodBankStore>,
    pub(crate) metrics: Arc<GatewayMetrics>,
    pub(crate) max_cas_attempts: u32,
    pub(crate) max_code_attempts: u32,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("metrics", &self.metrics)
            .field("max_cas_attempts", &self.max_cas_attempts)
            .field("max_code_attempts", &self.max_code_attempts)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Return a reference to the gateway metrics.
    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    /// Return the underlying store.
    pub fn store(&self) -> &Arc<dyn BloodBankStore> {
        &self.store
    }

    /// Build the principal for an authenticated account.
    ///
    /// Admin accounts become [`Principal::Admin`]; an account linked to a
    /// bank becomes [`Principal::BloodBankOperator`]; everything else is a
    /// requester.
    #[instrument(name = "gateway.resolve_principal", skip(self))]
    pub async fn resolve_principal(&self, account: AccountId) -> Result<Principal, GatewayError> {
        let record = self
            .store
            .get_account(account)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("account {account}")))?;

        if record.kind == AccountKind::Admin {
            return Ok(Principal::Admin { account });
        }
        if let Some(bank) = self.store.find_bank_by_account(account).await? {
            return Ok(Principal::BloodBankOperator {
                account,
                bank: bank.id,
            });
        }
        if record.kind == AccountKind::BloodBank {
            warn!(%account, "blood bank account has no bank record; treating as requester");
        }
        Ok(Principal::Requester { account })
    }

    /// The bank operated by `principal`, or `Forbidden` naming `operation`.
    pub(crate) fn require_bank_operator(
        &self,
        principal: &Principal,
        operation: &str,
    ) -> Result<BankId, GatewayError> {
        principal.bank().ok_or_else(|| {
            self.metrics.increment_permission_denied();
            warn!(account = %principal.account(), operation, "bank operator required");
            GatewayError::Forbidden(format!("only blood bank operators can {operation}"))
        })
    }

    /// Refuse bank operators, for operations meant for requesters.
    pub(crate) fn forbid_bank_operator(
        &self,
        principal: &Principal,
        operation: &str,
    ) -> Result<(), GatewayError> {
        if principal.is_bank_operator() {
            self.metrics.increment_permission_denied();
            warn!(account = %principal.account(), operation, "bank operators may not do this");
            return Err(GatewayError::Forbidden(format!(
                "blood bank operators cannot {operation}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ebloodbank_store::testing::{sample_account, sample_bank};
    use ebloodbank_store_memory::MemoryStore;

    use super::*;
    use crate::builder::GatewayBuilder;

    fn gateway() -> Gateway {
        GatewayBuilder::new()
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn principal_follows_account_and_bank() {
        let gw = gateway();
        let requester = sample_account(AccountKind::Requester);
        let admin = sample_account(AccountKind::Admin);
        let operator = sample_account(AccountKind::BloodBank);
        let orphan = sample_account(AccountKind::BloodBank);
        for a in [&requester, &admin, &operator, &orphan] {
            gw.store.upsert_account(a).await.unwrap();
        }
        let bank = sample_bank(operator.id, "Pune");
        gw.store.upsert_bank(&bank).await.unwrap();

        assert_eq!(
            gw.resolve_principal(requester.id).await.unwrap(),
            Principal::Requester {
                account: requester.id
            }
        );
        assert_eq!(
            gw.resolve_principal(admin.id).await.unwrap(),
            Principal::Admin { account: admin.id }
        );
        assert_eq!(
            gw.resolve_principal(operator.id).await.unwrap(),
            Principal::BloodBankOperator {
                account: operator.id,
                bank: bank.id
            }
        );
        assert!(matches!(
            gw.resolve_principal(orphan.id).await.unwrap(),
            Principal::Requester { .. }
        ));
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let gw = gateway();
        let err = gw.resolve_principal(AccountId::generate()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn role_guards_count_denials() {
        let gw = gateway();
        let requester = Principal::Requester {
            account: AccountId::generate(),
        };
        let operator = Principal::BloodBankOperator {
            account: AccountId::generate(),
            bank: BankId::generate(),
        };

        let err = gw.require_bank_operator(&requester, "approve requests").unwrap_err();
        assert_eq!(
            err.to_string(),
            "permission denied: only blood bank operators can approve requests"
        );
        assert!(gw.require_bank_operator(&operator, "approve requests").is_ok());
        assert!(gw.forbid_bank_operator(&operator, "create requests").is_err());
        assert!(gw.forbid_bank_operator(&requester, "create requests").is_ok());
        assert_eq!(gw.metrics().snapshot().permission_denied, 2);
    }
}
