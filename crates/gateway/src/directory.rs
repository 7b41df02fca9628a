//! Account, bank and donor directory on [`Gateway`].
//!
//! Accounts and banks are owned by the identity collaborator; the server
//! mirrors them in through [`Gateway::register_account`] and
//! [`Gateway::register_bank`] at startup.

use ebloodbank_core::{Account, BankId, BloodBank, Donor, DonorId, generate_code};
use ebloodbank_store::{BankFilter, DonorFilter, StoreError};
use tracing::{debug, info, instrument};

use crate::error::GatewayError;
use crate::gateway::Gateway;

impl Gateway {
    /// Insert or replace a mirrored account.
    #[instrument(name = "gateway.register_account", skip(self, account), fields(account = %account.id, kind = %account.kind))]
    pub async fn register_account(&self, account: &Account) -> Result<(), GatewayError> {
        self.store.upsert_account(account).await?;
        debug!("account registered");
        Ok(())
    }

    /// Insert or replace a mirrored bank, generating a code when it has none.
    #[instrument(name = "gateway.register_bank", skip(self, bank), fields(bank = %bank.id))]
    pub async fn register_bank(&self, mut bank: BloodBank) -> Result<BloodBank, GatewayError> {
        let generated = bank.code.trim().is_empty();
        let mut attempt = 0;
        loop {
            attempt += 1;
            if generated {
                bank.code = generate_code();
            }
            match self.store.upsert_bank(&bank).await {
                Ok(()) => {
                    info!(code = %bank.code, name = %bank.name, "blood bank registered");
                    return Ok(bank);
                }
                Err(StoreError::Duplicate(reason))
                    if generated && attempt < self.max_code_attempts =>
                {
                    debug!(attempt, %reason, "bank code collision; regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn list_banks(&self, filter: &BankFilter) -> Result<Vec<BloodBank>, GatewayError> {
        Ok(self.store.list_banks(filter).await?)
    }

    pub async fn get_bank(&self, id: BankId) -> Result<BloodBank, GatewayError> {
        self.store
            .get_bank(id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("blood bank {id}")))
    }

    pub async fn list_donors(&self, filter: &DonorFilter) -> Result<Vec<Donor>, GatewayError> {
        Ok(self.store.list_donors(filter).await?)
    }

    pub async fn get_donor(&self, id: DonorId) -> Result<Donor, GatewayError> {
        self.store
            .get_donor(id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("donor {id}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ebloodbank_core::{AccountKind, BloodGroup};
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
    async fn bank_without_code_gets_one() {
        let gw = gateway();
        let op = sample_account(AccountKind::BloodBank);
        gw.register_account(&op).await.unwrap();
        let mut bank = sample_bank(op.id, "Pune");
        bank.code = String::new();
        let stored = gw.register_bank(bank).await.unwrap();
        assert_eq!(stored.code.len(), 6);
        assert_eq!(gw.get_bank(stored.id).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn explicit_code_collision_is_not_retried() {
        let gw = gateway();
        let first_op = sample_account(AccountKind::BloodBank);
        let second_op = sample_account(AccountKind::BloodBank);
        gw.register_account(&first_op).await.unwrap();
        gw.register_account(&second_op).await.unwrap();
        let first = gw.register_bank(sample_bank(first_op.id, "Pune")).await.unwrap();

        let mut clash = sample_bank(second_op.id, "Pune");
        clash.code.clone_from(&first.code);
        let err = gw.register_bank(clash).await.unwrap_err();
        assert!(matches!(err, GatewayError::Store(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn bank_for_unknown_operator_is_not_found() {
        let gw = gateway();
        let bank = sample_bank(ebloodbank_core::AccountId::generate(), "Pune");
        let err = gw.register_bank(bank).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn bank_listing_filters_by_city() {
        let gw = gateway();
        for city in ["Pune", "Nagpur", "pune"] {
            let op = sample_account(AccountKind::BloodBank);
            gw.register_account(&op).await.unwrap();
            gw.register_bank(sample_bank(op.id, city)).await.unwrap();
        }
        let filter = BankFilter {
            city: Some("PUNE".into()),
        };
        assert_eq!(gw.list_banks(&filter).await.unwrap().len(), 2);
        assert_eq!(gw.list_banks(&BankFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn donor_lookup() {
        let gw = gateway();
        let account = sample_account(AccountKind::Requester);
        gw.register_account(&account).await.unwrap();
        let candidate = Donor::minimal_for(&account, Some(BloodGroup::APositive), ebloodbank_core::now());
        let donor = gw.store().get_or_create_donor(&candidate).await.unwrap();

        assert_eq!(gw.get_donor(donor.id).await.unwrap(), donor);
        let filter = DonorFilter {
            blood_group: Some(BloodGroup::APositive),
            ..DonorFilter::default()
        };
        assert_eq!(gw.list_donors(&filter).await.unwrap().len(), 1);
        let err = gw.get_donor(DonorId::generate()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }
}
