use ebloodbank_core::{BloodGroup, InventoryItem, InventorySet, Principal, now};
use ebloodbank_store::InventoryFilter;
use tracing::{info, instrument};

use crate::error::GatewayError;
use crate::gateway::Gateway;

impl Gateway {
    /// Set the absolute stock level for one blood group at the caller's bank.
    ///
    /// Unlike the credit applied by a donation this overwrites the count.
    #[instrument(name = "gateway.set_inventory", skip(self), fields(account = %principal.account()))]
    pub async fn set_inventory(
        &self,
        principal: &Principal,
        set: InventorySet,
    ) -> Result<InventoryItem, GatewayError> {
        let bank = self.require_bank_operator(principal, "set inventory")?;
        set.validate()?;
        let item = self.store.set_inventory(bank, &set, now()).await?;
        self.metrics.increment_inventory_sets();
        info!(
            %bank,
            blood_group = %item.blood_group,
            units_available = item.units_available,
            min_stock_level = item.min_stock_level,
            "inventory set"
        );
        Ok(item)
    }

    /// List stock rows. Bank operators only see their own bank.
    pub async fn list_inventory(
        &self,
        principal: &Principal,
        blood_group: Option<BloodGroup>,
    ) -> Result<Vec<InventoryItem>, GatewayError> {
        let filter = InventoryFilter {
            bloodbank: principal.bank(),
            blood_group,
        };
        Ok(self.store.list_inventory(&filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use ebloodbank_core::{AccountKind, DonationInput};
    use ebloodbank_store::testing::{sample_account, sample_bank};
    use ebloodbank_store_memory::MemoryStore;

    use super::*;
    use crate::builder::GatewayBuilder;

    async fn two_banks() -> (Gateway, Principal, Principal) {
        let gw = GatewayBuilder::new()
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap();
        let mut principals = Vec::new();
        for city in ["Pune", "Nagpur"] {
            let op = sample_account(AccountKind::BloodBank);
            gw.store().upsert_account(&op).await.unwrap();
            let bank = sample_bank(op.id, city);
            gw.store().upsert_bank(&bank).await.unwrap();
            principals.push(Principal::BloodBankOperator {
                account: op.id,
                bank: bank.id,
            });
        }
        (gw, principals[0], principals[1])
    }

    fn set(group: BloodGroup, units: i32, min: Option<i32>) -> InventorySet {
        InventorySet {
            blood_group: group,
            units_available: units,
            min_stock_level: min,
        }
    }

    #[tokio::test]
    async fn direct_set_is_absolute_and_per_group() {
        let (gw, a, _) = two_banks().await;
        gw.set_inventory(&a, set(BloodGroup::APositive, 12, Some(3)))
            .await
            .unwrap();
        gw.set_inventory(&a, set(BloodGroup::ONegative, 2, None))
            .await
            .unwrap();
        let item = gw
            .set_inventory(&a, set(BloodGroup::APositive, 4, None))
            .await
            .unwrap();
        assert_eq!(item.units_available, 4);
        assert_eq!(item.min_stock_level, 3);

        let rows = gw.list_inventory(&a, None).await.unwrap();
        assert_eq!(rows.len(), 2);
        let o_neg = gw
            .list_inventory(&a, Some(BloodGroup::ONegative))
            .await
            .unwrap();
        assert_eq!(o_neg[0].units_available, 2);
        assert_eq!(o_neg[0].min_stock_level, 5);
        assert!(o_neg[0].is_low_stock());
    }

    #[tokio::test]
    async fn negative_values_are_rejected() {
        let (gw, a, _) = two_banks().await;
        let err = gw
            .set_inventory(&a, set(BloodGroup::APositive, -1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ref v) if v.field == "units_available"));
        assert!(gw.list_inventory(&a, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn operators_see_only_their_bank() {
        let (gw, a, b) = two_banks().await;
        gw.set_inventory(&a, set(BloodGroup::BPositive, 7, None))
            .await
            .unwrap();
        gw.set_inventory(&b, set(BloodGroup::BPositive, 9, None))
            .await
            .unwrap();

        let mine = gw.list_inventory(&b, None).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].units_available, 9);

        let requester = Principal::Requester {
            account: ebloodbank_core::AccountId::generate(),
        };
        assert_eq!(gw.list_inventory(&requester, None).await.unwrap().len(), 2);
        let err = gw
            .set_inventory(&requester, set(BloodGroup::BPositive, 1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
    }

    #[tokio::test]
    async fn donation_credit_adds_to_set_value() {
        let (gw, a, _) = two_banks().await;
        let donor = sample_account(AccountKind::Requester);
        gw.store().upsert_account(&donor).await.unwrap();

        gw.set_inventory(&a, set(BloodGroup::OPositive, 10, None))
            .await
            .unwrap();
        let recorded = gw
            .record_donation(
                &a,
                DonationInput {
                    account: Some(donor.id),
                    units_donated: Some(3),
                    donation_date: NaiveDate::from_ymd_opt(2026, 10, 2),
                    verified_by: "Dr. Rao".into(),
                    ..DonationInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(recorded.inventory.units_available, 13);
    }
}
