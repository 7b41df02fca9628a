//! Donation recording and listing on [`Gateway`].
//!
//! Recording resolves the donor (creating a minimal profile for accounts that
//! never registered as donors), then hands the donation to the store, which
//! inserts it, credits inventory and stamps the donor's last donation date as
//! one unit.

use ebloodbank_core::{
    Account, BloodGroup, Donation, DonationInput, Donor, DonorRef, InventoryItem, Principal,
    generate_code, now,
};
use ebloodbank_store::{DonationFilter, StoreError};
use tracing::{debug, info, instrument};

use crate::error::GatewayError;
use crate::gateway::Gateway;

/// Outcome of [`Gateway::record_donation`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDonation {
    pub donation: Donation,
    /// Inventory row for the credited blood group, after the credit.
    pub inventory: InventoryItem,
}

impl Gateway {
    /// Record a donation at the caller's bank.
    #[instrument(name = "gateway.record_donation", skip(self, input), fields(account = %principal.account()))]
    pub async fn record_donation(
        &self,
        principal: &Principal,
        input: DonationInput,
    ) -> Result<RecordedDonation, GatewayError> {
        let bank = self.require_bank_operator(principal, "record donations")?;
        input.validate()?;
        let donor = self.resolve_donor(&input).await?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let donation = input.clone().into_donation(
                donor.id,
                donor.blood_group,
                bank,
                generate_code(),
                now(),
            )?;
            match self.store.record_donation(&donation).await {
                Ok(inventory) => {
                    self.metrics.increment_donations_recorded();
                    self.metrics
                        .add_units_credited(u64::try_from(donation.units_donated).unwrap_or(0));
                    info!(
                        donation.id = %donation.id,
                        code = %donation.code,
                        donor = %donor.id,
                        %bank,
                        blood_group = %donation.blood_group,
                        units = donation.units_donated,
                        units_available = inventory.units_available,
                        "donation recorded"
                    );
                    return Ok(RecordedDonation {
                        donation,
                        inventory,
                    });
                }
                Err(StoreError::Duplicate(reason)) if attempt < self.max_code_attempts => {
                    debug!(attempt, %reason, "donation code collision; regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// List donations visible to `principal`.
    ///
    /// Bank operators see their bank's donations, requesters the donations
    /// made under their own donor profile, admins everything.
    pub async fn list_donations(
        &self,
        principal: &Principal,
        mut filter: DonationFilter,
    ) -> Result<Vec<Donation>, GatewayError> {
        match principal {
            Principal::BloodBankOperator { bank, .. } => filter.bloodbank = Some(*bank),
            Principal::Requester { account } => {
                let Some(donor) = self.store.find_donor_by_account(*account).await? else {
                    return Ok(Vec::new());
                };
                filter.donor = Some(donor.id);
            }
            Principal::Admin { .. } => {}
        }
        Ok(self.store.list_donations(&filter).await?)
    }

    /// Resolve the donor named by `input`: donor id, then e-mail (when no
    /// account id is given), then account id.
    async fn resolve_donor(&self, input: &DonationInput) -> Result<Donor, GatewayError> {
        match input.donor_ref()? {
            DonorRef::Donor(id) => self
                .store
                .get_donor(id)
                .await?
                .ok_or_else(|| GatewayError::NotFound(format!("donor {id}"))),
            DonorRef::Email(email) => {
                let account = self
                    .store
                    .find_account_by_email(&email)
                    .await?
                    .ok_or_else(|| {
                        GatewayError::NotFound(format!("no account with email {email}"))
                    })?;
                self.donor_for_account(&account, input.blood_group).await
            }
            DonorRef::Account(id) => {
                let account = self
                    .store
                    .get_account(id)
                    .await?
                    .ok_or_else(|| GatewayError::NotFound(format!("account {id}")))?;
                self.donor_for_account(&account, input.blood_group).await
            }
        }
    }

    /// Fetch the account's donor profile, creating a minimal one if needed.
    async fn donor_for_account(
        &self,
        account: &Account,
        blood_group: Option<BloodGroup>,
    ) -> Result<Donor, GatewayError> {
        if let Some(donor) = self.store.find_donor_by_account(account.id).await? {
            return Ok(donor);
        }
        let candidate = Donor::minimal_for(account, blood_group, now());
        let donor = self.store.get_or_create_donor(&candidate).await?;
        if donor.id == candidate.id {
            self.metrics.increment_donors_created();
            info!(donor = %donor.id, account = %account.id, blood_group = %donor.blood_group, "donor profile created");
        }
        Ok(donor)
    }
}
