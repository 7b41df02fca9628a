//! Query filters for the list operations.
//!
//! Every field is optional and fields combine with AND. The `matches`
//! helpers give the reference semantics that SQL backends reproduce in
//! their `WHERE` clauses.

use ebloodbank_core::{
    AccountId, Appointment, BankId, BloodBank, BloodGroup, BloodRequest, Donation, Donor, DonorId,
    InventoryItem, RequestStatus,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub requester: Option<AccountId>,
    pub bloodbank: Option<BankId>,
    pub status: Option<RequestStatus>,
    pub blood_group: Option<BloodGroup>,
}

impl RequestFilter {
    #[must_use]
    pub fn matches(&self, r: &BloodRequest) -> bool {
        self.requester.is_none_or(|a| r.requester == a)
            && self.bloodbank.is_none_or(|b| r.bloodbank == Some(b))
            && self.status.is_none_or(|s| r.status == s)
            && self.blood_group.is_none_or(|g| r.blood_group == g)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorFilter {
    pub account: Option<AccountId>,
    pub blood_group: Option<BloodGroup>,
    /// Case-insensitive exact match.
    pub city: Option<String>,
    pub is_eligible: Option<bool>,
}

impl DonorFilter {
    #[must_use]
    pub fn matches(&self, d: &Donor) -> bool {
        self.account.is_none_or(|a| d.account == a)
            && self.blood_group.is_none_or(|g| d.blood_group == g)
            && self
                .city
                .as_deref()
                .is_none_or(|c| d.city.eq_ignore_ascii_case(c.trim()))
            && self.is_eligible.is_none_or(|e| d.is_eligible == e)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationFilter {
    pub bloodbank: Option<BankId>,
    pub donor: Option<DonorId>,
}

impl DonationFilter {
    #[must_use]
    pub fn matches(&self, d: &Donation) -> bool {
        self.bloodbank.is_none_or(|b| d.bloodbank == b) && self.donor.is_none_or(|x| d.donor == x)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    pub bloodbank: Option<BankId>,
    pub blood_group: Option<BloodGroup>,
}

impl InventoryFilter {
    #[must_use]
    pub fn matches(&self, i: &InventoryItem) -> bool {
        self.bloodbank.is_none_or(|b| i.bloodbank == b)
            && self.blood_group.is_none_or(|g| i.blood_group == g)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankFilter {
    /// Case-insensitive exact match.
    pub city: Option<String>,
}

impl BankFilter {
    #[must_use]
    pub fn matches(&self, b: &BloodBank) -> bool {
        self.city
            .as_deref()
            .is_none_or(|c| b.city.eq_ignore_ascii_case(c.trim()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub account: Option<AccountId>,
    pub bloodbank: Option<BankId>,
}

impl AppointmentFilter {
    #[must_use]
    pub fn matches(&self, a: &Appointment) -> bool {
        self.account.is_none_or(|x| a.account == x)
            && self.bloodbank.is_none_or(|b| a.bloodbank == b)
    }
}
