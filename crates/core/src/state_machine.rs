//! The blood-request approval state machine.
//!
//! ```text
//! pending  ──approve──▶ approved ──fulfill──▶ fulfilled
//!    │  ╲                  ▲
//!    │   ╲reject           │approve
//!    │    ▶ rejected ──────┘
//!    └──cancel──▶ cancelled
//! ```
//!
//! Transitions are pure: [`BloodRequest::apply`] returns the next row or a
//! [`TransitionError`] and never mutates its input. Who may trigger an action
//! is the caller's concern; the machine only checks the bank binding for
//! fulfilment, because that depends on the row itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::request::{BloodRequest, RequestStatus};
use crate::types::{AccountId, BankId};

/// A lifecycle action together with the actor data it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RequestAction {
    /// A bank claims the request.
    Approve { bank: BankId, by: AccountId },
    /// A bank declines the request; another bank may still approve it.
    Reject { bank: BankId, by: AccountId },
    /// The bound bank has handed over the units.
    Fulfill { bank: BankId },
    /// The requester withdraws a request no bank has acted on.
    Cancel,
}

impl RequestAction {
    /// Status the request ends in when the action succeeds.
    #[must_use]
    pub const fn target(&self) -> RequestStatus {
        match self {
            Self::Approve { .. } => RequestStatus::Approved,
            Self::Reject { .. } => RequestStatus::Rejected,
            Self::Fulfill { .. } => RequestStatus::Fulfilled,
            Self::Cancel => RequestStatus::Cancelled,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::Reject { .. } => "reject",
            Self::Fulfill { .. } => "fulfill",
            Self::Cancel => "cancel",
        }
    }
}

impl BloodRequest {
    /// Compute the row that results from `action`, bumping `version`.
    pub fn apply(
        &self,
        action: RequestAction,
        now: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        let status = self.status;
        let mut next = self.clone();
        match action {
            RequestAction::Approve { bank, by } => {
                match status {
                    RequestStatus::Approved => return Err(TransitionError::AlreadyApproved),
                    RequestStatus::Pending | RequestStatus::Rejected => {}
                    _ => return Err(TransitionError::NotApprovable { status }),
                }
                next.bind(bank, by, now);
            }
            RequestAction::Reject { bank, by } => {
                match status {
                    RequestStatus::Approved => return Err(TransitionError::AlreadyApproved),
                    RequestStatus::Pending => {}
                    _ => return Err(TransitionError::NotRejectable { status }),
                }
                next.bind(bank, by, now);
            }
            RequestAction::Fulfill { bank } => {
                if status != RequestStatus::Approved {
                    return Err(TransitionError::NotFulfillable { status });
                }
                if self.bloodbank != Some(bank) {
                    return Err(TransitionError::BoundElsewhere);
                }
                next.fulfilled_at = Some(now);
            }
            RequestAction::Cancel => {
                if status != RequestStatus::Pending {
                    return Err(TransitionError::NotCancellable { status });
                }
            }
        }
        next.status = action.target();
        next.updated_at = now;
        next.version += 1;
        Ok(next)
    }

    // approve and reject share the audit fields
    fn bind(&mut self, bank: BankId, by: AccountId, now: DateTime<Utc>) {
        self.bloodbank = Some(bank);
        self.approved_by = Some(by);
        self.approved_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::blood_group::BloodGroup;
    use crate::request::NewBloodRequest;

    fn pending() -> BloodRequest {
        NewBloodRequest {
            patient_name: "Anita".into(),
            blood_group: BloodGroup::OPositive,
            units_required: 2,
            urgency: crate::request::Urgency::Emergency,
            required_date: NaiveDate::from_ymd_opt(2026, 12, 24).unwrap(),
            hospital_name: "General".into(),
            doctor_name: "Dr. Rao".into(),
            contact_number: "5550100".into(),
            reason: String::new(),
        }
        .into_request(AccountId::generate(), "424242".into(), Utc::now())
        .unwrap()
    }

    fn approve(bank: BankId) -> RequestAction {
        RequestAction::Approve {
            bank,
            by: AccountId::generate(),
        }
    }

    fn reject(bank: BankId) -> RequestAction {
        RequestAction::Reject {
            bank,
            by: AccountId::generate(),
        }
    }

    fn with_status(status: RequestStatus) -> BloodRequest {
        let mut req = pending();
        req.status = status;
        req
    }

    #[test]
    fn approve_binds_bank_and_audit_fields() {
        let bank = BankId::generate();
        let by = AccountId::generate();
        let now = Utc::now();
        let req = pending();
        let next = req.apply(RequestAction::Approve { bank, by }, now).unwrap();
        assert_eq!(next.status, RequestStatus::Approved);
        assert_eq!(next.bloodbank, Some(bank));
        assert_eq!(next.approved_by, Some(by));
        assert_eq!(next.approved_at, Some(now));
        assert_eq!(next.version, req.version + 1);
        // input untouched
        assert_eq!(req.status, RequestStatus::Pending);
    }

    #[test]
    fn approve_twice_reports_already_approved() {
        let approved = pending()
            .apply(approve(BankId::generate()), Utc::now())
            .unwrap();
        let err = approved
            .apply(approve(BankId::generate()), Utc::now())
            .unwrap_err();
        assert_eq!(err, TransitionError::AlreadyApproved);
        assert!(err.to_string().contains("already approved by another blood bank"));
    }

    #[test]
    fn reject_then_approve_by_other_bank_overrides() {
        let bank_a = BankId::generate();
        let bank_b = BankId::generate();
        let rejected = pending().apply(reject(bank_a), Utc::now()).unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(rejected.bloodbank, Some(bank_a));

        let approved = rejected.apply(approve(bank_b), Utc::now()).unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(approved.bloodbank, Some(bank_b));
    }

    #[test]
    fn reject_only_from_pending() {
        let bank = BankId::generate();
        assert_eq!(
            with_status(RequestStatus::Approved)
                .apply(reject(bank), Utc::now())
                .unwrap_err(),
            TransitionError::AlreadyApproved
        );
        for status in [
            RequestStatus::Rejected,
            RequestStatus::Fulfilled,
            RequestStatus::Cancelled,
        ] {
            let err = with_status(status).apply(reject(bank), Utc::now()).unwrap_err();
            assert_eq!(err, TransitionError::NotRejectable { status });
        }
    }

    #[test]
    fn approve_refused_from_terminal_states() {
        for status in [RequestStatus::Fulfilled, RequestStatus::Cancelled] {
            let err = with_status(status)
                .apply(approve(BankId::generate()), Utc::now())
                .unwrap_err();
            assert_eq!(err, TransitionError::NotApprovable { status });
            assert_eq!(err.current_status(), status);
        }
    }

    #[test]
    fn fulfill_requires_bound_bank() {
        let bank = BankId::generate();
        let approved = pending().apply(approve(bank), Utc::now()).unwrap();

        let err = approved
            .apply(
                RequestAction::Fulfill {
                    bank: BankId::generate(),
                },
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, TransitionError::BoundElsewhere);

        let done = approved
            .apply(RequestAction::Fulfill { bank }, Utc::now())
            .unwrap();
        assert_eq!(done.status, RequestStatus::Fulfilled);
        assert!(done.fulfilled_at.is_some());
        assert_eq!(done.bloodbank, Some(bank));
    }

    #[test]
    fn fulfill_only_from_approved() {
        let err = pending()
            .apply(
                RequestAction::Fulfill {
                    bank: BankId::generate(),
                },
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::NotFulfillable {
                status: RequestStatus::Pending
            }
        );
    }

    #[test]
    fn cancel_only_from_pending() {
        let cancelled = pending().apply(RequestAction::Cancel, Utc::now()).unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
        assert_eq!(cancelled.bloodbank, None);

        let rejected = pending()
            .apply(reject(BankId::generate()), Utc::now())
            .unwrap();
        assert_eq!(
            rejected.apply(RequestAction::Cancel, Utc::now()).unwrap_err(),
            TransitionError::NotCancellable {
                status: RequestStatus::Rejected
            }
        );
    }

    #[test]
    fn action_targets() {
        assert_eq!(RequestAction::Cancel.target(), RequestStatus::Cancelled);
        assert_eq!(approve(BankId::generate()).name(), "approve");
    }
}
