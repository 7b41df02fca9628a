use serde::{Deserialize, Serialize};

use crate::account::AccountKind;
use crate::types::{AccountId, BankId};

/// The authenticated caller of an operation, resolved once per request.
///
/// Whether an account operates a blood bank is decided when the principal is
/// built, so workflows match on the variant instead of probing for a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// A donor/receiver account that creates blood requests.
    Requester { account: AccountId },
    /// An account administratively tied to exactly one blood bank.
    BloodBankOperator { account: AccountId, bank: BankId },
    /// A staff account with read access to everything.
    Admin { account: AccountId },
}

impl Principal {
    /// The account behind this principal.
    #[must_use]
    pub const fn account(&self) -> AccountId {
        match self {
            Self::Requester { account }
            | Self::BloodBankOperator { account, .. }
            | Self::Admin { account } => *account,
        }
    }

    /// The bank this principal operates, if any.
    #[must_use]
    pub const fn bank(&self) -> Option<BankId> {
        match self {
            Self::BloodBankOperator { bank, .. } => Some(*bank),
            Self::Requester { .. } | Self::Admin { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_bank_operator(&self) -> bool {
        matches!(self, Self::BloodBankOperator { .. })
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        match self {
            Self::Requester { .. } => AccountKind::Requester,
            Self::BloodBankOperator { .. } => AccountKind::BloodBank,
            Self::Admin { .. } => AccountKind::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_only_for_operators() {
        let account = AccountId::generate();
        let bank = BankId::generate();
        assert_eq!(Principal::Requester { account }.bank(), None);
        assert_eq!(Principal::Admin { account }.bank(), None);
        let op = Principal::BloodBankOperator { account, bank };
        assert_eq!(op.bank(), Some(bank));
        assert!(op.is_bank_operator());
        assert_eq!(op.account(), account);
        assert_eq!(op.kind(), AccountKind::BloodBank);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let p = Principal::Admin {
            account: AccountId::generate(),
        };
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json["kind"], "admin");
    }
}
