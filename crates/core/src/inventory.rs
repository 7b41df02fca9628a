use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blood_group::BloodGroup;
use crate::error::ValidationError;
use crate::types::BankId;
use crate::validate;

/// Threshold given to inventory rows created without an explicit one.
pub const DEFAULT_MIN_STOCK: i32 = 5;

/// Unit counter for one blood group at one bank. Unique per
/// `(bloodbank, blood_group)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InventoryItem {
    pub bloodbank: BankId,
    pub blood_group: BloodGroup,
    pub units_available: i32,
    pub min_stock_level: i32,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    /// An empty row with the default threshold.
    #[must_use]
    pub fn empty(bloodbank: BankId, blood_group: BloodGroup, now: DateTime<Utc>) -> Self {
        Self {
            bloodbank,
            blood_group,
            units_available: 0,
            min_stock_level: DEFAULT_MIN_STOCK,
            last_updated: now,
            created_at: now,
        }
    }

    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.units_available <= self.min_stock_level
    }
}

/// Absolute set of one inventory row by its bank's operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InventorySet {
    pub blood_group: BloodGroup,
    pub units_available: i32,
    /// Keeps the current threshold (or the default for a new row) when absent.
    pub min_stock_level: Option<i32>,
}

impl InventorySet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::non_negative("units_available", self.units_available)?;
        if let Some(min) = self.min_stock_level {
            validate::non_negative("min_stock_level", min)?;
        }
        Ok(())
    }

    /// Row resulting from this set applied over `existing`, if any.
    #[must_use]
    pub fn apply(
        &self,
        bloodbank: BankId,
        existing: Option<&InventoryItem>,
        now: DateTime<Utc>,
    ) -> InventoryItem {
        let mut item = existing
            .cloned()
            .unwrap_or_else(|| InventoryItem::empty(bloodbank, self.blood_group, now));
        item.units_available = self.units_available;
        if let Some(min) = self.min_stock_level {
            item.min_stock_level = min;
        }
        item.last_updated = now;
        item
    }
}

/// Inventory row as returned to callers, with the derived flag spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InventoryView {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub is_low_stock: bool,
}

impl From<InventoryItem> for InventoryView {
    fn from(item: InventoryItem) -> Self {
        Self {
            is_low_stock: item.is_low_stock(),
            item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_stock_is_inclusive() {
        let mut item = InventoryItem::empty(BankId::generate(), BloodGroup::AbNegative, Utc::now());
        item.units_available = 5;
        assert!(item.is_low_stock());
        item.units_available = 6;
        assert!(!item.is_low_stock());
    }

    #[test]
    fn set_rejects_negatives() {
        let set = InventorySet {
            blood_group: BloodGroup::APositive,
            units_available: -1,
            min_stock_level: None,
        };
        assert_eq!(set.validate().unwrap_err().field, "units_available");

        let set = InventorySet {
            blood_group: BloodGroup::APositive,
            units_available: 3,
            min_stock_level: Some(-2),
        };
        assert_eq!(set.validate().unwrap_err().field, "min_stock_level");
    }

    #[test]
    fn set_is_absolute_and_keeps_threshold() {
        let bank = BankId::generate();
        let mut existing = InventoryItem::empty(bank, BloodGroup::OPositive, Utc::now());
        existing.units_available = 40;
        existing.min_stock_level = 8;

        let set = InventorySet {
            blood_group: BloodGroup::OPositive,
            units_available: 12,
            min_stock_level: None,
        };
        let next = set.apply(bank, Some(&existing), Utc::now());
        assert_eq!(next.units_available, 12);
        assert_eq!(next.min_stock_level, 8);
        assert_eq!(next.created_at, existing.created_at);

        let fresh = set.apply(bank, None, Utc::now());
        assert_eq!(fresh.min_stock_level, DEFAULT_MIN_STOCK);
    }

    #[test]
    fn view_flattens_item() {
        let item = InventoryItem::empty(BankId::generate(), BloodGroup::BNegative, Utc::now());
        let json = serde_json::to_value(InventoryView::from(item)).unwrap();
        assert_eq!(json["blood_group"], "B-");
        assert_eq!(json["units_available"], 0);
        assert_eq!(json["is_low_stock"], true);
    }
}
