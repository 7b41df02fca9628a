//! Blood requests and the fields a requester supplies when creating or
//! editing one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::blood_group::BloodGroup;
use crate::error::ValidationError;
use crate::types::{AccountId, BankId, RequestId};
use crate::validate;

/// Maximum length of patient, hospital, and doctor names.
pub const NAME_MAX_LEN: usize = 200;
/// Maximum length of a contact number.
pub const CONTACT_MAX_LEN: usize = 15;

/// Lifecycle status of a blood request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Fulfilled,
    Cancelled,
}

impl RequestStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Fulfilled | Self::Cancelled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "fulfilled" => Ok(Self::Fulfilled),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError::new(
                "status",
                format!("'{other}' is not a valid request status"),
            )),
        }
    }
}

/// How soon the blood is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Emergency,
    Urgent,
    #[default]
    Normal,
}

impl Urgency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Urgent => "urgent",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emergency" => Ok(Self::Emergency),
            "urgent" => Ok(Self::Urgent),
            "normal" => Ok(Self::Normal),
            other => Err(ValidationError::new(
                "urgency",
                format!("'{other}' is not a valid urgency"),
            )),
        }
    }
}

/// A request for blood units raised by a requester.
///
/// The row is only ever mutated through [`BloodRequest::apply`] or
/// [`RequestPatch::apply_to`]; each successful mutation bumps `version`, which
/// stores use for compare-and-swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BloodRequest {
    pub id: RequestId,
    /// Six-digit human-readable code, unique across requests.
    pub code: String,
    pub requester: AccountId,
    /// Bank that last approved or rejected the request. `None` until a bank
    /// acts on it.
    pub bloodbank: Option<BankId>,
    pub patient_name: String,
    pub blood_group: BloodGroup,
    pub units_required: i32,
    pub urgency: Urgency,
    pub required_date: NaiveDate,
    pub hospital_name: String,
    pub doctor_name: String,
    pub contact_number: String,
    pub reason: String,
    pub admin_notes: String,
    pub status: RequestStatus,
    /// Operator account that last approved or rejected the request.
    pub approved_by: Option<AccountId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// Fields supplied when creating a blood request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewBloodRequest {
    pub patient_name: String,
    pub blood_group: BloodGroup,
    pub units_required: i32,
    #[serde(default)]
    pub urgency: Urgency,
    pub required_date: NaiveDate,
    pub hospital_name: String,
    pub doctor_name: String,
    pub contact_number: String,
    #[serde(default)]
    pub reason: String,
}

impl NewBloodRequest {
    /// Check every field, returning the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::required_text("patient_name", &self.patient_name, NAME_MAX_LEN)?;
        validate::positive("units_required", self.units_required)?;
        validate::required_text("hospital_name", &self.hospital_name, NAME_MAX_LEN)?;
        validate::required_text("doctor_name", &self.doctor_name, NAME_MAX_LEN)?;
        validate::required_text("contact_number", &self.contact_number, CONTACT_MAX_LEN)?;
        Ok(())
    }

    /// Validate and build a pending, unbound request owned by `requester`.
    pub fn into_request(
        self,
        requester: AccountId,
        code: String,
        now: DateTime<Utc>,
    ) -> Result<BloodRequest, ValidationError> {
        self.validate()?;
        Ok(BloodRequest {
            id: RequestId::generate(),
            code,
            requester,
            bloodbank: None,
            patient_name: self.patient_name.trim().to_owned(),
            blood_group: self.blood_group,
            units_required: self.units_required,
            urgency: self.urgency,
            required_date: self.required_date,
            hospital_name: self.hospital_name.trim().to_owned(),
            doctor_name: self.doctor_name.trim().to_owned(),
            contact_number: self.contact_number.trim().to_owned(),
            reason: self.reason,
            admin_notes: String::new(),
            status: RequestStatus::Pending,
            approved_by: None,
            approved_at: None,
            fulfilled_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }
}

/// A partial update through the generic edit path.
///
/// `status` is not applied here; the gateway routes it through the state
/// machine so the usual guards and bank binding hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RequestPatch {
    pub status: Option<RequestStatus>,
    pub patient_name: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub units_required: Option<i32>,
    pub urgency: Option<Urgency>,
    pub required_date: Option<NaiveDate>,
    pub hospital_name: Option<String>,
    pub doctor_name: Option<String>,
    pub contact_number: Option<String>,
    pub reason: Option<String>,
    pub admin_notes: Option<String>,
}

impl RequestPatch {
    /// Whether any non-status field is set.
    #[must_use]
    pub fn has_field_edits(&self) -> bool {
        self.patient_name.is_some()
            || self.blood_group.is_some()
            || self.units_required.is_some()
            || self.urgency.is_some()
            || self.required_date.is_some()
            || self.hospital_name.is_some()
            || self.doctor_name.is_some()
            || self.contact_number.is_some()
            || self.reason.is_some()
            || self.admin_notes.is_some()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.patient_name {
            validate::required_text("patient_name", name, NAME_MAX_LEN)?;
        }
        if let Some(units) = self.units_required {
            validate::positive("units_required", units)?;
        }
        if let Some(name) = &self.hospital_name {
            validate::required_text("hospital_name", name, NAME_MAX_LEN)?;
        }
        if let Some(name) = &self.doctor_name {
            validate::required_text("doctor_name", name, NAME_MAX_LEN)?;
        }
        if let Some(contact) = &self.contact_number {
            validate::required_text("contact_number", contact, CONTACT_MAX_LEN)?;
        }
        Ok(())
    }

    /// Apply the non-status fields to a copy of `request`.
    ///
    /// Returns the request unchanged apart from `version`/`updated_at` when no
    /// field is set.
    pub fn apply_to(
        &self,
        request: &BloodRequest,
        now: DateTime<Utc>,
    ) -> Result<BloodRequest, ValidationError> {
        self.validate()?;
        let mut next = request.clone();
        if let Some(v) = &self.patient_name {
            v.trim().clone_into(&mut next.patient_name);
        }
        if let Some(v) = self.blood_group {
            next.blood_group = v;
        }
        if let Some(v) = self.units_required {
            next.units_required = v;
        }
        if let Some(v) = self.urgency {
            next.urgency = v;
        }
        if let Some(v) = self.required_date {
            next.required_date = v;
        }
        if let Some(v) = &self.hospital_name {
            v.trim().clone_into(&mut next.hospital_name);
        }
        if let Some(v) = &self.doctor_name {
            v.trim().clone_into(&mut next.doctor_name);
        }
        if let Some(v) = &self.contact_number {
            v.trim().clone_into(&mut next.contact_number);
        }
        if let Some(v) = &self.reason {
            v.clone_into(&mut next.reason);
        }
        if let Some(v) = &self.admin_notes {
            v.clone_into(&mut next.admin_notes);
        }
        next.updated_at = now;
        next.version += 1;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_request() -> NewBloodRequest {
        NewBloodRequest {
            patient_name: "Ravi Kumar".into(),
            blood_group: BloodGroup::OPositive,
            units_required: 2,
            urgency: Urgency::Urgent,
            required_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            hospital_name: "City Hospital".into(),
            doctor_name: "Dr. Mehta".into(),
            contact_number: "9876543210".into(),
            reason: "surgery".into(),
        }
    }

    #[test]
    fn created_request_is_pending_and_unbound() {
        let requester = AccountId::generate();
        let req = new_request()
            .into_request(requester, "123456".into(), Utc::now())
            .unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.bloodbank, None);
        assert_eq!(req.requester, requester);
        assert_eq!(req.version, 0);
        assert_eq!(req.code, "123456");
    }

    #[test]
    fn rejects_non_positive_units() {
        let mut input = new_request();
        input.units_required = 0;
        let err = input.validate().unwrap_err();
        assert_eq!(err.field, "units_required");
    }

    #[test]
    fn rejects_long_contact_number() {
        let mut input = new_request();
        input.contact_number = "1234567890123456".into();
        assert_eq!(input.validate().unwrap_err().field, "contact_number");
    }

    #[test]
    fn rejects_blank_names() {
        let mut input = new_request();
        input.doctor_name = " ".into();
        assert_eq!(input.validate().unwrap_err().field, "doctor_name");
    }

    #[test]
    fn patch_applies_fields_and_bumps_version() {
        let req = new_request()
            .into_request(AccountId::generate(), "000001".into(), Utc::now())
            .unwrap();
        let patch = RequestPatch {
            units_required: Some(4),
            admin_notes: Some("call before pickup".into()),
            ..RequestPatch::default()
        };
        assert!(patch.has_field_edits());
        let next = patch.apply_to(&req, Utc::now()).unwrap();
        assert_eq!(next.units_required, 4);
        assert_eq!(next.admin_notes, "call before pickup");
        assert_eq!(next.version, req.version + 1);
        assert_eq!(next.status, req.status);
    }

    #[test]
    fn patch_validates_before_applying() {
        let req = new_request()
            .into_request(AccountId::generate(), "000002".into(), Utc::now())
            .unwrap();
        let patch = RequestPatch {
            units_required: Some(-1),
            ..RequestPatch::default()
        };
        assert!(patch.apply_to(&req, Utc::now()).is_err());
    }

    #[test]
    fn status_only_patch_has_no_field_edits() {
        let patch = RequestPatch {
            status: Some(RequestStatus::Approved),
            ..RequestPatch::default()
        };
        assert!(!patch.has_field_edits());
    }

    #[test]
    fn status_parses_and_displays() {
        assert_eq!("Approved".parse::<RequestStatus>().unwrap(), RequestStatus::Approved);
        assert_eq!(RequestStatus::Cancelled.to_string(), "cancelled");
        assert!(RequestStatus::Fulfilled.is_terminal());
        assert!(!RequestStatus::Rejected.is_terminal());
    }
}
