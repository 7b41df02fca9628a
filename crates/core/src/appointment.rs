use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{AccountId, AppointmentId, BankId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl AppointmentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    /// Whether a bank may move an appointment from `self` to `to`.
    #[must_use]
    pub const fn can_move_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Approved | Self::Rejected)
                | (Self::Approved, Self::Completed | Self::Rejected)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            other => Err(ValidationError::new(
                "status",
                format!("'{other}' is not a valid appointment status"),
            )),
        }
    }
}

/// A donation slot booked by an account at a bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Appointment {
    pub id: AppointmentId,
    pub account: AccountId,
    pub bloodbank: BankId,
    pub appointment_date: NaiveDate,
    pub notes: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Move to `to`, refusing moves the bank workflow does not allow.
    pub fn transition(
        &self,
        to: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if !self.status.can_move_to(to) {
            return Err(ValidationError::new(
                "status",
                format!("cannot move an appointment from {} to {to}", self.status),
            ));
        }
        let mut next = self.clone();
        next.status = to;
        next.updated_at = now;
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewAppointment {
    pub bloodbank: BankId,
    pub appointment_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl NewAppointment {
    pub fn into_appointment(
        self,
        account: AccountId,
        now: DateTime<Utc>,
    ) -> Result<Appointment, ValidationError> {
        let appointment_date = self
            .appointment_date
            .ok_or_else(|| ValidationError::new("appointment_date", "this field is required"))?;
        Ok(Appointment {
            id: AppointmentId::generate(),
            account,
            bloodbank: self.bloodbank,
            appointment_date,
            notes: self.notes,
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }
}
