use thiserror::Error;

use crate::request::RequestStatus;

/// A single field failed validation. Nothing has been written when this is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending input field.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A request lifecycle transition that the state machine refuses.
///
/// Every variant names the status the request is currently in so callers can
/// explain the refusal without knowing the transition table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("request is already approved by another blood bank")]
    AlreadyApproved,

    #[error("cannot approve a request that is {status}; only pending or rejected requests can be approved")]
    NotApprovable { status: RequestStatus },

    #[error("cannot reject a request that is {status}; only pending requests can be rejected")]
    NotRejectable { status: RequestStatus },

    #[error("cannot fulfill a request that is {status}; only approved requests can be fulfilled")]
    NotFulfillable { status: RequestStatus },

    #[error("request is bound to another blood bank and can only be fulfilled by it")]
    BoundElsewhere,

    #[error("cannot cancel a request that is {status}; only pending requests can be cancelled")]
    NotCancellable { status: RequestStatus },
}

impl TransitionError {
    /// Status the request was in when the transition was refused.
    #[must_use]
    pub fn current_status(&self) -> RequestStatus {
        match self {
            Self::AlreadyApproved | Self::BoundElsewhere => RequestStatus::Approved,
            Self::NotApprovable { status }
            | Self::NotRejectable { status }
            | Self::NotFulfillable { status }
            | Self::NotCancellable { status } => *status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_names_field() {
        let err = ValidationError::new("units_required", "must be greater than 0");
        assert_eq!(err.to_string(), "units_required: must be greater than 0");
    }

    #[test]
    fn transition_error_names_status() {
        let err = TransitionError::NotRejectable {
            status: RequestStatus::Rejected,
        };
        assert!(err.to_string().contains("rejected"));
        assert_eq!(err.current_status(), RequestStatus::Rejected);
    }
}
