use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use ebloodbank_gateway::MetricsSnapshot;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Current workflow metrics snapshot.
    pub metrics: MetricsResponse,
}

/// Workflow counters since startup.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    /// Blood requests created.
    #[schema(example = 42)]
    pub requests_created: u64,
    /// Requests approved by a bank.
    #[schema(example = 30)]
    pub requests_approved: u64,
    /// Requests rejected by a bank.
    #[schema(example = 6)]
    pub requests_rejected: u64,
    /// Approved requests marked fulfilled.
    #[schema(example = 25)]
    pub requests_fulfilled: u64,
    /// Requests cancelled by their requester.
    #[schema(example = 2)]
    pub requests_cancelled: u64,
    /// Field edits through the generic update path.
    #[schema(example = 4)]
    pub requests_updated: u64,
    /// Transitions refused because of the request's current status.
    #[schema(example = 3)]
    pub transition_conflicts: u64,
    /// Compare-and-swap retries after a concurrent write.
    #[schema(example = 1)]
    pub cas_retries: u64,
    /// Donations recorded.
    #[schema(example = 18)]
    pub donations_recorded: u64,
    /// Units credited to inventory by donations.
    #[schema(example = 20)]
    pub units_credited: u64,
    /// Donor profiles created lazily by donation recording.
    #[schema(example = 5)]
    pub donors_created: u64,
    /// Direct inventory sets.
    #[schema(example = 8)]
    pub inventory_sets: u64,
    /// Appointments booked.
    #[schema(example = 7)]
    pub appointments_booked: u64,
    /// Operations refused for the caller's role.
    #[schema(example = 0)]
    pub permission_denied: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(snap: MetricsSnapshot) -> Self {
        Self {
            requests_created: snap.requests_created,
            requests_approved: snap.requests_approved,
            requests_rejected: snap.requests_rejected,
            requests_fulfilled: snap.requests_fulfilled,
            requests_cancelled: snap.requests_cancelled,
            requests_updated: snap.requests_updated,
            transition_conflicts: snap.transition_conflicts,
            cas_retries: snap.cas_retries,
            donations_recorded: snap.donations_recorded,
            units_credited: snap.units_credited,
            donors_created: snap.donors_created,
            inventory_sets: snap.inventory_sets,
            appointments_booked: snap.appointments_booked,
            permission_denied: snap.permission_denied,
        }
    }
}

/// Generic error response returned on failures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    #[schema(example = "must be greater than zero")]
    pub error: String,
    /// Offending input field, for validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "units_required")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: None,
        }
    }
}
