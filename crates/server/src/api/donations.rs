use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use ebloodbank_core::{BankId, Donation, DonationInput, DonorId, InventoryView};
use ebloodbank_gateway::RecordedDonation;
use ebloodbank_store::DonationFilter;

use crate::auth::identity::CallerIdentity;
use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

/// Query parameters for listing donations.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DonationQuery {
    /// Only donations at this bank. Ignored for bank operators, who always
    /// see their own bank.
    pub bloodbank: Option<BankId>,
    /// Only donations by this donor.
    pub donor: Option<DonorId>,
}

/// Response for listing donations.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListDonationsResponse {
    pub donations: Vec<Donation>,
    #[schema(example = 12)]
    pub total: usize,
}

/// The stored donation and the inventory row it credited.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordDonationResponse {
    pub donation: Donation,
    pub inventory: InventoryView,
}

impl From<RecordedDonation> for RecordDonationResponse {
    fn from(recorded: RecordedDonation) -> Self {
        Self {
            donation: recorded.donation,
            inventory: recorded.inventory.into(),
        }
    }
}

/// `GET /v1/donations` -- list the donations visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/donations",
    tag = "Donations",
    summary = "List donations",
    description = "Bank operators see their bank's donations, requesters their own, admins all.",
    params(DonationQuery),
    responses(
        (status = 200, description = "Visible donations", body = ListDonationsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn list_donations(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Query(query): Query<DonationQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let filter = DonationFilter {
        bloodbank: query.bloodbank,
        donor: query.donor,
    };
    let donations = state
        .gateway
        .list_donations(&identity.principal, filter)
        .await?;
    let total = donations.len();
    Ok((
        StatusCode::OK,
        Json(ListDonationsResponse { donations, total }),
    ))
}

/// `POST /v1/donations` -- record a donation at the caller's bank.
#[utoipa::path(
    post,
    path = "/v1/donations",
    tag = "Donations",
    summary = "Record donation",
    description = "Stores the donation, credits the bank's inventory for the donor's blood group and updates the donor's last donation date in one transaction. A donor profile is created for the account when it has none.",
    request_body(content = DonationInput, description = "Donation details and donor reference"),
    responses(
        (status = 201, description = "Donation recorded", body = RecordDonationResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not a blood bank operator", body = ErrorResponse),
        (status = 404, description = "Donor or account not found", body = ErrorResponse),
    )
)]
pub async fn record_donation(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Json(body): Json<DonationInput>,
) -> Result<impl IntoResponse, ServerError> {
    let recorded = state
        .gateway
        .record_donation(&identity.principal, body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RecordDonationResponse::from(recorded)),
    ))
}
