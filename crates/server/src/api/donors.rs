use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use ebloodbank_core::{AccountId, BloodGroup, Donor, DonorId};
use ebloodbank_gateway::GatewayError;
use ebloodbank_store::DonorFilter;

use crate::error::ServerError;

use super::schemas::ErrorResponse;
use super::{AppState, parse_query};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DonorQuery {
    pub blood_group: Option<String>,
    /// Case-insensitive city match.
    pub city: Option<String>,
    pub account: Option<AccountId>,
    pub is_eligible: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListDonorsResponse {
    pub donors: Vec<Donor>,
    #[schema(example = 4)]
    pub total: usize,
}

/// `GET /v1/donors` -- donor directory.
#[utoipa::path(
    get,
    path = "/v1/donors",
    tag = "Donors",
    summary = "List donors",
    params(DonorQuery),
    responses(
        (status = 200, description = "Matching donors", body = ListDonorsResponse),
        (status = 400, description = "Invalid blood group", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn list_donors(
    State(state): State<AppState>,
    Query(query): Query<DonorQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let filter = DonorFilter {
        account: query.account,
        blood_group: parse_query::<BloodGroup>(query.blood_group.as_deref())
            .map_err(GatewayError::from)?,
        city: query.city.filter(|c| !c.trim().is_empty()),
        is_eligible: query.is_eligible,
    };
    let donors = state.gateway.list_donors(&filter).await?;
    let total = donors.len();
    Ok((StatusCode::OK, Json(ListDonorsResponse { donors, total })))
}

/// `GET /v1/donors/{id}` -- one donor profile.
#[utoipa::path(
    get,
    path = "/v1/donors/{id}",
    tag = "Donors",
    summary = "Get donor",
    params(("id" = String, Path, description = "Donor id")),
    responses(
        (status = 200, description = "The donor", body = Donor),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Donor not found", body = ErrorResponse),
    )
)]
pub async fn get_donor(
    State(state): State<AppState>,
    Path(id): Path<DonorId>,
) -> Result<impl IntoResponse, ServerError> {
    let donor = state.gateway.get_donor(id).await?;
    Ok((StatusCode::OK, Json(donor)))
}
