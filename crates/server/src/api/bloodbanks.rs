use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use ebloodbank_core::BloodBank;
use ebloodbank_store::BankFilter;

use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BankQuery {
    /// Case-insensitive city match.
    pub city: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListBanksResponse {
    pub bloodbanks: Vec<BloodBank>,
    #[schema(example = 2)]
    pub total: usize,
}

/// `GET /v1/bloodbanks` -- blood bank directory.
#[utoipa::path(
    get,
    path = "/v1/bloodbanks",
    tag = "Blood banks",
    summary = "List blood banks",
    params(BankQuery),
    responses(
        (status = 200, description = "Matching banks", body = ListBanksResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn list_banks(
    State(state): State<AppState>,
    Query(query): Query<BankQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let filter = BankFilter {
        city: query.city.filter(|c| !c.trim().is_empty()),
    };
    let bloodbanks = state.gateway.list_banks(&filter).await?;
    let total = bloodbanks.len();
    Ok((StatusCode::OK, Json(ListBanksResponse { bloodbanks, total })))
}
