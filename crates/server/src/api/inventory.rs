use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use ebloodbank_core::{BloodGroup, InventorySet, InventoryView};
use ebloodbank_gateway::GatewayError;

use crate::auth::identity::CallerIdentity;
use crate::error::ServerError;

use super::schemas::ErrorResponse;
use super::{AppState, parse_query};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct InventoryQuery {
    /// Only this blood group (`A+`, `o-`, ...).
    pub blood_group: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListInventoryResponse {
    pub inventory: Vec<InventoryView>,
    #[schema(example = 8)]
    pub total: usize,
}

/// `GET /v1/inventory` -- stock levels per bank and blood group.
#[utoipa::path(
    get,
    path = "/v1/inventory",
    tag = "Inventory",
    summary = "List inventory",
    description = "Bank operators see their own bank's rows; everyone else sees all banks.",
    params(InventoryQuery),
    responses(
        (status = 200, description = "Inventory rows", body = ListInventoryResponse),
        (status = 400, description = "Invalid blood group", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Query(query): Query<InventoryQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let blood_group =
        parse_query::<BloodGroup>(query.blood_group.as_deref()).map_err(GatewayError::from)?;
    let inventory: Vec<InventoryView> = state
        .gateway
        .list_inventory(&identity.principal, blood_group)
        .await?
        .into_iter()
        .map(InventoryView::from)
        .collect();
    let total = inventory.len();
    Ok((
        StatusCode::OK,
        Json(ListInventoryResponse { inventory, total }),
    ))
}

/// `PUT /v1/inventory` -- set the absolute stock level for one blood group.
#[utoipa::path(
    put,
    path = "/v1/inventory",
    tag = "Inventory",
    summary = "Set inventory",
    description = "Overwrites units available (and the low-stock threshold when given) for one blood group at the caller's bank.",
    request_body(content = InventorySet, description = "New stock level"),
    responses(
        (status = 200, description = "Updated row", body = InventoryView),
        (status = 400, description = "Negative values", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not a blood bank operator", body = ErrorResponse),
    )
)]
pub async fn set_inventory(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Json(body): Json<InventorySet>,
) -> Result<impl IntoResponse, ServerError> {
    let item = state
        .gateway
        .set_inventory(&identity.principal, body)
        .await?;
    Ok((StatusCode::OK, Json(InventoryView::from(item))))
}
