//! Blood request endpoints: creation, listing, edits and the approval
//! workflow transitions.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use ebloodbank_core::{
    BankId, BloodGroup, BloodRequest, NewBloodRequest, RequestId, RequestPatch, RequestStatus,
    ValidationError,
};
use ebloodbank_gateway::GatewayError;
use ebloodbank_store::RequestFilter;

use crate::auth::identity::CallerIdentity;
use crate::error::ServerError;

use super::schemas::ErrorResponse;
use super::{AppState, parse_query};

/// Query parameters for listing requests.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RequestQuery {
    /// Filter by status (`pending`, `approved`, `rejected`, `fulfilled`, `cancelled`).
    pub status: Option<String>,
    /// Filter by blood group (`A+`, `ab-`, ...).
    pub blood_group: Option<String>,
    /// Filter by the bank that last acted on the request.
    pub bloodbank: Option<BankId>,
}

impl RequestQuery {
    fn into_filter(self) -> Result<RequestFilter, ValidationError> {
        Ok(RequestFilter {
            requester: None,
            bloodbank: self.bloodbank,
            status: parse_query::<RequestStatus>(self.status.as_deref())?,
            blood_group: parse_query::<BloodGroup>(self.blood_group.as_deref())?,
        })
    }
}

/// Response for listing requests.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListRequestsResponse {
    pub requests: Vec<BloodRequest>,
    #[schema(example = 3)]
    pub total: usize,
}

/// `GET /v1/requests` -- list the blood requests visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/requests",
    tag = "Requests",
    summary = "List requests",
    description = "Requesters see their own requests; bank operators and admins see all.",
    params(RequestQuery),
    responses(
        (status = 200, description = "Visible requests", body = ListRequestsResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Query(query): Query<RequestQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let filter = query.into_filter().map_err(GatewayError::from)?;
    let requests = state
        .gateway
        .list_requests(&identity.principal, filter)
        .await?;
    let total = requests.len();
    Ok((
        StatusCode::OK,
        Json(ListRequestsResponse { requests, total }),
    ))
}

/// `POST /v1/requests` -- raise a new blood request.
#[utoipa::path(
    post,
    path = "/v1/requests",
    tag = "Requests",
    summary = "Create request",
    description = "Creates a pending request owned by the caller. Blood bank operators cannot create requests.",
    request_body(content = NewBloodRequest, description = "Request details"),
    responses(
        (status = 201, description = "Request created", body = BloodRequest),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is a blood bank operator", body = ErrorResponse),
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Json(body): Json<NewBloodRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let request = state
        .gateway
        .create_request(&identity.principal, body)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /v1/requests/{id}` -- read one request.
#[utoipa::path(
    get,
    path = "/v1/requests/{id}",
    tag = "Requests",
    summary = "Get request",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "The request", body = BloodRequest),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Request not found or not visible", body = ErrorResponse),
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Path(id): Path<RequestId>,
) -> Result<impl IntoResponse, ServerError> {
    let request = state.gateway.get_request(&identity.principal, id).await?;
    Ok((StatusCode::OK, Json(request)))
}

/// `PATCH /v1/requests/{id}` -- generic edit path.
#[utoipa::path(
    patch,
    path = "/v1/requests/{id}",
    tag = "Requests",
    summary = "Update request",
    description = "Edits request fields. Setting `status` is limited to blood bank operators and to `approved` or `rejected`, with the same rules as the approve and reject endpoints.",
    params(("id" = String, Path, description = "Request id")),
    request_body(content = RequestPatch, description = "Fields to change"),
    responses(
        (status = 200, description = "Updated request", body = BloodRequest),
        (status = 400, description = "Validation failed or transition refused", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
    )
)]
pub async fn update_request(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Path(id): Path<RequestId>,
    Json(patch): Json<RequestPatch>,
) -> Result<impl IntoResponse, ServerError> {
    let request = state
        .gateway
        .update_request(&identity.principal, id, patch)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

/// `POST /v1/requests/{id}/approve` -- approve and bind to the caller's bank.
#[utoipa::path(
    post,
    path = "/v1/requests/{id}/approve",
    tag = "Requests",
    summary = "Approve request",
    description = "Approves a pending or rejected request for the caller's blood bank. Fails if another bank already approved it.",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Approved request", body = BloodRequest),
        (status = 400, description = "Transition refused", body = ErrorResponse),
        (status = 403, description = "Caller is not a blood bank operator", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Path(id): Path<RequestId>,
) -> Result<impl IntoResponse, ServerError> {
    let request = state
        .gateway
        .approve_request(&identity.principal, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

/// `POST /v1/requests/{id}/reject` -- reject a pending request.
#[utoipa::path(
    post,
    path = "/v1/requests/{id}/reject",
    tag = "Requests",
    summary = "Reject request",
    description = "Rejects a pending request on behalf of the caller's blood bank. Another bank may still approve it afterwards.",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Rejected request", body = BloodRequest),
        (status = 400, description = "Transition refused", body = ErrorResponse),
        (status = 403, description = "Caller is not a blood bank operator", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
    )
)]
pub async fn reject_request(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Path(id): Path<RequestId>,
) -> Result<impl IntoResponse, ServerError> {
    let request = state
        .gateway
        .reject_request(&identity.principal, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

/// `POST /v1/requests/{id}/fulfill` -- mark an approved request fulfilled.
#[utoipa::path(
    post,
    path = "/v1/requests/{id}/fulfill",
    tag = "Requests",
    summary = "Fulfill request",
    description = "Only the blood bank the request is bound to can fulfill it, and only once approved.",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Fulfilled request", body = BloodRequest),
        (status = 400, description = "Transition refused", body = ErrorResponse),
        (status = 403, description = "Caller is not a blood bank operator", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
    )
)]
pub async fn fulfill_request(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Path(id): Path<RequestId>,
) -> Result<impl IntoResponse, ServerError> {
    let request = state
        .gateway
        .fulfill_request(&identity.principal, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

/// `POST /v1/requests/{id}/cancel` -- withdraw a pending request.
#[utoipa::path(
    post,
    path = "/v1/requests/{id}/cancel",
    tag = "Requests",
    summary = "Cancel request",
    description = "The requester who raised a pending request can cancel it.",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Cancelled request", body = BloodRequest),
        (status = 400, description = "Transition refused", body = ErrorResponse),
        (status = 403, description = "Caller does not own the request", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
    )
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Path(id): Path<RequestId>,
) -> Result<impl IntoResponse, ServerError> {
    let request = state
        .gateway
        .cancel_request(&identity.principal, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parses_leniently() {
        let query = RequestQuery {
            status: Some(" Approved ".into()),
            blood_group: Some("ab-".into()),
            bloodbank: None,
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.status, Some(RequestStatus::Approved));
        assert_eq!(filter.blood_group, Some(BloodGroup::AbNegative));
        assert!(filter.requester.is_none());
    }

    #[test]
    fn empty_values_are_ignored() {
        let query = RequestQuery {
            status: Some(String::new()),
            ..RequestQuery::default()
        };
        assert_eq!(query.into_filter().unwrap(), RequestFilter::default());
    }

    #[test]
    fn bad_status_names_the_field() {
        let query = RequestQuery {
            status: Some("shipped".into()),
            ..RequestQuery::default()
        };
        assert_eq!(query.into_filter().unwrap_err().field, "status");
    }
}
