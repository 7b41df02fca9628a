use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use ebloodbank_core::{Appointment, AppointmentId, AppointmentStatus, NewAppointment};

use crate::auth::identity::CallerIdentity;
use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct ListAppointmentsResponse {
    pub appointments: Vec<Appointment>,
    #[schema(example = 1)]
    pub total: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AppointmentStatusUpdate {
    pub status: AppointmentStatus,
}

/// `GET /v1/appointments` -- appointments visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/appointments",
    tag = "Appointments",
    summary = "List appointments",
    description = "Bank operators see their bank's appointments, admins all, everyone else their own.",
    responses(
        (status = 200, description = "Visible appointments", body = ListAppointmentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
) -> Result<impl IntoResponse, ServerError> {
    let appointments = state.gateway.list_appointments(&identity.principal).await?;
    let total = appointments.len();
    Ok((
        StatusCode::OK,
        Json(ListAppointmentsResponse {
            appointments,
            total,
        }),
    ))
}

/// `POST /v1/appointments` -- book a donation slot.
#[utoipa::path(
    post,
    path = "/v1/appointments",
    tag = "Appointments",
    summary = "Book appointment",
    request_body(content = NewAppointment, description = "Bank and date"),
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is a blood bank operator", body = ErrorResponse),
        (status = 404, description = "Blood bank not found", body = ErrorResponse),
    )
)]
pub async fn book_appointment(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Json(body): Json<NewAppointment>,
) -> Result<impl IntoResponse, ServerError> {
    let appointment = state
        .gateway
        .book_appointment(&identity.principal, body)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// `PUT /v1/appointments/{id}/status` -- move an appointment at the caller's bank.
#[utoipa::path(
    put,
    path = "/v1/appointments/{id}/status",
    tag = "Appointments",
    summary = "Update appointment status",
    description = "Allowed moves: pending to approved or rejected, approved to completed or rejected.",
    params(("id" = String, Path, description = "Appointment id")),
    request_body(content = AppointmentStatusUpdate, description = "Target status"),
    responses(
        (status = 200, description = "Updated appointment", body = Appointment),
        (status = 400, description = "Move not allowed", body = ErrorResponse),
        (status = 403, description = "Not the appointment's blood bank", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse),
    )
)]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<CallerIdentity>,
    Path(id): Path<AppointmentId>,
    Json(body): Json<AppointmentStatusUpdate>,
) -> Result<impl IntoResponse, ServerError> {
    let appointment = state
        .gateway
        .update_appointment_status(&identity.principal, id, body.status)
        .await?;
    Ok((StatusCode::OK, Json(appointment)))
}
