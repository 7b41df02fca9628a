#![allow(clippy::needless_for_each)]

use ebloodbank_core::{
    Appointment, AppointmentStatus, BloodBank, BloodGroup, BloodRequest, Donation, DonationInput,
    Donor, Gender, InventoryItem, InventorySet, InventoryView, NewAppointment, NewBloodRequest,
    RequestPatch, RequestStatus, Urgency,
};

use super::appointments::{AppointmentStatusUpdate, ListAppointmentsResponse};
use super::auth::{LoginRequest, LoginResponse};
use super::bloodbanks::ListBanksResponse;
use super::donations::{ListDonationsResponse, RecordDonationResponse};
use super::donors::ListDonorsResponse;
use super::inventory::ListInventoryResponse;
use super::requests::ListRequestsResponse;
use super::schemas::{ErrorResponse, HealthResponse, MetricsResponse};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "ebloodbank API",
        version = "0.1.0",
        description = "HTTP API for the ebloodbank backend. Raise and approve blood requests, record donations and track per-bank inventory.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health and metrics"),
        (name = "Auth", description = "Login and logout"),
        (name = "Requests", description = "Blood requests and their approval workflow"),
        (name = "Donations", description = "Donation recording and history"),
        (name = "Inventory", description = "Per-bank stock levels by blood group"),
        (name = "Donors", description = "Donor directory"),
        (name = "Blood banks", description = "Blood bank directory"),
        (name = "Appointments", description = "Donation appointment booking")
    ),
    paths(
        super::health::health,
        super::health::metrics,
        super::auth::login,
        super::auth::logout,
        super::requests::list_requests,
        super::requests::create_request,
        super::requests::get_request,
        super::requests::update_request,
        super::requests::approve_request,
        super::requests::reject_request,
        super::requests::fulfill_request,
        super::requests::cancel_request,
        super::donations::list_donations,
        super::donations::record_donation,
        super::inventory::list_inventory,
        super::inventory::set_inventory,
        super::donors::list_donors,
        super::donors::get_donor,
        super::bloodbanks::list_banks,
        super::appointments::list_appointments,
        super::appointments::book_appointment,
        super::appointments::update_appointment_status,
    ),
    components(schemas(
        HealthResponse, MetricsResponse, ErrorResponse,
        LoginRequest, LoginResponse,
        BloodRequest, NewBloodRequest, RequestPatch, RequestStatus, Urgency, BloodGroup,
        ListRequestsResponse,
        Donation, DonationInput, RecordDonationResponse, ListDonationsResponse,
        InventoryItem, InventoryView, InventorySet, ListInventoryResponse,
        Donor, Gender, ListDonorsResponse,
        BloodBank, ListBanksResponse,
        Appointment, AppointmentStatus, NewAppointment, AppointmentStatusUpdate,
        ListAppointmentsResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;

    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/v1/auth/login",
            "/v1/requests",
            "/v1/requests/{id}",
            "/v1/requests/{id}/approve",
            "/v1/requests/{id}/reject",
            "/v1/requests/{id}/fulfill",
            "/v1/requests/{id}/cancel",
            "/v1/donations",
            "/v1/inventory",
            "/v1/donors/{id}",
            "/v1/bloodbanks",
            "/v1/appointments/{id}/status",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
