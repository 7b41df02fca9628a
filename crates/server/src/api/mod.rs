pub mod appointments;
pub mod auth;
pub mod bloodbanks;
pub mod donations;
pub mod donors;
pub mod health;
pub mod inventory;
pub mod openapi;
pub mod requests;
pub mod schemas;

use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ebloodbank_core::ValidationError;
use ebloodbank_gateway::Gateway;

use crate::auth::AuthProvider;
use crate::auth::middleware::AuthLayer;

use self::openapi::ApiDoc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The gateway instance.
    pub gateway: Arc<Gateway>,
    /// Optional auth provider (None when auth is disabled).
    pub auth: Option<Arc<AuthProvider>>,
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        // Health & metrics (always public)
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        // Login (must be public)
        .route("/v1/auth/login", post(auth::login));

    let protected = Router::new()
        // Blood requests
        .route(
            "/v1/requests",
            get(requests::list_requests).post(requests::create_request),
        )
        .route(
            "/v1/requests/{id}",
            get(requests::get_request).patch(requests::update_request),
        )
        .route("/v1/requests/{id}/approve", post(requests::approve_request))
        .route("/v1/requests/{id}/reject", post(requests::reject_request))
        .route("/v1/requests/{id}/fulfill", post(requests::fulfill_request))
        .route("/v1/requests/{id}/cancel", post(requests::cancel_request))
        // Donations and stock
        .route(
            "/v1/donations",
            get(donations::list_donations).post(donations::record_donation),
        )
        .route(
            "/v1/inventory",
            get(inventory::list_inventory).put(inventory::set_inventory),
        )
        // Directory
        .route("/v1/donors", get(donors::list_donors))
        .route("/v1/donors/{id}", get(donors::get_donor))
        .route("/v1/bloodbanks", get(bloodbanks::list_banks))
        // Appointments
        .route(
            "/v1/appointments",
            get(appointments::list_appointments).post(appointments::book_appointment),
        )
        .route(
            "/v1/appointments/{id}/status",
            put(appointments::update_appointment_status),
        )
        // Logout (requires auth)
        .route("/v1/auth/logout", post(auth::logout))
        .layer(AuthLayer::new(state.auth.clone()));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Parse an optional query value with the type's lenient `FromStr`.
pub(crate) fn parse_query<T>(raw: Option<&str>) -> Result<Option<T>, ValidationError>
where
    T: FromStr<Err = ValidationError>,
{
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(T::from_str)
        .transpose()
}
