pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Registrar API",
        version = "1.0.0",
        description = "Enrollment, attendance and certificate service for workshops and competitions"
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::activity::list_activities,
        handlers::activity::get_activity,
        handlers::activity::create_activity,
        handlers::activity::update_activity,
        handlers::activity::delete_activity,
        handlers::enrollment::enroll,
        handlers::enrollment::withdraw,
        handlers::enrollment::enrollment_status,
        handlers::enrollment::my_activities,
        handlers::enrollment::list_enrollees,
        handlers::enrollment::set_attendance,
        handlers::enrollment::set_outcome,
        handlers::enrollment::competition_results,
        handlers::certificate::get_certificate,
        handlers::certificate::download_certificate,
        handlers::certificate::verify_certificate,
        handlers::identity::get_identity_token,
        handlers::identity::rotate_identity_token,
        handlers::identity::email_identity_token,
        handlers::report::participants_report,
    ),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Activities", description = "Workshop and competition catalog"),
        (name = "Enrollment", description = "Taking and releasing seats"),
        (name = "Roster", description = "Attendance and competition outcomes"),
        (name = "Certificates", description = "Issuing and verifying certificates"),
        (name = "Identity", description = "Per-user identity QR tokens"),
        (name = "Reports", description = "Administrative reports"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let api = ApiDoc::openapi();
    let cors = cors_layer(&state.config.server.cors);

    axum::Router::new()
        .nest("/api", routes::api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
