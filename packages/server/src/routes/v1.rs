use axum::{
    Extension, Router,
    routing::{get, patch, post, put},
};

use crate::entity::activity::ActivityKind;
use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/workshops", activity_routes(ActivityKind::Workshop))
        .nest(
            "/competitions",
            competition_only_routes().merge(activity_routes(ActivityKind::Competition)),
        )
        .nest("/certificates", certificate_routes())
        .nest("/reports", report_routes())
        .nest("/me", me_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

/// Routes shared by both kinds. Handlers read the kind from the extension.
fn activity_routes(kind: ActivityKind) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::activity::list_activities).post(handlers::activity::create_activity),
        )
        .route("/mine", get(handlers::enrollment::my_activities))
        .route(
            "/{id}",
            get(handlers::activity::get_activity)
                .patch(handlers::activity::update_activity)
                .delete(handlers::activity::delete_activity),
        )
        .route(
            "/{id}/enrollment",
            get(handlers::enrollment::enrollment_status)
                .post(handlers::enrollment::enroll)
                .delete(handlers::enrollment::withdraw),
        )
        .route("/{id}/enrollees", get(handlers::enrollment::list_enrollees))
        .route(
            "/{id}/enrollees/{user_id}/attendance",
            put(handlers::enrollment::set_attendance),
        )
        .route("/{id}/certificate", get(handlers::certificate::get_certificate))
        .route(
            "/{id}/certificate/document",
            get(handlers::certificate::download_certificate),
        )
        .layer(Extension(kind))
}

fn competition_only_routes() -> Router<AppState> {
    Router::new()
        .route("/results", get(handlers::enrollment::competition_results))
        .route(
            "/{id}/enrollees/{user_id}",
            patch(handlers::enrollment::set_outcome),
        )
}

fn certificate_routes() -> Router<AppState> {
    Router::new().route(
        "/verify/{code}",
        get(handlers::certificate::verify_certificate),
    )
}

fn report_routes() -> Router<AppState> {
    Router::new().route("/participants", get(handlers::report::participants_report))
}

fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/identity-token", get(handlers::identity::get_identity_token))
        .route(
            "/identity-token/rotate",
            post(handlers::identity::rotate_identity_token),
        )
        .route(
            "/identity-token/email",
            post(handlers::identity::email_identity_token),
        )
}
