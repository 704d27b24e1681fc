//! HTTP surface: the preview routes and a database health probe.

pub mod middleware;
pub mod previews;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::{error::ErrorReport, preview::PreviewService};
use crate::infra::db::PostgresRepositories;

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub previews: Arc<PreviewService>,
    pub db: Arc<PostgresRepositories>,
    /// Browser lifetime for redirect responses, deliberately shorter than the
    /// server-side blob retention since the pointer may move.
    pub redirect_max_age_secs: u64,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/og/product", get(previews::product))
        .route("/og/fund", get(previews::fund))
        .route("/og/business", get(previews::business))
        .route("/og/admin-invite", get(previews::admin_invite))
        .route("/_health/db", get(health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health(State(state): State<HttpState>) -> Response {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(err) => {
            let mut response = (StatusCode::SERVICE_UNAVAILABLE, "database unavailable").into_response();
            ErrorReport::from_error(
                "infra::http::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
