pub mod meta;
pub mod submissions;

use std::any::Any;
use std::path::Path;

use axum::{response::IntoResponse, routing::get, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    dto::submission_dto::{ErrorBody, KeyValuePair},
    error::ApiError,
    middleware::cors::permissive_cors,
    AppState,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        submissions::list_submissions,
        submissions::get_submission,
        submissions::get_submission_parsed,
        submissions::export_submissions,
    ),
    components(schemas(ErrorBody, KeyValuePair))
)]
pub struct ApiDoc;

/// Submission endpoints only, without static pages or outer layers.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(meta::health))
        .route("/api/openapi.json", get(meta::openapi))
        .route("/api/submissions", get(submissions::list_submissions))
        .route(
            "/api/submissions/export/excel",
            get(submissions::export_submissions),
        )
        .route("/api/submissions/:id", get(submissions::get_submission))
        .route(
            "/api/submissions/:id/parsed",
            get(submissions::get_submission_parsed),
        )
}

/// Full application: API, the two dashboard pages and static assets.
pub fn router(state: AppState, public_dir: impl AsRef<Path>) -> Router {
    let public_dir = public_dir.as_ref();

    api_router()
        .route_service("/", ServeFile::new(public_dir.join("index.html")))
        .route_service("/detail/:id", ServeFile::new(public_dir.join("detail.html")))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %message, "Handler panicked");
    ApiError::internal(message).into_response()
}
