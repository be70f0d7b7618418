use http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Any origin may read the dashboard API.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any)
        .expose_headers([header::CONTENT_DISPOSITION])
}
