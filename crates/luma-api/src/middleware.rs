//! luma/crates/luma-api/src/middleware.rs Middleware
//!
//! Standard middleware for logging and cross-origin access.

use actix_cors::Cors;
use actix_web::middleware::Logger;

use crate::handlers::{DISPLAY_NAME_HEADER, USER_HEADER};

// Returns the access logger for the Luma API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS for app clients served from other origins (e.g., the web build).
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
        .allowed_headers(vec![USER_HEADER, DISPLAY_NAME_HEADER, "Content-Type"])
        .max_age(3600)
}
