//! Middleware for request logging and cross-origin policy.

use actix_cors::Cors;
use actix_web::middleware::Logger;

// Returns the standard request logger:
// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

// CORS for the JSON endpoints; the comment/reaction widgets may be
// embedded on other origins.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .max_age(3600)
}
