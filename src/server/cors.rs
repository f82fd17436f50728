use axum::http::{request::Parts, HeaderValue};
use once_cell::sync::Lazy;
use regex::Regex;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

static LOCAL_DEV_ORIGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^http://(localhost|127\.0\.0\.1):\d+$").unwrap());

/// Any local dev server, on any port.
pub fn is_local_dev_origin(origin: &str) -> bool {
    LOCAL_DEV_ORIGIN.is_match(origin)
}

/// CORS policy: the configured origins plus any local dev origin, with
/// credentials. Methods and headers are mirrored from the preflight, since
/// wildcards are not allowed alongside credentials.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                allowed.contains(origin)
                    || origin.to_str().map(is_local_dev_origin).unwrap_or(false)
            },
        ))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
