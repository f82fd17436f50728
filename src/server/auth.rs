use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::AppState;

/// Who sent a request, as far as this service can tell.
///
/// Tokens are never verified here and requests are never rejected; the
/// principal is attached to the request for handlers and logs only.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// No bearer token, or inspection disabled
    Anonymous,
    /// An unverified bearer token
    Bearer(String),
}

impl Principal {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Principal::Bearer(token.to_string()))
            .unwrap_or(Principal::Anonymous)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Principal::Anonymous => "anonymous",
            Principal::Bearer(_) => "bearer",
        }
    }
}

pub async fn inspect_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = if state.allow_unauth {
        Principal::Anonymous
    } else {
        Principal::from_headers(request.headers())
    };
    debug!(principal = principal.label(), path = %request.uri().path(), "request");
    request.extensions_mut().insert(principal);
    next.run(request).await
}
