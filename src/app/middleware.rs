use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use super::state::AppState;
use crate::logging::correlation::{self, CorrelationId};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Run the rest of the request inside a correlation scope.
///
/// A well-formed inbound `X-Request-ID` is reused; anything else gets a
/// fresh token. The token is echoed back in the response.
pub async fn correlation_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| correlation::is_valid(v))
        .map(CorrelationId::new)
        .unwrap_or_else(|| CorrelationId::generate(state.correlation_id_length));

    let mut response = correlation::scope(id.clone(), next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
