use axum::{
    Extension,
    extract::{MatchedPath, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::api::{ApiError, AppState};
use crate::models::CurrentUser;

static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// GET /metrics
/// Prometheus text exposition, admin only
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    if !caller.is_admin() {
        return Err(ApiError::forbidden(
            "Metrics are restricted to administrators",
        ));
    }

    let handle = state
        .prometheus_handle
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("Metrics are not enabled".to_string()))?;

    Ok(handle.render().into_response())
}

/// Wraps each request in a span, echoes or assigns `x-request-id`, and
/// records the request counter and latency histogram.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get(&REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= 64)
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    // Route template keeps metric label cardinality bounded.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |mp| mp.as_str().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        route = %route,
        user_id = tracing::field::Empty,
    );

    async move {
        let mut response = next.run(req).await;

        let status = response.status().as_u16();
        let elapsed = start.elapsed();

        let labels = [
            ("method", method),
            ("route", route),
            ("status", status.to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if status >= 500 {
            warn!(status, duration_ms, "Request failed");
        } else {
            info!(status, duration_ms, "Request finished");
        }

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID.clone(), value);
        }

        response
    }
    .instrument(span)
    .await
}

/// JSON-only API: nothing may be framed, sniffed or cached.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.insert("cache-control", HeaderValue::from_static("no-store"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}
