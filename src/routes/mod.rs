//! Router assembly: HTTP endpoints, CORS, body limit, panic capture and HTTP tracing.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, request::Parts, HeaderName, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};
use url::Url;

use crate::error::AppError;
use crate::state::AppState;

pub mod http;
pub mod rate_limit;

pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Browser extensions are always allowed. Other origins must equal an
/// allow-list entry, given either as `scheme://host[:port]` or `host[:port]`.
/// Requests without an Origin never reach this check.
pub fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
    if origin.starts_with("chrome-extension://") {
        return true;
    }
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let full = format!("{}://{}", url.scheme(), authority);
    allowed
        .iter()
        .map(|a| a.trim().trim_end_matches('/'))
        .any(|a| a.eq_ignore_ascii_case(&full) || a.eq_ignore_ascii_case(&authority))
}

fn cors_layer(allowed: Vec<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            let ok = origin.to_str().map(|o| origin_allowed(o, &allowed)).unwrap_or(false);
            if !ok {
                warn!(target: "student_buddy", origin = ?origin, "Blocked CORS request");
            }
            ok
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".into());
    AppError::Internal(detail).into_response()
}

/// Hardening headers set on every response unless a handler already set them.
pub const SECURITY_HEADERS: [(&str, &str); 7] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-dns-prefetch-control", "off"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("cross-origin-opener-policy", "same-origin"),
    ("content-security-policy", "default-src 'self'; frame-ancestors 'self'; object-src 'none'"),
];

fn security_header(name: &'static str, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(HeaderName::from_static(name), HeaderValue::from_static(value))
}

/// Build the application router with:
/// - `/api/v1/analyze-question` (POST analysis, GET usage docs)
/// - `/health` liveness and `/health/model` upstream probe
/// - JSON 404 fallback listing valid endpoints
/// - CORS limited to extensions + ALLOWED_ORIGINS
/// - per-client rate limit (429 envelope) and security response headers
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let allowed = state.allowed_origins.clone();
    let [nosniff, frame, dns, referrer, hsts, coop, csp] = SECURITY_HEADERS.map(|(n, v)| security_header(n, v));

    Router::new()
        .route("/", get(http::http_root))
        .route("/health", get(http::http_health))
        .route("/health/model", get(http::http_model_health))
        .route(
            "/api/v1/analyze-question",
            get(http::http_get_analyze_docs).post(http::http_post_analyze),
        )
        .fallback(http::http_not_found)
        .layer(middleware::from_fn_with_state(Arc::clone(&state), rate_limit::rate_limit_middleware))
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(nosniff)
                .layer(frame)
                .layer(dns)
                .layer(referrer)
                .layer(hsts)
                .layer(coop)
                .layer(csp)
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(cors_layer(allowed)),
        )
}
