//! HTTP front door: request ids, tracing, timeouts, CORS and body limits
//! wrapped around the module routes.

use std::time::Duration;

use axum::http::{HeaderName, Request};
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{body::Body, middleware::Next, response::Response, Json, Router};
use serde_json::{json, Value};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::field::Empty;
use tracing::Span;

const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct XRequestId(pub String);

pub fn header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

/// Middleware that stores request_id in Request.extensions and records it in the current span
pub async fn push_req_id_to_extensions(mut req: Request<Body>, next: Next) -> Response {
    let rid = request_id_of(&req).to_owned();

    req.extensions_mut().insert(XRequestId(rid.clone()));
    Span::current().record("request_id", tracing::field::display(&rid));

    next.run(req).await
}

fn request_id_of<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a")
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Settings for the outer middleware stack.
#[derive(Debug, Clone, Copy)]
pub struct IngressOptions {
    pub timeout: Duration,
    pub cors_enabled: bool,
}

impl IngressOptions {
    pub fn from_server(cfg: &runtime::ServerConfig) -> Self {
        Self {
            timeout: cfg.request_timeout(),
            cors_enabled: cfg.cors_enabled,
        }
    }
}

impl Default for IngressOptions {
    fn default() -> Self {
        Self {
            timeout: runtime::DEFAULT_REQUEST_TIMEOUT,
            cors_enabled: false,
        }
    }
}

/// Add `/health` to `api` and wrap everything in the middleware stack.
///
/// Order, outermost first: PropagateRequestId -> SetRequestId ->
/// push_req_id_to_extensions -> Trace -> Timeout -> CORS -> BodyLimit.
/// `Router::layer` wraps previously added layers, so they are added innermost first.
pub fn build_router(api: Router, opts: IngressOptions) -> Router {
    let x_request_id = header();
    let mut router = api.route("/health", get(health_check));

    router = router.layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));

    if opts.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }

    router = router.layer(TimeoutLayer::new(opts.timeout));

    router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri().path(),
                    version = ?req.version(),
                    module = "clinic_schedule",
                    request_id = %request_id_of(req),
                    status = Empty,
                    latency_ms = Empty
                )
            })
            .on_response(|res: &Response, latency: Duration, span: &Span| {
                span.record("status", res.status().as_u16());
                span.record("latency_ms", latency.as_millis() as u64);
                tracing::debug!("request finished");
            }),
    );

    router = router.layer(from_fn(push_req_id_to_extensions));
    router = router.layer(SetRequestIdLayer::new(x_request_id.clone(), MakeReqId));
    router.layer(PropagateRequestIdLayer::new(x_request_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_served_with_generated_request_id() {
        let router = build_router(Router::new(), IngressOptions::default());

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let rid = response.headers().get("x-request-id").unwrap();
        assert!(!rid.to_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn incoming_request_id_is_propagated() {
        let router = build_router(Router::new(), IngressOptions::default());

        let response = router
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-123");
    }

    #[tokio::test]
    async fn request_id_reaches_handlers() {
        let api = Router::new().route(
            "/echo",
            get(|axum::Extension(rid): axum::Extension<XRequestId>| async move { rid.0 }),
        );
        let router = build_router(api, IngressOptions::default());

        let response = router
            .oneshot(
                Request::get("/echo")
                    .header("x-request-id", "abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"abc");
    }

    #[test]
    fn options_follow_server_config() {
        let opts = IngressOptions::from_server(&runtime::ServerConfig::default());
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert!(!opts.cors_enabled);

        let cfg = runtime::ServerConfig {
            timeout_sec: 2,
            cors_enabled: true,
            ..Default::default()
        };
        let opts = IngressOptions::from_server(&cfg);
        assert_eq!(opts.timeout, Duration::from_secs(2));
        assert!(opts.cors_enabled);
    }

    #[tokio::test]
    async fn cors_preflight_is_answered_when_enabled() {
        let opts = IngressOptions {
            cors_enabled: true,
            ..Default::default()
        };
        let router = build_router(Router::new(), opts);

        let response = router
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/health")
                    .header("origin", "http://localhost:5173")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
