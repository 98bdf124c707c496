//! HTTP backend for Solana payment links.
//!
//! Stores payment requests, renders their links and QR codes, checks the
//! ledger for matching transfers and applies payment status webhooks.
//!
//! # Modules
//!
//! - [`config`] - Server configuration with environment variable expansion
//! - [`error`] - API error responses
//! - [`handlers`] - Axum route handlers and router builder
//! - [`rate_limit`] - Per-IP request budget
//! - [`store`] - Payment request persistence
//! - [`sweeper`] - Periodic expiry of unpaid requests
//! - [`util`] - Shutdown signal handling

pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod store;
pub mod sweeper;
pub mod util;

use std::sync::Arc;

use axum::http::Method;
use axum::{Json, Router};
use tower_http::cors;
use tower_http::trace::TraceLayer;

pub use handlers::{AppState, SharedState, payment_router};
use rate_limit::IpRateLimiter;

/// Builds the complete application: payment routes, `/health`, per-IP rate
/// limiting, CORS and request tracing.
pub fn build_app(state: SharedState, limiter: Arc<IpRateLimiter>) -> Router {
    Router::new()
        .merge(payment_router(state))
        .route("/health", axum::routing::get(health))
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit::limit_by_ip,
        ))
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::state_with;
    use crate::rate_limit::RateLimitConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn health_request() -> Request<Body> {
        Request::get("/health").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = state_with(Arc::default());
        let limiter = Arc::new(IpRateLimiter::new(&RateLimitConfig::default()));
        let response = build_app(state, limiter)
            .oneshot(health_request())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_all_routes() {
        let (state, _) = state_with(Arc::default());
        let limiter = Arc::new(IpRateLimiter::new(&RateLimitConfig {
            window_ms: 60_000,
            max: 2,
        }));
        let app = build_app(state, limiter);

        for _ in 0..2 {
            let response = app.clone().oneshot(health_request()).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.oneshot(health_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Too many requests, please try again later");
    }
}
