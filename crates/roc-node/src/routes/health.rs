//! Health check endpoints.

use axum::{Json, extract::State, http::StatusCode};
use roc_common::Phase;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    roc_id: Option<String>,
}

/// Basic health check (is the server running?)
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        roc_id: state.config.roc_id.clone(),
    })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    publisher: bool,
    subscriber: bool,
    phase: Phase,
}

/// Readiness check (can the session both publish and hear the other side?)
pub async fn ready_check(
    State(state): State<AppState>,
) -> Result<Json<ReadyResponse>, StatusCode> {
    let publisher = state.publisher_ready();
    let subscriber = state.subscriber_ready();

    if !(publisher && subscriber) {
        tracing::debug!(publisher, subscriber, "Not ready");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(ReadyResponse {
        status: "ready",
        publisher,
        subscriber,
        phase: state.snapshot().phase,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{get, json, node};
    use axum::http::StatusCode;
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_is_always_ok() {
        let node = node("ROC_1", false);
        let response = node.router.clone().oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response.into_body()).await;
        assert_eq!(body["status"], "ok");
        node.stop();
    }

    #[tokio::test]
    async fn test_ready_requires_both_links() {
        let node = node("ROC_1", false);
        let response = node.router.clone().oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        node.publisher.store(true, Ordering::Release);
        node.subscriber.store(true, Ordering::Release);
        let response = node.router.clone().oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response.into_body()).await;
        assert_eq!(body["phase"], "pending");
        assert_eq!(body["subscriber"], true);
        node.stop();
    }

    #[tokio::test]
    async fn test_ready_fails_when_subscription_is_lost() {
        let node = node("ROC_2", true);
        let response = node.router.clone().oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        node.subscriber.store(false, Ordering::Release);
        let response = node.router.clone().oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        node.stop();
    }
}
