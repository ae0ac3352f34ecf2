//! HTTP route handlers for the ROC node.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use roc_common::HandoverError;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod handover;
mod health;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))

        // Handover session
        .route("/handover", get(handover::get_session))
        .route("/handover/ready", post(handover::assert_ready))
        .route("/handover/abort", post(handover::assert_abort))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Handler error carrying the session's error type
pub struct ApiError(HandoverError);

impl From<HandoverError> for ApiError {
    fn from(e: HandoverError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::actor::SessionActor;
    use crate::config::AppConfig;
    use crate::testing::ChannelTransport;
    use crate::timers::TokioTimers;
    use axum::body::Body;
    use axum::http::Request;
    use handover_core::{HandoverSession, OutboundMessage, SessionConfig};
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::{broadcast, mpsc};

    pub struct TestNode {
        pub router: Router,
        pub shutdown: broadcast::Sender<()>,
        pub sent: mpsc::UnboundedReceiver<OutboundMessage>,
        pub publisher: Arc<AtomicBool>,
        pub subscriber: Arc<AtomicBool>,
    }

    impl TestNode {
        /// Stop the session actor behind the router
        pub fn stop(&self) {
            let _ = self.shutdown.send(());
        }
    }

    /// Router backed by a live session actor for `self_id`
    pub fn node(self_id: &str, connected: bool) -> TestNode {
        let (inbox, rx) = mpsc::channel(16);
        let (transport, sent) = ChannelTransport::new();
        let config = SessionConfig {
            self_id: self_id.into(),
            ..Default::default()
        };
        let session =
            HandoverSession::new(config, transport, TokioTimers::new(inbox.clone())).unwrap();
        let (actor, snapshots) = SessionActor::new(session, rx);
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(actor.run(shutdown_rx));

        let publisher = Arc::new(AtomicBool::new(connected));
        let subscriber = Arc::new(AtomicBool::new(connected));
        let state = AppState::new(
            AppConfig::default(),
            inbox,
            snapshots,
            publisher.clone(),
            subscriber.clone(),
        );
        TestNode {
            router: create_router(state),
            shutdown,
            sent,
            publisher,
            subscriber,
        }
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    pub fn post(uri: &str) -> Request<Body> {
        Request::post(uri).body(Body::empty()).unwrap()
    }

    pub async fn json(body: Body) -> serde_json::Value {
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
