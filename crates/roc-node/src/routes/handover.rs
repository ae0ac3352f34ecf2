//! Handover session endpoints.
//!
//! Operator decisions go through the session actor; the response is the
//! snapshot taken right after the decision was applied.

use axum::{Json, extract::State};
use handover_core::SessionSnapshot;

use super::ApiError;
use crate::actor::OperatorCommand;
use crate::state::AppState;

/// Current session state
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.snapshot())
}

/// Local operator declares READY
pub async fn assert_ready(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    tracing::info!("Operator asserted READY");
    state.submit(OperatorCommand::Ready).await?;
    Ok(Json(state.snapshot()))
}

/// Local operator aborts the handover
pub async fn assert_abort(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    tracing::warn!("Operator requested ABORT");
    state.submit(OperatorCommand::Abort).await?;
    Ok(Json(state.snapshot()))
}
