//! Wake probe handler.

use axum::extract::State;
use axum::Json;
use vtx_models::WakeResponse;

use crate::state::AppState;

/// `GET /wake`. Always 200; an unreachable worker is reported as `asleep`.
pub async fn wake(State(state): State<AppState>) -> Json<WakeResponse> {
    Json(WakeResponse {
        status: state.wake.probe().await,
    })
}
