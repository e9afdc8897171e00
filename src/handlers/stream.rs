//! Telephony media stream WebSocket handler.
//!
//! This is the connection orchestrator: for each inbound media stream it
//! establishes the EVI connection *first*, and only then accepts the
//! telephony WebSocket. A failed EVI connect is answered with `502` and the
//! telephony socket is never upgraded, so no call audio ever arrives with
//! nowhere to go.

use std::sync::Arc;

use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use tracing::{error, info};

use crate::bridge::BridgeSession;
use crate::errors::AppError;
use crate::evi::EviConnection;
use crate::state::AppState;

/// Maximum WebSocket frame size (1 MB). Media frames are ~20ms of mu-law
/// audio plus envelope, far below this.
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB).
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Media stream WebSocket handler.
///
/// # Arguments
/// * `state` - Application state containing configuration
/// * `ws` - The WebSocket upgrade request from Axum
///
/// # Returns
/// * `Response` - the upgrade response, or `502` if EVI is unreachable
pub async fn stream_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let evi_config = state.config.evi_config();

    // AI side first; abort before accepting the telephony socket on failure.
    let evi = EviConnection::connect(&evi_config).await.map_err(|e| {
        error!("refusing media stream, EVI connect failed: {e}");
        AppError::VoiceServiceUnavailable(e)
    })?;

    info!("media stream upgrade accepted");
    let poll_interval = state.config.poll_interval();
    let max_idle = state.config.max_idle();

    Ok(ws
        .max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| {
            BridgeSession::new(socket, evi, poll_interval, max_idle).run()
        }))
}
