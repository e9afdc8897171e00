//! Call-control webhook.
//!
//! The telephony provider POSTs here when a call comes in; the response is
//! TwiML instructing it to open a media stream back to this bridge. The
//! stream URL scheme follows the transport the request arrived over: `wss`
//! when the original request was HTTPS (directly, or as reported by a
//! reverse proxy's `X-Forwarded-Proto`), `ws` otherwise.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use tracing::debug;

use crate::state::AppState;

pub async fn voice_incoming(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");

    // Behind a reverse proxy the forwarded header tells us the original
    // scheme; served directly, our own TLS mode does.
    let own_proto = if state.config.is_tls_enabled() {
        "https"
    } else {
        "http"
    };
    let forwarded_proto = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or(own_proto);
    let scheme = if forwarded_proto == "https" { "wss" } else { "ws" };

    debug!(host, scheme, "answering call-control webhook");

    let twiml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Connect>
        <Stream url="{scheme}://{host}/voice/stream" />
    </Connect>
</Response>"#
    );

    ([(header::CONTENT_TYPE, "application/xml")], twiml)
}
