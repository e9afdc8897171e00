//! HTTP-facing error type.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::evi::EviError;

/// Errors surfaced through HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// The AI voice service could not be reached or rejected the connection.
    /// Returned before the telephony socket is accepted, so no call audio is
    /// ever exchanged.
    #[error("voice service unavailable: {0}")]
    VoiceServiceUnavailable(#[source] EviError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::VoiceServiceUnavailable(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_failure_maps_to_bad_gateway() {
        let error = AppError::VoiceServiceUnavailable(EviError::ConnectionFailed(
            "connection refused".to_string(),
        ));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
