//! Hume EVI connection configuration.

use http::HeaderValue;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use zeroize::Zeroize;

use super::messages::{EVI_API_KEY_HEADER, EVI_WEBSOCKET_URL};
use super::{EviError, EviResult};

/// Default connection timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Configuration for a Hume EVI connection.
///
/// The config id selects the EVI behavior configuration (prompt, language
/// model, voice) created in the Hume dashboard; it is fixed for the lifetime
/// of a session. The API key travels in a request header, never in the URL.
#[derive(Debug, Clone)]
pub struct EviConfig {
    /// API key for Hume AI.
    pub api_key: String,

    /// EVI behavior configuration id. If absent, Hume's defaults apply.
    pub config_id: Option<String>,

    /// WebSocket URL (defaults to Hume's production endpoint).
    pub websocket_url: String,

    /// Connection timeout in seconds.
    pub connect_timeout_seconds: u64,
}

impl Default for EviConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            config_id: None,
            websocket_url: EVI_WEBSOCKET_URL.to_string(),
            connect_timeout_seconds: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Clear the API key from memory when the config is dropped.
impl Drop for EviConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

impl EviConfig {
    /// Create a new configuration with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.api_key = api_key.into();
        config
    }

    /// Set the behavior configuration id.
    pub fn with_config_id(mut self, config_id: impl Into<String>) -> Self {
        self.config_id = Some(config_id.into());
        self
    }

    /// Override the WebSocket endpoint.
    pub fn with_websocket_url(mut self, url: impl Into<String>) -> Self {
        self.websocket_url = url.into();
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout_seconds = seconds;
        self
    }

    /// Build the WebSocket URL with query parameters.
    pub fn build_websocket_url(&self) -> String {
        let mut url = self.websocket_url.clone();

        // URL encode helper
        fn encode(s: &str) -> String {
            url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
        }

        if let Some(ref config_id) = self.config_id {
            url.push('?');
            url.push_str(&format!("config_id={}", encode(config_id)));
        }

        url
    }

    /// Build the handshake request: URL plus the API-key header.
    pub fn build_request(&self) -> EviResult<http::Request<()>> {
        let url = self.build_websocket_url();
        let mut request = url
            .into_client_request()
            .map_err(|e| EviError::InvalidConfiguration(format!("invalid endpoint URL: {e}")))?;

        let key = HeaderValue::from_str(&self.api_key).map_err(|_| {
            EviError::InvalidConfiguration("API key contains invalid header characters".to_string())
        })?;
        request.headers_mut().insert(EVI_API_KEY_HEADER, key);

        Ok(request)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> EviResult<()> {
        if self.api_key.is_empty() {
            return Err(EviError::InvalidConfiguration(
                "API key is required".to_string(),
            ));
        }

        if self.connect_timeout_seconds == 0 {
            return Err(EviError::InvalidConfiguration(
                "connect timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
