//! Hume EVI WebSocket client.
//!
//! One connection per bridged call. The connection performs the audio-format
//! negotiation during `connect`, then splits into sink/stream halves owned
//! by the session's writer task and receive loop.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info};

use super::config::EviConfig;
use super::messages::{EviClientMessage, SessionSettings, serialize_client_message};
use super::{EviError, EviResult};

/// The underlying WebSocket stream type.
pub type EviSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of an EVI connection.
pub type EviSink = SplitSink<EviSocket, Message>;

/// Read half of an EVI connection.
pub type EviStream = SplitStream<EviSocket>;

/// An established, negotiated EVI connection.
pub struct EviConnection {
    socket: EviSocket,
}

impl EviConnection {
    /// Connect to EVI and negotiate the audio format.
    ///
    /// The `session_settings` message is sent before this returns, so by the
    /// time a caller owns the connection the service already expects
    /// linear16 at 48 kHz; no forwarded audio can outrun the negotiation.
    pub async fn connect(config: &EviConfig) -> EviResult<Self> {
        config.validate()?;
        let request = config.build_request()?;

        debug!("connecting to EVI: {}", config.websocket_url);
        let connect_timeout = Duration::from_secs(config.connect_timeout_seconds);
        let (mut socket, response) = match timeout(connect_timeout, connect_async(request)).await {
            Ok(Ok((socket, response))) => (socket, response),
            Ok(Err(e)) => {
                return Err(EviError::ConnectionFailed(format!(
                    "WebSocket connection failed: {e}"
                )));
            }
            Err(_) => return Err(EviError::Timeout(config.connect_timeout_seconds)),
        };
        info!("connected to EVI (status: {})", response.status());

        let settings = EviClientMessage::SessionSettings(SessionSettings::linear16());
        let json = serialize_client_message(&settings)?;
        socket
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| EviError::WebSocket(format!("failed to send session settings: {e}")))?;
        debug!("sent audio session settings");

        Ok(Self { socket })
    }

    /// Open a connection and immediately close it again.
    ///
    /// Used by the diagnostic endpoint to verify reachability and
    /// credentials without starting a session.
    pub async fn probe(config: &EviConfig) -> EviResult<()> {
        config.validate()?;
        let request = config.build_request()?;

        let connect_timeout = Duration::from_secs(config.connect_timeout_seconds);
        match timeout(connect_timeout, connect_async(request)).await {
            Ok(Ok((mut socket, _))) => {
                let _ = socket.close(None).await;
                Ok(())
            }
            Ok(Err(e)) => Err(EviError::ConnectionFailed(format!(
                "WebSocket connection failed: {e}"
            ))),
            Err(_) => Err(EviError::Timeout(config.connect_timeout_seconds)),
        }
    }

    /// Split into write and read halves for the session's two loops.
    pub fn into_split(self) -> (EviSink, EviStream) {
        self.socket.split()
    }
}
