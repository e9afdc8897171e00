//! The per-call bridge session.
//!
//! A session owns both sockets for the lifetime of one phone call and runs
//! two concurrent receive loops: the telephony loop (on the calling task)
//! and the EVI loop (spawned). Each socket's write half lives in its own
//! writer task fed by an mpsc channel, so every frame is sent from exactly
//! one place and each socket is closed exactly once.
//!
//! ```text
//!  telephony socket ──► telephony loop ──uplink──► EVI writer ──► EVI socket
//!  EVI socket ──► EVI loop ──downlink──► telephony writer ──► telephony socket
//! ```
//!
//! Termination is coordinated through a shared [`CancellationToken`]: the
//! first loop to finish (stop event, socket close/error, idle window
//! exceeded) cancels the token, the other loop observes it and exits, and
//! the teardown path in [`BridgeSession::run`] closes both sockets.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message as WsMessage, WebSocket};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::select;
use tokio::sync::{RwLock, mpsc};
use tokio_tungstenite::tungstenite::Message as EviMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audio::{DownlinkTranscoder, UplinkTranscoder};
use crate::evi::client::{EviConnection, EviSink, EviStream};
use crate::evi::messages::{
    AudioInput, EviClientMessage, EviServerMessage, deserialize_server_message,
    serialize_client_message,
};
use crate::twilio::messages::{OutboundMedia, TwilioInbound, TwilioOutbound};

/// Channel buffer size for the writer tasks.
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Identifiers assigned by the telephony provider at stream start.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub stream_sid: String,
    pub call_sid: String,
}

/// Protocol state of the telephony leg.
#[derive(Debug)]
enum CallState {
    /// Socket open, no `start` event yet. Outbound audio has nowhere to go.
    AwaitingStart,
    /// Stream identifiers known; audio flows in both directions.
    Streaming(StreamInfo),
    /// Terminal. Entered on `stop`; the loop exits right after.
    Stopped,
}

/// Frames routed to the telephony writer task.
enum TelephonyRoute {
    Outbound(TwilioOutbound),
    Close,
}

/// Frames routed to the EVI writer task.
enum EviRoute {
    Message(EviClientMessage),
    Pong(Bytes),
    Close,
}

/// One bridged phone call, from telephony accept to termination.
pub struct BridgeSession {
    id: Uuid,
    telephony: WebSocket,
    evi: EviConnection,
    poll_interval: Duration,
    max_idle: Duration,
}

impl BridgeSession {
    pub fn new(
        telephony: WebSocket,
        evi: EviConnection,
        poll_interval: Duration,
        max_idle: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            telephony,
            evi,
            poll_interval,
            max_idle,
        }
    }

    /// Run the bridge until either leg terminates, then tear both down.
    pub async fn run(self) {
        let session_id = self.id;
        info!(%session_id, "bridge session started");

        let (tele_sink, tele_stream) = self.telephony.split();
        let (evi_sink, evi_stream) = self.evi.into_split();

        let (tele_tx, tele_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (evi_tx, evi_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let tele_writer = tokio::spawn(telephony_writer(tele_sink, tele_rx));
        let evi_writer = tokio::spawn(evi_writer_task(evi_sink, evi_rx));

        // Stream identifiers land here when the `start` event arrives; the
        // EVI loop reads them to address outbound frames.
        let stream_info: Arc<RwLock<Option<StreamInfo>>> = Arc::new(RwLock::new(None));
        let cancel = CancellationToken::new();

        let evi_task = tokio::spawn(evi_receive_loop(
            evi_stream,
            tele_tx.clone(),
            evi_tx.clone(),
            stream_info.clone(),
            cancel.clone(),
            session_id,
        ));

        telephony_receive_loop(
            tele_stream,
            evi_tx.clone(),
            stream_info,
            cancel.clone(),
            self.poll_interval,
            self.max_idle,
            session_id,
        )
        .await;

        // Teardown. Runs on every exit path: stop the EVI loop promptly
        // (it may be blocked on a socket that is still nominally open),
        // then close each socket exactly once through its writer.
        cancel.cancel();
        evi_task.abort();
        let _ = evi_tx.send(EviRoute::Close).await;
        let _ = tele_tx.send(TelephonyRoute::Close).await;
        let _ = evi_writer.await;
        let _ = tele_writer.await;

        info!(%session_id, "bridge session terminated");
    }
}

/// Writer task owning the telephony socket's write half.
async fn telephony_writer(
    mut sink: SplitSink<WebSocket, WsMessage>,
    mut rx: mpsc::Receiver<TelephonyRoute>,
) {
    while let Some(route) = rx.recv().await {
        match route {
            TelephonyRoute::Outbound(frame) => {
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("failed to serialize telephony frame: {e}");
                        continue;
                    }
                };
                if let Err(e) = sink.send(WsMessage::Text(json.into())).await {
                    debug!("telephony send failed: {e}");
                    break;
                }
            }
            TelephonyRoute::Close => {
                let _ = sink.send(WsMessage::Close(None)).await;
                break;
            }
        }
    }
}

/// Writer task owning the EVI socket's write half.
async fn evi_writer_task(mut sink: EviSink, mut rx: mpsc::Receiver<EviRoute>) {
    while let Some(route) = rx.recv().await {
        match route {
            EviRoute::Message(msg) => {
                let json = match serialize_client_message(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("failed to serialize EVI message: {e}");
                        continue;
                    }
                };
                if let Err(e) = sink.send(EviMessage::Text(json.into())).await {
                    debug!("EVI send failed: {e}");
                    break;
                }
            }
            EviRoute::Pong(data) => {
                let _ = sink.send(EviMessage::Pong(data)).await;
            }
            EviRoute::Close => {
                let _ = sink.send(EviMessage::Close(None)).await;
                break;
            }
        }
    }
}

/// Telephony receive loop. Runs on the session's own task and drives the
/// call state machine; returning from here triggers session teardown.
async fn telephony_receive_loop(
    mut stream: SplitStream<WebSocket>,
    evi_tx: mpsc::Sender<EviRoute>,
    stream_info: Arc<RwLock<Option<StreamInfo>>>,
    cancel: CancellationToken,
    poll_interval: Duration,
    max_idle: Duration,
    session_id: Uuid,
) {
    let mut call = CallState::AwaitingStart;
    let mut uplink = UplinkTranscoder::new();
    let mut last_activity = Instant::now();

    loop {
        select! {
            _ = cancel.cancelled() => {
                debug!(%session_id, "telephony loop cancelled");
                break;
            }
            msg = stream.next() => match msg {
                Some(Ok(WsMessage::Text(text))) => {
                    last_activity = Instant::now();
                    let proceed = handle_telephony_message(
                        text.as_str(),
                        &mut call,
                        &mut uplink,
                        &evi_tx,
                        &stream_info,
                        session_id,
                    )
                    .await;
                    if !proceed {
                        break;
                    }
                }
                Some(Ok(WsMessage::Close(_))) => {
                    info!(%session_id, "telephony socket closed by provider");
                    break;
                }
                Some(Ok(_)) => {
                    // Ping/pong/binary frames still count as liveness.
                    last_activity = Instant::now();
                }
                Some(Err(e)) => {
                    warn!(%session_id, "telephony websocket error: {e}");
                    break;
                }
                None => {
                    info!(%session_id, "telephony stream ended");
                    break;
                }
            },
            _ = tokio::time::sleep(poll_interval) => {
                if last_activity.elapsed() >= max_idle {
                    warn!(
                        %session_id,
                        idle_secs = last_activity.elapsed().as_secs(),
                        "telephony stream idle past the limit, terminating"
                    );
                    break;
                }
                // Quiet but within the window; re-enter the wait.
            }
        }
    }

    cancel.cancel();
}

/// Handle one telephony text frame. Returns false when the session should end.
async fn handle_telephony_message(
    text: &str,
    call: &mut CallState,
    uplink: &mut UplinkTranscoder,
    evi_tx: &mpsc::Sender<EviRoute>,
    stream_info: &Arc<RwLock<Option<StreamInfo>>>,
    session_id: Uuid,
) -> bool {
    let event: TwilioInbound = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(%session_id, "skipping unparseable telephony message: {e}");
            return true;
        }
    };

    match event {
        TwilioInbound::Start(start) => {
            info!(
                %session_id,
                call_sid = %start.start.call_sid,
                stream_sid = %start.stream_sid,
                "call started"
            );
            let info = StreamInfo {
                stream_sid: start.stream_sid,
                call_sid: start.start.call_sid,
            };
            *stream_info.write().await = Some(info.clone());
            *call = CallState::Streaming(info);
            true
        }
        TwilioInbound::Media(media) => {
            let mulaw = match media.media.decode_audio() {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(%session_id, "dropping media frame with invalid payload: {e}");
                    return true;
                }
            };
            let pcm = uplink.process(&mulaw);
            let input = EviClientMessage::AudioInput(AudioInput::from_pcm(&pcm));
            if evi_tx.send(EviRoute::Message(input)).await.is_err() {
                warn!(%session_id, "EVI writer gone, terminating");
                return false;
            }
            true
        }
        TwilioInbound::Stop => {
            if let CallState::Streaming(info) = &*call {
                info!(%session_id, call_sid = %info.call_sid, "call ended");
            } else {
                info!(%session_id, "stream stopped before start");
            }
            *call = CallState::Stopped;
            false
        }
        TwilioInbound::Unknown => {
            debug!(%session_id, "ignoring unrecognized telephony event");
            true
        }
    }
}

/// EVI receive loop. Spawned as a task; exiting cancels the session.
async fn evi_receive_loop(
    mut stream: EviStream,
    tele_tx: mpsc::Sender<TelephonyRoute>,
    evi_tx: mpsc::Sender<EviRoute>,
    stream_info: Arc<RwLock<Option<StreamInfo>>>,
    cancel: CancellationToken,
    session_id: Uuid,
) {
    let mut downlink = DownlinkTranscoder::new();

    loop {
        select! {
            _ = cancel.cancelled() => {
                debug!(%session_id, "EVI loop cancelled");
                break;
            }
            msg = stream.next() => match msg {
                Some(Ok(EviMessage::Text(text))) => {
                    handle_evi_message(
                        text.as_str(),
                        &mut downlink,
                        &tele_tx,
                        &stream_info,
                        session_id,
                    )
                    .await;
                }
                Some(Ok(EviMessage::Ping(data))) => {
                    let _ = evi_tx.send(EviRoute::Pong(data)).await;
                }
                Some(Ok(EviMessage::Close(frame))) => {
                    info!(%session_id, ?frame, "EVI closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!(%session_id, "EVI websocket error: {e}");
                    break;
                }
                None => {
                    info!(%session_id, "EVI stream ended");
                    break;
                }
            },
        }
    }

    cancel.cancel();
}

/// Handle one EVI server message. All failures are local: log and skip.
async fn handle_evi_message(
    text: &str,
    downlink: &mut DownlinkTranscoder,
    tele_tx: &mpsc::Sender<TelephonyRoute>,
    stream_info: &Arc<RwLock<Option<StreamInfo>>>,
    session_id: Uuid,
) {
    let msg = match deserialize_server_message(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(%session_id, "skipping unparseable EVI message: {e}");
            return;
        }
    };

    match msg {
        EviServerMessage::AudioOutput(output) => {
            let pcm = match output.decode_audio() {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(%session_id, "dropping audio frame with invalid payload: {e}");
                    return;
                }
            };
            let mulaw = match downlink.process(&pcm) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(%session_id, "dropping untranscodable audio frame: {e}");
                    return;
                }
            };

            // An outbound frame cannot be addressed before `start` arrives.
            let Some(info) = stream_info.read().await.clone() else {
                warn!(%session_id, "dropping audio frame: stream id not yet known");
                return;
            };

            let frame = TwilioOutbound::Media(OutboundMedia::new(info.stream_sid, &mulaw));
            let _ = tele_tx.send(TelephonyRoute::Outbound(frame)).await;
        }
        EviServerMessage::UserMessage(user) => {
            info!(%session_id, "caller: {}", user.message.content);
        }
        EviServerMessage::AssistantMessage(asst) => {
            info!(%session_id, "assistant: {}", asst.message.content);
        }
        EviServerMessage::UserInterruption(_) => {
            info!(%session_id, "caller interrupted the assistant");
        }
        EviServerMessage::Error(err) => {
            // Informational: the session ends only if the socket itself does.
            error!(%session_id, code = ?err.code, "EVI error: {}", err.message);
        }
        EviServerMessage::Unknown => {
            debug!(%session_id, "ignoring unrecognized EVI message");
        }
    }
}
