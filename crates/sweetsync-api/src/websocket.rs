//! Push channel: inventory notifications over a WebSocket with fixed-delay
//! reconnect.
//!
//! A single background task owns the connection lifecycle:
//! `Connecting → Open → Closed → (delay) → Connecting → …`. Decoded
//! notifications flow out through a bounded [`tokio::sync::mpsc`] channel;
//! the connection state is published on a [`tokio::sync::watch`] channel.
//! Cancelling the token ends the cycle for good.
//!
//! The transport sits behind the [`Connector`] trait so the loop can be
//! driven by scripted frame sequences.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sweetsync_api::websocket::{PushChannel, ReconnectConfig, WsConnector};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let ws_url = Url::parse("ws://127.0.0.1:8000/ws")?;
//! let connector = Arc::new(WsConnector::new(ws_url, None));
//! let (channel, mut notifications) =
//!     PushChannel::spawn(connector, ReconnectConfig::default(), CancellationToken::new());
//!
//! while let Some(msg) = notifications.recv().await {
//!     println!("{}", msg.kind());
//! }
//!
//! channel.shutdown();
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::stream::{BoxStream, Stream};
use futures_util::{FutureExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::models::PushMessage;

// ── Channel capacity ─────────────────────────────────────────────────

const NOTIFICATION_CHANNEL_CAPACITY: usize = 1024;

// ── Connector seam ───────────────────────────────────────────────────

/// One inbound frame from the push transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrame {
    /// A UTF-8 text frame carrying one JSON notification.
    Text(String),
    /// The peer closed the connection cleanly.
    Close,
}

/// Stream of frames for one connection. Ends (or yields `Close`) when the
/// connection drops.
pub type FrameStream = BoxStream<'static, Result<PushFrame, Error>>;

/// Opens one push connection per call.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> BoxFuture<'_, Result<FrameStream, Error>>;
}

/// Production connector backed by `tokio-tungstenite`.
///
/// When a bearer token is supplied it's sent as an `Authorization` header
/// on the upgrade request.
pub struct WsConnector {
    url: Url,
    bearer: Option<SecretString>,
}

impl WsConnector {
    pub fn new(url: Url, bearer: Option<SecretString>) -> Self {
        Self { url, bearer }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Connector for WsConnector {
    fn connect(&self) -> BoxFuture<'_, Result<FrameStream, Error>> {
        async move {
            tracing::info!(url = %self.url, "connecting push channel");

            let uri: tungstenite::http::Uri = self.url.as_str().parse().map_err(
                |e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()),
            )?;

            let mut request = ClientRequestBuilder::new(uri);
            if let Some(token) = &self.bearer {
                request =
                    request.with_header("Authorization", format!("Bearer {}", token.expose_secret()));
            }

            let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
                .await
                .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

            let frames = ws_stream.filter_map(|msg| async move { translate_message(msg) });
            Ok(frames.boxed())
        }
        .boxed()
    }
}

/// Map a raw tungstenite message onto a [`PushFrame`]. Control and binary
/// frames are skipped.
fn translate_message(
    msg: Result<tungstenite::Message, tungstenite::Error>,
) -> Option<Result<PushFrame, Error>> {
    match msg {
        Ok(tungstenite::Message::Text(text)) => Some(Ok(PushFrame::Text(text.as_str().to_owned()))),
        Ok(tungstenite::Message::Close(frame)) => match frame {
            Some(cf) if !matches!(cf.code, CloseCode::Normal | CloseCode::Away) => {
                Some(Err(Error::WebSocketClosed {
                    code: u16::from(cf.code),
                    reason: cf.reason.as_str().to_owned(),
                }))
            }
            _ => Some(Ok(PushFrame::Close)),
        },
        Ok(tungstenite::Message::Ping(_)) => {
            // tungstenite handles pong replies automatically
            tracing::trace!("push channel ping");
            None
        }
        Ok(_) => None,
        Err(e) => Some(Err(Error::WebSocketConnect(e.to_string()))),
    }
}

/// Derive the push endpoint from the API base URL:
/// `http(s)://host[:port]/…` → `ws(s)://host[:port]/ws`.
pub fn derive_ws_url(api_url: &Url) -> Result<Url, Error> {
    let scheme = match api_url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    let host = api_url
        .host_str()
        .ok_or_else(|| Error::WebSocketConnect(format!("no host in {api_url}")))?;
    let authority = match api_url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    Ok(Url::parse(&format!("{scheme}://{authority}/ws"))?)
}

// ── Connection state & reconnect policy ──────────────────────────────

/// Lifecycle of the push connection. Only the channel task writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    /// `retry_pending` is false only once the channel has been shut down.
    Closed { retry_pending: bool },
}

impl ChannelState {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed { retry_pending: false })
    }
}

/// Fixed delay between a close and the next connect attempt.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Default: 3s.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
        }
    }
}

// ── Notification stream ──────────────────────────────────────────────

/// Receiving side of the decoded notification feed. Yields `None` once the
/// channel task has exited.
pub struct NotificationStream {
    rx: mpsc::Receiver<PushMessage>,
}

impl NotificationStream {
    pub async fn recv(&mut self) -> Option<PushMessage> {
        self.rx.recv().await
    }
}

impl Stream for NotificationStream {
    type Item = PushMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<PushMessage>> {
        self.rx.poll_recv(cx)
    }
}

// ── PushChannel ──────────────────────────────────────────────────────

/// Handle to a running push channel.
///
/// Call [`shutdown`](Self::shutdown) to end the reconnect cycle, then
/// [`join`](Self::join) to wait for the task to exit.
pub struct PushChannel {
    state_rx: watch::Receiver<ChannelState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PushChannel {
    /// Spawn the connect/read/reconnect loop.
    ///
    /// Returns immediately; the first connection attempt happens on the
    /// background task.
    pub fn spawn(
        connector: Arc<dyn Connector>,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> (Self, NotificationStream) {
        let (notify_tx, notify_rx) = mpsc::channel(NOTIFICATION_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            channel_loop(connector, notify_tx, state_tx, reconnect, task_cancel).await;
        });

        (
            Self {
                state_rx,
                cancel,
                task,
            },
            NotificationStream { rx: notify_rx },
        )
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    pub fn current_state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Signal the background task to stop. No reconnect is scheduled after
    /// this, including one whose delay is already running.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for the background task to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "push channel task failed");
        }
    }
}

// ── Background reconnect loop ────────────────────────────────────────

/// Main loop: connect → read until close → wait the fixed delay → repeat.
async fn channel_loop(
    connector: Arc<dyn Connector>,
    notify_tx: mpsc::Sender<PushMessage>,
    state_tx: watch::Sender<ChannelState>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        state_tx.send_replace(ChannelState::Connecting);

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            outcome = connect_and_read(connector.as_ref(), &notify_tx, &state_tx, &cancel) => outcome,
        };

        match outcome {
            Ok(()) => tracing::info!(attempt, "push channel closed"),
            Err(e) => tracing::warn!(error = %e, attempt, "push channel dropped"),
        }

        if cancel.is_cancelled() {
            break;
        }
        if notify_tx.is_closed() {
            tracing::debug!("notification consumer gone, stopping push channel");
            break;
        }

        state_tx.send_replace(ChannelState::Closed { retry_pending: true });
        tracing::info!(
            delay_ms = u64::try_from(reconnect.delay.as_millis()).unwrap_or(u64::MAX),
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(reconnect.delay) => {}
        }
    }

    state_tx.send_replace(ChannelState::Closed {
        retry_pending: false,
    });
    tracing::debug!("push channel loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one connection and forward decoded notifications until it drops.
async fn connect_and_read(
    connector: &dyn Connector,
    notify_tx: &mpsc::Sender<PushMessage>,
    state_tx: &watch::Sender<ChannelState>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    let mut frames = connector.connect().await?;

    state_tx.send_replace(ChannelState::Open);
    tracing::info!("push channel open");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = frames.next() => match frame {
                Some(Ok(PushFrame::Text(text))) => {
                    if let Some(msg) = decode_frame(&text) {
                        if notify_tx.send(msg).await.is_err() {
                            return Ok(());
                        }
                    }
                }
                Some(Ok(PushFrame::Close)) => {
                    tracing::info!("push channel close frame received");
                    return Ok(());
                }
                Some(Err(e)) => return Err(e),
                None => {
                    tracing::info!("push channel stream ended");
                    return Ok(());
                }
            }
        }
    }
}

// ── Frame decoding ───────────────────────────────────────────────────

/// Decode one text frame. Malformed frames are logged and dropped.
fn decode_frame(text: &str) -> Option<PushMessage> {
    match serde_json::from_str::<PushMessage>(text) {
        Ok(msg) => {
            tracing::debug!(kind = msg.kind(), "push notification");
            Some(msg)
        }
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable push frame");
            None
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_delay_is_three_seconds() {
        assert_eq!(ReconnectConfig::default().delay, Duration::from_secs(3));
    }

    #[test]
    fn ws_url_from_http_base() {
        let api = Url::parse("http://127.0.0.1:8000/api").unwrap();
        assert_eq!(derive_ws_url(&api).unwrap().as_str(), "ws://127.0.0.1:8000/ws");
    }

    #[test]
    fn ws_url_from_https_base_without_port() {
        let api = Url::parse("https://shop.example.com/api/").unwrap();
        assert_eq!(derive_ws_url(&api).unwrap().as_str(), "wss://shop.example.com/ws");
    }

    #[test]
    fn decode_drops_garbage() {
        assert!(decode_frame("{").is_none());
        assert!(decode_frame(r#"{"type":"created"}"#).is_none());
        assert!(decode_frame(r#"{"type":"deleted","data":{"id":5}}"#).is_some());
    }

    #[test]
    fn decode_drops_negative_price() {
        let frame = r#"{"type":"updated","data":{"id":1,"name":"Fudge","category":"Candy","price":-1.0,"quantity":3}}"#;
        assert!(decode_frame(frame).is_none());
    }

    #[test]
    fn state_helpers() {
        assert!(ChannelState::Open.is_open());
        assert!(!ChannelState::Connecting.is_open());
        assert!(ChannelState::Closed { retry_pending: false }.is_terminal());
        assert!(!ChannelState::Closed { retry_pending: true }.is_terminal());
    }
}
