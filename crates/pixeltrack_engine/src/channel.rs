//! The shared subscription channel: one physical WebSocket multiplexing
//! subscribe/unsubscribe control frames and inbound progress events for any
//! number of projects.
//!
//! Consumers attach and detach through reference-counted guards; the socket
//! closes only when the last guard is gone. Subscriptions are tracked as a
//! desired set and replayed after every reconnect, so an in-flight
//! subscription survives a dropped connection.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use client_logging::{client_debug, client_info, client_warn};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::schema::{classify, ControlAction, ControlMessage, WsInbound};
use crate::types::ChannelEvent;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub url: String,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
}

impl ChannelSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            backoff_initial: Duration::from_millis(250),
            backoff_max: Duration::from_secs(8),
        }
    }
}

/// Receiver for everything the channel produces.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ChannelEvent);
}

enum ChannelCommand {
    Subscribe(String),
    Unsubscribe(String),
    Close,
}

/// Connection manager owning the single physical socket. Must be created
/// from within a tokio runtime.
pub struct SubscriptionChannel {
    cmd_tx: mpsc::UnboundedSender<ChannelCommand>,
    ready_rx: watch::Receiver<bool>,
    attached: Arc<AtomicUsize>,
    task: tokio::task::JoinHandle<()>,
}

impl SubscriptionChannel {
    pub fn spawn(settings: ChannelSettings, sink: Arc<dyn EventSink>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = watch::channel(false);
        let task = tokio::spawn(run_connection(settings, cmd_rx, ready_tx, sink));
        Self {
            cmd_tx,
            ready_rx,
            attached: Arc::new(AtomicUsize::new(0)),
            task,
        }
    }

    /// Attaches a logical consumer. The underlying socket stays open while
    /// any guard is alive.
    pub fn attach(&self) -> ChannelGuard {
        self.attached.fetch_add(1, Ordering::SeqCst);
        ChannelGuard {
            cmd_tx: self.cmd_tx.clone(),
            attached: self.attached.clone(),
        }
    }

    /// Discrete readiness signal; flips to true once the socket is open and
    /// back to false when it drops.
    pub fn readiness(&self) -> watch::Receiver<bool> {
        self.ready_rx.clone()
    }

    pub fn attached_count(&self) -> usize {
        self.attached.load(Ordering::SeqCst)
    }

    /// Waits for the connection task to finish. It ends once the last guard
    /// detaches and any still-queued control frames plus the close frame
    /// have been written, so teardown can join this to avoid dropping them.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// One attached consumer. Dropping the last guard closes the socket.
pub struct ChannelGuard {
    cmd_tx: mpsc::UnboundedSender<ChannelCommand>,
    attached: Arc<AtomicUsize>,
}

impl ChannelGuard {
    /// Adds the prefix to the desired set; the SUBSCRIBE frame goes out as
    /// soon as the connection is ready (and again after any reconnect).
    pub fn subscribe(&self, object_prefix: impl Into<String>) {
        let _ = self
            .cmd_tx
            .send(ChannelCommand::Subscribe(object_prefix.into()));
    }

    pub fn unsubscribe(&self, object_prefix: impl Into<String>) {
        let _ = self
            .cmd_tx
            .send(ChannelCommand::Unsubscribe(object_prefix.into()));
    }
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        if self.attached.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.cmd_tx.send(ChannelCommand::Close);
        }
    }
}

async fn run_connection(
    settings: ChannelSettings,
    mut cmd_rx: mpsc::UnboundedReceiver<ChannelCommand>,
    ready_tx: watch::Sender<bool>,
    sink: Arc<dyn EventSink>,
) {
    let mut desired: BTreeSet<String> = BTreeSet::new();
    let mut backoff = settings.backoff_initial;

    loop {
        match tokio_tungstenite::connect_async(settings.url.as_str()).await {
            Ok((stream, _response)) => {
                client_info!("subscription channel connected to {}", settings.url);
                backoff = settings.backoff_initial;
                let (mut ws_sink, mut ws_source) = stream.split();

                // Replay the desired set so subscriptions survive reconnects.
                let mut replay_ok = true;
                for prefix in &desired {
                    if send_control(&mut ws_sink, ControlAction::Subscribe, prefix)
                        .await
                        .is_err()
                    {
                        replay_ok = false;
                        break;
                    }
                }

                if replay_ok {
                    let _ = ready_tx.send(true);
                    sink.emit(ChannelEvent::Ready);
                    let closing = pump(
                        &mut ws_sink,
                        &mut ws_source,
                        &mut cmd_rx,
                        &mut desired,
                        sink.as_ref(),
                    )
                    .await;
                    let _ = ready_tx.send(false);
                    if closing {
                        let _ = ws_sink.send(Message::Close(None)).await;
                        client_info!("subscription channel closed, no consumers left");
                        return;
                    }
                    sink.emit(ChannelEvent::Down);
                    client_warn!("subscription channel lost, reconnecting");
                }
            }
            Err(err) => {
                client_warn!("subscription channel connect failed: {err}");
            }
        }

        // Keep absorbing commands while disconnected so the desired set
        // stays current; Close wins over a pending reconnect.
        if wait_backoff(&mut cmd_rx, &mut desired, backoff).await {
            return;
        }
        backoff = (backoff * 2).min(settings.backoff_max);
    }
}

/// Runs the connected phase. Returns true when the channel should close for
/// good, false when the connection dropped and a reconnect is due.
async fn pump(
    ws_sink: &mut WsSink,
    ws_source: &mut WsSource,
    cmd_rx: &mut mpsc::UnboundedReceiver<ChannelCommand>,
    desired: &mut BTreeSet<String>,
    sink: &dyn EventSink,
) -> bool {
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                None | Some(ChannelCommand::Close) => return true,
                Some(ChannelCommand::Subscribe(prefix)) => {
                    if desired.insert(prefix.clone())
                        && send_control(ws_sink, ControlAction::Subscribe, &prefix).await.is_err()
                    {
                        return false;
                    }
                }
                Some(ChannelCommand::Unsubscribe(prefix)) => {
                    if desired.remove(&prefix)
                        && send_control(ws_sink, ControlAction::Unsubscribe, &prefix).await.is_err()
                    {
                        return false;
                    }
                }
            },
            frame = ws_source.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatch_inbound(text.as_str(), sink),
                // Binary/ping/pong frames are not part of the protocol.
                Some(Ok(Message::Close(_))) | None => return false,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    client_warn!("subscription channel read error: {err}");
                    return false;
                }
            },
        }
    }
}

fn dispatch_inbound(raw: &str, sink: &dyn EventSink) {
    match classify(raw) {
        WsInbound::Progress(event) => sink.emit(ChannelEvent::Progress(event)),
        WsInbound::Ack(ack) => {
            if (200..300).contains(&ack.status_code) {
                client_debug!(
                    "{:?} acknowledged for {}: {}",
                    ack.action,
                    ack.object_prefix,
                    ack.status
                );
            } else {
                client_warn!(
                    "{:?} rejected for {}: {} {}",
                    ack.action,
                    ack.object_prefix,
                    ack.status_code,
                    ack.status
                );
                sink.emit(ChannelEvent::AckRejected(ack));
            }
        }
        WsInbound::Unrecognized => {
            // Validation rejection is silent by design; a debug line is the
            // only trace it leaves.
            client_debug!("unrecognized frame dropped: {raw}");
        }
    }
}

async fn send_control(
    ws_sink: &mut WsSink,
    action: ControlAction,
    object_prefix: &str,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let frame = ControlMessage {
        action,
        object_prefix: object_prefix.to_string(),
    };
    match serde_json::to_string(&frame) {
        Ok(text) => ws_sink.send(Message::Text(text.into())).await,
        Err(err) => {
            client_warn!("control frame serialization failed: {err}");
            Ok(())
        }
    }
}

/// Sleeps out the backoff while still applying commands. Returns true when
/// the channel should close instead of reconnecting.
async fn wait_backoff(
    cmd_rx: &mut mpsc::UnboundedReceiver<ChannelCommand>,
    desired: &mut BTreeSet<String>,
    backoff: Duration,
) -> bool {
    let sleep = tokio::time::sleep(backoff);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            cmd = cmd_rx.recv() => match cmd {
                None | Some(ChannelCommand::Close) => return true,
                Some(ChannelCommand::Subscribe(prefix)) => {
                    desired.insert(prefix);
                }
                Some(ChannelCommand::Unsubscribe(prefix)) => {
                    desired.remove(&prefix);
                }
            },
        }
    }
}
