use std::sync::{mpsc, Arc};
use std::time::Duration;

use digest_logging::{digest_debug, digest_info, digest_warn};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc as async_mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    decode_server_frame, encode_client_frame, ClientEvent, EngineEvent, FailureKind,
    TransportError,
};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Live connection to the server's push channel. Incoming frames are decoded
/// and forwarded to the sink in arrival order; outgoing events are queued.
pub struct PushChannel {
    outgoing: async_mpsc::UnboundedSender<ClientEvent>,
}

impl PushChannel {
    pub async fn connect(
        url: &Url,
        connect_timeout: Duration,
        sink: Arc<dyn EventSink>,
        cancel: CancellationToken,
    ) -> Result<Self, TransportError> {
        digest_info!("connecting push channel {}", url);
        let (stream, _) = tokio::time::timeout(connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| TransportError::new(FailureKind::Timeout, "push channel connect timed out"))?
            .map_err(|err| TransportError::new(FailureKind::ChannelUnavailable, err.to_string()))?;
        let (mut write, mut read) = stream.split();
        let (outgoing, mut outgoing_rx) = async_mpsc::unbounded_channel::<ClientEvent>();

        // The writer stops with the reader, which is what `is_closed` observes.
        let writer_cancel = cancel.child_token();
        let reader_done = writer_cancel.clone();
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = writer_cancel.cancelled() => break,
                    next = outgoing_rx.recv() => match next {
                        Some(event) => event,
                        None => break,
                    },
                };
                let frame = match encode_client_frame(&event) {
                    Ok(frame) => frame,
                    Err(err) => {
                        digest_warn!("failed to encode {:?}: {}", event, err);
                        continue;
                    }
                };
                if write.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
        });

        sink.emit(EngineEvent::ChannelOpened);
        tokio::spawn(async move {
            let reason = loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => break "client shut down".to_string(),
                    next = read.next() => next,
                };
                let message = match next {
                    Some(Ok(message)) => message,
                    Some(Err(err)) => break err.to_string(),
                    None => break "connection closed".to_string(),
                };
                match message {
                    Message::Text(text) => match decode_server_frame(text.as_str()) {
                        Ok(Some(event)) => sink.emit(EngineEvent::Push(event)),
                        Ok(None) => digest_debug!("skipping unknown push frame {}", text.as_str()),
                        Err(err) => digest_warn!("malformed push frame: {}", err),
                    },
                    Message::Close(frame) => {
                        break frame
                            .map(|frame| frame.reason.to_string())
                            .filter(|reason| !reason.is_empty())
                            .unwrap_or_else(|| "closed by server".to_string());
                    }
                    _ => {}
                }
            };
            reader_done.cancel();
            digest_info!("push channel closed: {}", reason);
            sink.emit(EngineEvent::ChannelClosed { reason });
        });

        Ok(Self { outgoing })
    }

    /// Queues `join_session` so pushes for `session_id` reach this client.
    pub fn join(&self, session_id: &str) -> Result<(), TransportError> {
        self.outgoing
            .send(ClientEvent::JoinSession {
                session_id: session_id.to_string(),
            })
            .map_err(|_| TransportError::new(FailureKind::ChannelUnavailable, "push channel is closed"))
    }

    pub fn is_closed(&self) -> bool {
        self.outgoing.is_closed()
    }
}
