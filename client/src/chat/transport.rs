//! Real-time channel transport.
//!
//! A [`Connector`] opens one link per conversation. The link is a pair of
//! in-process queues pumped to and from the socket by a background task;
//! cancelling the link token closes the socket.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;

use swipe_common::chat::{ClientEvent, ServerEvent};
use swipe_common::UserId;

use crate::api::ApiClient;
use crate::error::{ClientError, Result};

/// An established channel. Dropping `incoming`'s sender side (the pump
/// exiting) signals that the link is gone.
pub struct ChannelLink {
    pub outgoing: mpsc::UnboundedSender<ClientEvent>,
    pub incoming: mpsc::UnboundedReceiver<ServerEvent>,
    pub cancel: CancellationToken,
}

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a channel for the conversation with `target`. The link lives
    /// until `cancel` fires or the remote side goes away.
    async fn connect(&self, target: &UserId, cancel: CancellationToken) -> Result<ChannelLink>;
}

/// WebSocket connector sharing the REST client's session cookie.
#[derive(Clone)]
pub struct WsConnector {
    api: ApiClient,
}

impl WsConnector {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, target: &UserId, cancel: CancellationToken) -> Result<ChannelLink> {
        let url = self.api.config().channel_url()?;
        let mut request = url.as_str().into_client_request()?;
        if let Some(cookie) = self.api.cookie_header(&url) {
            let value =
                HeaderValue::from_str(&cookie).map_err(|e| ClientError::Channel(e.to_string()))?;
            request.headers_mut().insert(header::COOKIE, value);
        }

        tracing::info!(url = %url, target_user_id = %target, "connecting channel");
        let (ws, _response) = tokio_tungstenite::connect_async(request).await?;
        let (mut sink, mut stream) = ws.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientEvent>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerEvent>();
        let token = cancel.clone();
        let target = target.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        let _ = sink.send(WsMessage::Close(None)).await;
                        tracing::info!(target_user_id = %target, "channel closed");
                        break;
                    }
                    outgoing = out_rx.recv() => {
                        let Some(event) = outgoing else {
                            let _ = sink.send(WsMessage::Close(None)).await;
                            break;
                        };
                        let text = match serde_json::to_string(&event) {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::warn!(error = %e, "failed to encode channel event");
                                continue;
                            }
                        };
                        if let Err(e) = sink.send(WsMessage::text(text)).await {
                            tracing::warn!(target_user_id = %target, error = %e, "channel send failed");
                            break;
                        }
                    }
                    frame = stream.next() => match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            match serde_json::from_str::<ServerEvent>(text.as_str()) {
                                Ok(event) => {
                                    if in_tx.send(event).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    tracing::debug!(error = %e, "ignoring unrecognised channel event");
                                }
                            }
                        }
                        Some(Ok(WsMessage::Close(_))) | None => {
                            tracing::info!(target_user_id = %target, "channel closed by server");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(target_user_id = %target, error = %e, "channel read failed");
                            break;
                        }
                    },
                }
            }
        });

        Ok(ChannelLink {
            outgoing: out_tx,
            incoming: in_rx,
            cancel,
        })
    }
}
