//! Socket Mode event intake.
//!
//! Every envelope that carries an id is acknowledged before its payload is
//! handed to the dispatcher. Only `events_api` envelopes produce raw events.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use levelbot_core::EventSource;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};

type SlackSocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Deserialize)]
struct SlackSocketEnvelope {
    #[serde(default)]
    envelope_id: Option<String>,
    #[serde(rename = "type")]
    envelope_type: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Clone, PartialEq)]
enum SocketFrame {
    Envelope(SlackSocketEnvelopeView),
    Closed,
    Control,
}

#[derive(Debug, Clone, PartialEq)]
struct SlackSocketEnvelopeView {
    envelope_id: Option<String>,
    envelope_type: String,
    event: Option<Value>,
}

impl From<SlackSocketEnvelope> for SlackSocketEnvelopeView {
    fn from(envelope: SlackSocketEnvelope) -> Self {
        let event = if envelope.envelope_type == "events_api" {
            envelope
                .payload
                .get("event")
                .filter(|event| event.is_object())
                .cloned()
        } else {
            None
        };
        Self {
            envelope_id: envelope.envelope_id.filter(|id| !id.trim().is_empty()),
            envelope_type: envelope.envelope_type,
            event,
        }
    }
}

fn parse_socket_frame(message: WsMessage) -> Result<SocketFrame> {
    let text = match message {
        WsMessage::Text(text) => text.as_str().to_string(),
        WsMessage::Binary(bytes) => {
            String::from_utf8(bytes.to_vec()).context("invalid utf-8 slack socket payload")?
        }
        WsMessage::Close(_) => return Ok(SocketFrame::Closed),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {
            return Ok(SocketFrame::Control)
        }
    };
    let envelope = serde_json::from_str::<SlackSocketEnvelope>(&text)
        .context("failed to parse slack socket envelope")?;
    Ok(SocketFrame::Envelope(envelope.into()))
}

/// Reads Socket Mode envelopes in bounded windows and yields their events.
pub struct SlackSocketEventSource {
    stream: SlackSocketStream,
    read_window: Duration,
}

impl SlackSocketEventSource {
    pub async fn connect(socket_url: &str, read_window: Duration) -> Result<Self> {
        let (stream, _response) = connect_async(socket_url)
            .await
            .context("failed to connect slack socket mode websocket")?;
        Ok(Self {
            stream,
            read_window: read_window.max(Duration::from_millis(1)),
        })
    }

    async fn ack_envelope(&mut self, envelope_id: &str) -> Result<()> {
        let ack = json!({ "envelope_id": envelope_id }).to_string();
        self.stream
            .send(WsMessage::Text(ack.into()))
            .await
            .context("failed to send slack socket ack")
    }
}

#[async_trait]
impl EventSource for SlackSocketEventSource {
    async fn next_batch(&mut self) -> Result<Vec<Value>> {
        let deadline = Instant::now() + self.read_window;
        let mut batch = Vec::new();
        loop {
            let Ok(next) = tokio::time::timeout_at(deadline, self.stream.next()).await else {
                return Ok(batch);
            };
            let Some(message) = next else {
                bail!("slack socket mode stream ended");
            };
            let message = message.context("failed reading slack websocket message")?;

            let envelope = match parse_socket_frame(message)? {
                SocketFrame::Envelope(envelope) => envelope,
                SocketFrame::Closed => bail!("slack socket mode connection closed"),
                SocketFrame::Control => continue,
            };
            if let Some(envelope_id) = envelope.envelope_id.as_deref() {
                self.ack_envelope(envelope_id).await?;
            }
            match envelope.envelope_type.as_str() {
                "events_api" => batch.extend(envelope.event),
                "disconnect" => bail!("slack requested socket mode disconnect"),
                other => tracing::trace!(envelope_type = other, "ignoring socket envelope"),
            }
        }
    }
}
