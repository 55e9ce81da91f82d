use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::{Error, Result};

/// Message transport to the server
///
/// Each message is one JSON array of frames. Framing and encoding are
/// handled at a higher level.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send one text message
    async fn send(&mut self, message: String) -> Result<()>;

    /// Receive one text message, or `None` when the timeout elapses first
    async fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<String>>;
}

/// WebSocket transport (ws:// or wss://)
pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketTransport {
    pub async fn connect(url: &str) -> Result<Self> {
        // wss:// needs a process-wide crypto provider; a second install is a no-op
        let _ = rustls::crypto::ring::default_provider().install_default();

        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| Error::WebSocket(format!("failed to connect to {}: {}", url, e)))?;
        Ok(Self { stream })
    }

    /// Wait for the next text message, skipping control frames
    async fn recv_text(&mut self) -> Result<String> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Binary(bytes))) => {
                    return String::from_utf8(bytes)
                        .map_err(|e| Error::WebSocket(format!("binary message is not UTF-8: {}", e)));
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "server closed the connection".into());
                    return Err(Error::Disconnected { reason });
                }
                Some(Ok(other)) => debug!("skipping websocket control frame: {:?}", other),
                Some(Err(e)) => return Err(Error::WebSocket(e.to_string())),
                None => {
                    return Err(Error::Disconnected {
                        reason: "stream ended".into(),
                    })
                }
            }
        }
    }
}

impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<()> {
        self.stream
            .send(Message::Text(message))
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))
    }

    async fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<String>> {
        match tokio::time::timeout(timeout, self.recv_text()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}
