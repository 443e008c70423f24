//! WebSocket client transport using `tokio-tungstenite`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A WebSocket-based [`Transport`] that dials a fixed endpoint.
///
/// Accepts both `ws://` and `wss://` URLs; the latter negotiates TLS with
/// rustls and the bundled webpki roots.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    /// Creates a transport that will connect to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// The endpoint this transport dials.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        if self.url.starts_with("wss://") {
            // Fails harmlessly when a provider is already installed.
            let _ = rustls::crypto::ring::default_provider().install_default();
        }

        let (ws, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::ConnectFailed {
                url: self.url.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ),
            })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, url = %self.url, "WebSocket connection established");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            sink: Mutex::new(sink),
            inbound: Mutex::new(Inbound {
                stream,
                pending: VecDeque::new(),
            }),
        })
    }
}

/// Read half of the socket plus lines already split out of a frame but
/// not yet handed to the caller.
struct Inbound {
    stream: SplitStream<WsStream>,
    pending: VecDeque<String>,
}

/// A single WebSocket connection carrying chat lines.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    inbound: Mutex<Inbound>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, line: &str) -> Result<(), Self::Error> {
        self.sink
            .lock()
            .await
            .send(Message::text(line.to_owned()))
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    async fn recv(&self) -> Result<Option<String>, Self::Error> {
        let mut inbound = self.inbound.lock().await;
        loop {
            if let Some(line) = inbound.pending.pop_front() {
                return Ok(Some(line));
            }

            // `next()` is cancel-safe and everything after it is
            // synchronous, so a dropped recv never loses a frame.
            match inbound.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    inbound.pending.extend(split_lines(text.as_str()));
                }
                Some(Ok(Message::Binary(data))) => {
                    let text = String::from_utf8_lossy(&data);
                    inbound.pending.extend(split_lines(&text));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Splits one frame into its lines, dropping the `\r\n` terminators and
/// any empty lines.
fn split_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_single_line_with_terminator() {
        let lines: Vec<_> = split_lines("PING :tmi.twitch.tv\r\n").collect();
        assert_eq!(lines, vec!["PING :tmi.twitch.tv"]);
    }

    #[test]
    fn test_split_lines_multiple_lines_in_one_frame() {
        let frame = ":tmi.twitch.tv 001 bot :Welcome, GLHF!\r\n\
                     :tmi.twitch.tv 002 bot :Your host is tmi.twitch.tv\r\n";
        let lines: Vec<_> = split_lines(frame).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("GLHF!"));
        assert!(lines[1].ends_with("tmi.twitch.tv"));
    }

    #[test]
    fn test_split_lines_without_terminator() {
        let lines: Vec<_> = split_lines("JOIN #bar").collect();
        assert_eq!(lines, vec!["JOIN #bar"]);
    }

    #[test]
    fn test_split_lines_empty_frame_yields_nothing() {
        assert_eq!(split_lines("\r\n\r\n").count(), 0);
        assert_eq!(split_lines("").count(), 0);
    }

    #[test]
    fn test_transport_keeps_url() {
        let transport = WebSocketTransport::new("ws://127.0.0.1:1");
        assert_eq!(transport.url(), "ws://127.0.0.1:1");
    }
}
