//! Websocket session against a terminal-multiplexer endpoint.
//!
//! The remote pseudo-terminal accepts raw keystroke frames shaped
//! `["stdin", "<input with trailing CR>"]`. One session spans one script
//! execution; there is no reconnection.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::TerminalError;

/// An ephemeral bidirectional socket bound to a single remote shell.
#[derive(Debug)]
pub struct TerminalSession {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TerminalSession {
    /// Open the socket, presenting the session cookie and derived origin.
    pub async fn connect(
        url: &str,
        cookie: Option<&str>,
        origin: Option<&str>,
    ) -> Result<Self, TerminalError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| TerminalError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let headers = request.headers_mut();
        if let Some(cookie) = cookie {
            headers.insert(
                "Cookie",
                HeaderValue::from_str(cookie).map_err(|e| TerminalError::Connect {
                    url: url.to_string(),
                    reason: format!("invalid cookie header: {e}"),
                })?,
            );
        }
        if let Some(origin) = origin {
            headers.insert(
                "Origin",
                HeaderValue::from_str(origin).map_err(|e| TerminalError::Connect {
                    url: url.to_string(),
                    reason: format!("invalid origin header: {e}"),
                })?,
            );
        }

        let (ws, _resp) = connect_async(request)
            .await
            .map_err(|e| TerminalError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(%url, "Terminal session established");
        Ok(Self { ws })
    }

    /// Send one line of input as a stdin keystroke frame.
    pub async fn send_stdin(&mut self, input: &str) -> Result<(), TerminalError> {
        let frame = stdin_frame(input);
        self.ws
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| TerminalError::Send(e.to_string()))
    }

    /// Read one data frame, skipping control frames. `None` on timeout.
    pub async fn read_frame(&mut self, timeout: Duration) -> Result<Option<String>, TerminalError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let next = tokio::time::timeout_at(deadline, self.ws.next()).await;
            match next {
                Err(_) => return Ok(None),
                Ok(None) => return Err(TerminalError::Closed),
                Ok(Some(Err(e))) => return Err(TerminalError::Send(e.to_string())),
                Ok(Some(Ok(Message::Text(text)))) => return Ok(Some(text.to_string())),
                Ok(Some(Ok(Message::Binary(bytes)))) => {
                    return Ok(Some(String::from_utf8_lossy(&bytes).to_string()));
                }
                Ok(Some(Ok(Message::Close(_)))) => return Err(TerminalError::Closed),
                Ok(Some(Ok(_))) => continue,
            }
        }
    }

    /// Close the socket. Errors here are not interesting; the session is
    /// over either way.
    pub async fn close(mut self) {
        self.ws.close(None).await.ok();
        tracing::info!("Terminal session closed");
    }
}

/// Encode one line of input as a stdin keystroke frame.
pub fn stdin_frame(input: &str) -> String {
    serde_json::json!(["stdin", format!("{input}\r")]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdin_frame_wire_shape() {
        assert_eq!(stdin_frame("ls"), r#"["stdin","ls\r"]"#);
    }

    #[test]
    fn stdin_frame_escapes_embedded_quotes() {
        let frame = stdin_frame(r#"echo "hi""#);
        let parsed: Vec<String> = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed[0], "stdin");
        assert_eq!(parsed[1], "echo \"hi\"\r");
    }

    #[test]
    fn stdin_frame_appends_carriage_return() {
        let frame = stdin_frame("pip install example");
        let parsed: Vec<String> = serde_json::from_str(&frame).unwrap();
        assert!(parsed[1].ends_with('\r'));
    }
}
