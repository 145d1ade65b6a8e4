#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use async_trait::async_trait;
use futures::{SinkExt as _, StreamExt as _};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest as _;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{SEC_WEBSOCKET_PROTOCOL, USER_AGENT};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::error::WsError;
use super::traits::{Connection, Connector};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials the subscription endpoint with `tokio-tungstenite`.
///
/// TLS is handled by rustls with the platform's native roots. Every attempt requests the
/// configured sub-protocol and sends an identifying `User-Agent`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    endpoint: String,
    subprotocol: &'static str,
    user_agent: String,
}

impl WsConnector {
    #[must_use]
    pub fn new(endpoint: String, subprotocol: &'static str, user_agent: String) -> Self {
        Self {
            endpoint,
            subprotocol,
            user_agent,
        }
    }

    /// Returns the endpoint this connector dials.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&self) -> Result<WsConnection, WsError> {
        let mut request = self
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(WsError::Connection)?;

        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| WsError::InvalidRequest(format!("invalid user agent: {e}")))?;
        let headers = request.headers_mut();
        headers.insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(self.subprotocol),
        );
        headers.insert(USER_AGENT, user_agent);

        let (stream, _response) = connect_async(request).await.map_err(WsError::Connection)?;

        Ok(WsConnection { stream })
    }
}

/// An upgraded websocket connection.
pub struct WsConnection {
    stream: WsStream,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), WsError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(WsError::from_write_error)
    }

    async fn next_text(&mut self) -> Result<String, WsError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Binary(bytes))) => {
                    return String::from_utf8(bytes.to_vec())
                        .map_err(|e| WsError::InvalidMessage(format!("binary frame: {e}")));
                }
                Some(Ok(Message::Close(frame))) => return Err(WsError::from_close_frame(frame)),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                    // Pongs for pings are queued by tungstenite and flushed on the next I/O.
                }
                Some(Err(e)) => return Err(WsError::from_read_error(e)),
                None => return Err(WsError::abnormal_closure()),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %e, "error while closing websocket");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }
    }
}
