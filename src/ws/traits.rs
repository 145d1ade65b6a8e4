//! Core traits for the WebSocket transport seam.

use async_trait::async_trait;

use super::error::WsError;

/// Message parser trait for converting a received text frame into a typed frame.
///
/// Implemented by [`crate::live::Profile`], which knows the message names of its protocol
/// generation.
///
/// # Example
///
/// ```ignore
/// pub struct SimpleParser;
///
/// impl MessageParser<MyFrame> for SimpleParser {
///     fn parse(&self, text: &str) -> Result<MyFrame, WsError> {
///         Ok(serde_json::from_str(text)?)
///     }
/// }
/// ```
pub trait MessageParser<M>: Send + Sync + 'static {
    /// Parse one received text frame.
    fn parse(&self, text: &str) -> Result<M, WsError>;
}

/// Dials new connections.
///
/// [`super::WsConnector`] dials the real endpoint; tests plug in scripted connectors.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    /// Perform one dial attempt, including the websocket upgrade.
    async fn connect(&self) -> Result<Self::Connection, WsError>;
}

/// One established connection, exclusively owned by the message router.
///
/// Dropping a connection releases it even when [`Connection::close`] was never called.
#[async_trait]
pub trait Connection: Send + 'static {
    /// Send one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), WsError>;

    /// Block until the next text frame arrives. Control frames are handled internally.
    async fn next_text(&mut self) -> Result<String, WsError>;

    /// Close the connection. Errors while closing are ignored.
    async fn close(&mut self);
}
