//! Core WebSocket infrastructure.
//!
//! This module provides the transport seam the live measurement stream is built on.
//!
//! # Architecture
//!
//! - [`Connector`] / [`Connection`]: dial and read/write one connection
//! - [`WsConnector`]: the `tokio-tungstenite` implementation used in production
//! - [`MessageParser`]: Trait for parsing incoming WebSocket text frames
//! - [`WsError`]: transport errors, including the close-code classification that decides how
//!   the stream recovers

pub mod config;
pub mod connection;
pub mod error;
pub mod traits;

pub use connection::{WsConnection, WsConnector};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
pub use traits::*;
