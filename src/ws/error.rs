#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;
use std::io;

use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

/// WebSocket error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error connecting to or communicating with the WebSocket server
    Connection(tungstenite::Error),
    /// Error parsing a WebSocket message
    MessageParse(serde_json::Error),
    /// The peer closed the connection, or it dropped without a closing handshake
    Closed {
        /// Close code sent by the peer (`Abnormal` when the stream just ended)
        code: CloseCode,
        /// Close reason sent by the peer
        reason: String,
    },
    /// Subscription request failed
    SubscriptionFailed(String),
    /// Received an invalid or unexpected message
    InvalidMessage(String),
    /// The upgrade request could not be built
    InvalidRequest(String),
    /// Dialing gave up after the configured number of attempts
    DialExhausted {
        /// Number of failed attempts
        attempts: u32,
    },
    /// The message router panicked and was restarted
    Panicked(String),
    /// WebSocket connection was closed
    ConnectionClosed,
}

impl WsError {
    /// Close error synthesized when the stream ends without a close frame.
    #[must_use]
    pub fn abnormal_closure() -> Self {
        Self::Closed {
            code: CloseCode::Abnormal,
            reason: String::new(),
        }
    }

    /// Close error for a received close frame. A frame without a payload means no status was
    /// received (1005).
    #[must_use]
    pub fn from_close_frame(frame: Option<CloseFrame>) -> Self {
        match frame {
            Some(frame) => Self::Closed {
                code: frame.code,
                reason: frame.reason.as_str().to_owned(),
            },
            None => Self::Closed {
                code: CloseCode::Status,
                reason: String::new(),
            },
        }
    }

    /// Classifies a transport read error. Reads after the connection went away count as an
    /// abnormal closure; every other transport error stays a [`WsError::Connection`].
    #[must_use]
    pub fn from_read_error(error: tungstenite::Error) -> Self {
        match error {
            tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
                Self::abnormal_closure()
            }
            other => Self::Connection(other),
        }
    }

    /// Classifies a transport write error. A write can never succeed on a socket that is
    /// closed or was reset by the peer, so those count as an abnormal closure as well.
    #[must_use]
    pub fn from_write_error(error: tungstenite::Error) -> Self {
        match error {
            tungstenite::Error::Protocol(ProtocolError::SendAfterClosing) => {
                Self::abnormal_closure()
            }
            tungstenite::Error::Io(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::BrokenPipe
                        | io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::NotConnected
                ) =>
            {
                Self::abnormal_closure()
            }
            other => Self::from_read_error(other),
        }
    }

    /// Whether this error is a recognized close condition.
    ///
    /// Recognized closes are answered with a delayed reconnect. Everything else (I/O errors,
    /// undecodable frames, application close codes such as `4400`) is an unknown read error
    /// that is tolerated until it repeats too often.
    #[must_use]
    pub fn is_close(&self) -> bool {
        let Self::Closed { code, .. } = self else {
            return false;
        };

        matches!(
            code,
            CloseCode::Normal
                | CloseCode::Away
                | CloseCode::Protocol
                | CloseCode::Unsupported
                | CloseCode::Status
                | CloseCode::Abnormal
                | CloseCode::Invalid
                | CloseCode::Policy
                | CloseCode::Size
                | CloseCode::Extension
                | CloseCode::Error
                | CloseCode::Restart
                | CloseCode::Again
                | CloseCode::Tls
        )
    }
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "WebSocket connection error: {e}"),
            Self::MessageParse(e) => write!(f, "Failed to parse WebSocket message: {e}"),
            Self::Closed { code, reason } if reason.is_empty() => {
                write!(f, "WebSocket closed ({})", u16::from(*code))
            }
            Self::Closed { code, reason } => {
                write!(f, "WebSocket closed ({}): {reason}", u16::from(*code))
            }
            Self::SubscriptionFailed(reason) => write!(f, "Subscription failed: {reason}"),
            Self::InvalidMessage(msg) => write!(f, "Invalid WebSocket message: {msg}"),
            Self::InvalidRequest(msg) => write!(f, "Invalid WebSocket request: {msg}"),
            Self::DialExhausted { attempts } => {
                write!(f, "Unable to connect after {attempts} attempts")
            }
            Self::Panicked(reason) => write!(f, "Message router crashed: {reason}"),
            Self::ConnectionClosed => write!(f, "WebSocket connection closed"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            Self::MessageParse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for WsError {
    fn from(e: serde_json::Error) -> Self {
        Self::MessageParse(e)
    }
}

// Integration with main Error type
impl From<WsError> for crate::error::Error {
    fn from(e: WsError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, e)
    }
}

impl From<tungstenite::Error> for crate::error::Error {
    fn from(e: tungstenite::Error) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, WsError::Connection(e))
    }
}
