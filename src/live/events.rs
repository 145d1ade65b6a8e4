use std::fmt::Debug;
use std::time::Duration;

use super::state::StreamStatus;

/// Everything noteworthy that happens inside a running stream.
///
/// Events are handed to an [`EventLog`]. None of them carries the credential.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A dial attempt is about to start
    Connecting { url: String },
    /// A dial attempt failed and is retried after `retry_in`
    DialFailed {
        attempt: u32,
        error: String,
        retry_in: Duration,
    },
    /// The websocket upgrade succeeded
    Connected,
    InitSent,
    InitAcknowledged,
    /// A second handshake ack on an already initialized connection
    DuplicateAck,
    SubscribeSent,
    SubscriptionSucceeded,
    /// The server rejected the subscription
    SubscriptionFailed { message: String },
    /// A frame type the active profile does not know
    UnexpectedMessage { kind: String },
    PingAnswered,
    /// A recognized close; one reconnect follows after `retry_in`
    CloseError { error: String, retry_in: Duration },
    /// The reconnect after a read failure did not succeed
    ReconnectFailed { retry_in: Duration },
    /// An unknown read error, `consecutive` in a row
    ReadError {
        consecutive: u32,
        error: String,
        retry_in: Duration,
    },
    /// Too many unknown read errors, the connection is replaced
    ForcedReconnect { consecutive: u32 },
    /// The message router panicked and restarts after `cooldown`
    RouterCrashed { reason: String, cooldown: Duration },
    /// Dialing gave up after the configured attempts
    DialExhausted { attempts: u32 },
    /// The output receiver was dropped
    ConsumerGone,
    StateChanged {
        status: StreamStatus,
        error: Option<String>,
    },
    Stopping,
    Stopped,
}

/// Sink for [`SessionEvent`]s.
///
/// Implementations must be cheap; they are called inline from the message router.
pub trait EventLog: Send + Sync + Debug + 'static {
    fn record(&self, event: &SessionEvent);
}

/// Forwards events to `tracing` when the `tracing` feature is enabled and discards them
/// otherwise.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl EventLog for TracingLog {
    #[cfg(feature = "tracing")]
    fn record(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Connecting { url } => tracing::debug!(%url, "Connecting to websocket"),
            SessionEvent::DialFailed {
                attempt,
                error,
                retry_in,
            } => tracing::warn!(attempt, %error, ?retry_in, "Unable to connect"),
            SessionEvent::Connected => tracing::info!("Websocket connected"),
            SessionEvent::InitSent => tracing::debug!("Sent connection init"),
            SessionEvent::InitAcknowledged => tracing::debug!("Connection init acknowledged"),
            SessionEvent::DuplicateAck => {
                tracing::debug!("Ignoring handshake ack on initialized connection");
            }
            SessionEvent::SubscribeSent => tracing::debug!("Sent subscription request"),
            SessionEvent::SubscriptionSucceeded => tracing::info!("Subscription started"),
            SessionEvent::SubscriptionFailed { message } => {
                tracing::error!(%message, "Subscription failed");
            }
            SessionEvent::UnexpectedMessage { kind } => {
                tracing::warn!(%kind, "Unrecognized message type");
            }
            SessionEvent::PingAnswered => tracing::trace!("Answered ping"),
            SessionEvent::CloseError { error, retry_in } => {
                tracing::warn!(%error, ?retry_in, "Websocket closed, reconnecting");
            }
            SessionEvent::ReconnectFailed { retry_in } => {
                tracing::error!(?retry_in, "Reconnect failed");
            }
            SessionEvent::ReadError {
                consecutive,
                error,
                retry_in,
            } => tracing::warn!(consecutive, %error, ?retry_in, "Websocket read error"),
            SessionEvent::ForcedReconnect { consecutive } => {
                tracing::warn!(consecutive, "Too many read errors, forcing reconnect");
            }
            SessionEvent::RouterCrashed { reason, cooldown } => {
                tracing::error!(%reason, ?cooldown, "Message router crashed");
            }
            SessionEvent::DialExhausted { attempts } => {
                tracing::error!(attempts, "Giving up on connecting");
            }
            SessionEvent::ConsumerGone => tracing::info!("Output receiver dropped, stopping"),
            SessionEvent::StateChanged { status, error } => {
                tracing::debug!(%status, ?error, "Stream state changed");
            }
            SessionEvent::Stopping => tracing::debug!("Stopping stream"),
            SessionEvent::Stopped => tracing::info!("Stream stopped"),
        }
    }

    #[cfg(not(feature = "tracing"))]
    fn record(&self, event: &SessionEvent) {
        let _ = event;
    }
}
