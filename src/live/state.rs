use std::sync::Arc;

use strum_macros::Display;
use tokio::sync::watch;

use super::events::{EventLog, SessionEvent};
use crate::ws::WsError;

/// Connectivity of a stream.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum StreamStatus {
    Connected,
    Disconnected,
}

/// A point-in-time connectivity report.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct StreamState {
    pub status: StreamStatus,
    /// The failure that caused a disconnect, if any
    pub error: Option<Arc<WsError>>,
}

impl StreamState {
    #[must_use]
    pub fn connected() -> Self {
        Self {
            status: StreamStatus::Connected,
            error: None,
        }
    }

    #[must_use]
    pub fn disconnected(error: Option<WsError>) -> Self {
        Self {
            status: StreamStatus::Disconnected,
            error: error.map(Arc::new),
        }
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self.status, StreamStatus::Connected)
    }
}

impl Default for StreamState {
    fn default() -> Self {
        Self::disconnected(None)
    }
}

/// Publishes state reports with latest-state semantics.
///
/// Reports never block: each one replaces the previous value, so an observer that falls
/// behind only sees the newest state.
#[derive(Debug, Clone)]
pub(crate) struct StateReporter {
    tx: watch::Sender<StreamState>,
    log: Arc<dyn EventLog>,
}

impl StateReporter {
    pub(crate) fn new(tx: watch::Sender<StreamState>, log: Arc<dyn EventLog>) -> Self {
        Self { tx, log }
    }

    pub(crate) fn connected(&self) {
        self.report(StreamState::connected());
    }

    pub(crate) fn disconnected(&self, error: WsError) {
        self.report(StreamState::disconnected(Some(error)));
    }

    fn report(&self, state: StreamState) {
        self.log.record(&SessionEvent::StateChanged {
            status: state.status,
            error: state.error.as_ref().map(ToString::to_string),
        });
        self.tx.send_replace(state);
    }
}
