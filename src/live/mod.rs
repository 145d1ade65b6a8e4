//! Live measurement subscription.
//!
//! [`Stream`] keeps one home's `liveMeasurement` subscription alive indefinitely. Internally a
//! message router task owns the websocket: it dials with a fixed retry interval, sends the
//! handshake for the selected [`Profile`], subscribes once the handshake is acknowledged and
//! forwards each measurement to the consumer's channel. Read failures are split into
//! recognized closes, which trigger a delayed reconnect, and unknown errors, which are
//! tolerated until they repeat too often. A router that panics is restarted after a cooldown.
//!
//! Connectivity is published as [`StreamState`] with latest-state semantics, and everything
//! else that happens is recorded as a [`SessionEvent`] through an [`EventLog`].

pub mod events;
pub mod profile;
mod router;
pub mod state;
mod stream;
pub mod types;

pub use events::{EventLog, SessionEvent, TracingLog};
pub use profile::Profile;
pub use state::{StreamState, StreamStatus};
pub use stream::Stream;
pub use types::response::{InboundFrame, LiveMeasurement, StreamMessage};
