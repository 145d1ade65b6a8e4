use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_stream::stream;
use futures::Stream as FuturesStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::events::{EventLog, SessionEvent, TracingLog};
use super::profile::Profile;
use super::router::{Router, RouterExit};
use super::state::{StateReporter, StreamState};
use super::types::response::StreamMessage;
use crate::Result;
use crate::auth::Token;
use crate::error::Error;
use crate::ws::config::Config;
use crate::ws::{Connector, WsConnector, WsError};

/// Everything a router needs, shared between the [`Stream`] handle and its tasks.
pub(crate) struct Inner<C> {
    pub(crate) home_id: String,
    pub(crate) token: Token,
    pub(crate) profile: Profile,
    pub(crate) config: Config,
    pub(crate) url: String,
    pub(crate) connector: C,
    pub(crate) log: Arc<dyn EventLog>,
    pub(crate) state: StateReporter,
    pub(crate) cancel: CancellationToken,
    started: AtomicBool,
    state_rx: watch::Receiver<StreamState>,
}

/// A self-healing live measurement subscription for one home.
///
/// The stream dials the subscription endpoint, performs the handshake, subscribes to
/// `liveMeasurement` and forwards every measurement to the output channel until [`Stream::stop`]
/// is called. Dial failures, server closes and read errors are recovered from internally and
/// only surface as [`StreamState`] reports.
///
/// # Example
///
/// ```no_run
/// use tibber_client_sdk::live::Stream;
/// use tokio::sync::mpsc;
///
/// # async fn run() -> tibber_client_sdk::Result<()> {
/// let stream = Stream::new("96a14971-525a-4420-aae9-e5aedaa129ff", "token");
/// let (tx, mut rx) = mpsc::channel(16);
/// let _handle = stream.start(tx)?;
///
/// while let Some(message) = rx.recv().await {
///     println!("{} W", message.measurement.power);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Stream<C: Connector = WsConnector> {
    inner: Arc<Inner<C>>,
}

impl<C: Connector> Clone for Stream<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> std::fmt::Debug for Stream<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("home_id", &self.inner.home_id)
            .field("profile", &self.inner.profile)
            .field("url", &self.inner.url)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Stream<WsConnector> {
    /// Creates a stream with the default profile and configuration. No I/O happens until the
    /// stream is started.
    #[must_use]
    pub fn new<H: Into<String>, T: Into<Token>>(home_id: H, token: T) -> Self {
        Self::with_config(home_id, token, Profile::default(), Config::default())
    }

    #[must_use]
    pub fn with_config<H: Into<String>, T: Into<Token>>(
        home_id: H,
        token: T,
        profile: Profile,
        config: Config,
    ) -> Self {
        let connector = WsConnector::new(
            endpoint(profile, &config),
            profile.subprotocol(),
            config.user_agent.clone(),
        );
        Self::with_connector(
            home_id,
            token,
            profile,
            config,
            connector,
            Arc::new(TracingLog),
        )
    }
}

impl<C: Connector> Stream<C> {
    /// Creates a stream that dials through `connector` and records events to `log`.
    #[must_use]
    pub fn with_connector<H: Into<String>, T: Into<Token>>(
        home_id: H,
        token: T,
        profile: Profile,
        config: Config,
        connector: C,
        log: Arc<dyn EventLog>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(StreamState::default());
        let url = endpoint(profile, &config);

        Self {
            inner: Arc::new(Inner {
                home_id: home_id.into(),
                token: token.into(),
                profile,
                config,
                url,
                connector,
                state: StateReporter::new(state_tx, Arc::clone(&log)),
                log,
                cancel: CancellationToken::new(),
                started: AtomicBool::new(false),
                state_rx,
            }),
        }
    }

    /// Starts the stream on the tokio runtime and returns immediately.
    ///
    /// Measurements are sent to `output`; a full channel blocks the stream until the consumer
    /// catches up. Dropping the receiver stops the stream.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the stream was already started.
    pub fn start(&self, output: mpsc::Sender<StreamMessage>) -> Result<JoinHandle<()>> {
        self.mark_started()?;
        Ok(tokio::spawn(supervise(Arc::clone(&self.inner), output)))
    }

    /// Runs the stream on the current task until it is stopped.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the stream was already started.
    pub async fn listen(&self, output: mpsc::Sender<StreamMessage>) -> Result<()> {
        self.mark_started()?;
        supervise(Arc::clone(&self.inner), output).await;
        Ok(())
    }

    /// Starts the stream and returns its measurements as a [`futures::Stream`] backed by a
    /// channel of `capacity` messages. Dropping the returned stream stops the subscription.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the stream was already started.
    pub fn measurements(
        &self,
        capacity: usize,
    ) -> Result<impl FuturesStream<Item = StreamMessage> + use<C>> {
        let (tx, mut rx) = mpsc::channel(capacity);
        self.start(tx)?;

        Ok(stream! {
            while let Some(message) = rx.recv().await {
                yield message;
            }
        })
    }

    /// Raises the stop signal. The running router closes its connection on its way out.
    pub fn stop(&self) {
        if !self.inner.cancel.is_cancelled() {
            self.inner.log.record(&SessionEvent::Stopping);
        }
        self.inner.cancel.cancel();
    }

    /// Whether the stream was started and not stopped yet.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.started.load(Ordering::Acquire) && !self.inner.cancel.is_cancelled()
    }

    /// The latest state report.
    #[must_use]
    pub fn state(&self) -> StreamState {
        self.inner.state_rx.borrow().clone()
    }

    /// A receiver that observes state reports. Only the newest report is retained, so a slow
    /// observer skips intermediate states.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<StreamState> {
        self.inner.state_rx.clone()
    }

    #[must_use]
    pub fn home_id(&self) -> &str {
        &self.inner.home_id
    }

    #[must_use]
    pub fn profile(&self) -> Profile {
        self.inner.profile
    }

    fn mark_started(&self) -> Result<()> {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return Err(Error::validation("stream already started"));
        }
        Ok(())
    }
}

fn endpoint(profile: Profile, config: &Config) -> String {
    config
        .endpoint
        .clone()
        .unwrap_or_else(|| profile.endpoint().to_owned())
}

/// Runs routers until the stream is stopped, restarting them after a crash or a failed
/// initial dial.
async fn supervise<C: Connector>(inner: Arc<Inner<C>>, output: mpsc::Sender<StreamMessage>) {
    let reconnect = inner.config.reconnect.clone();

    while !inner.cancel.is_cancelled() {
        let router = Router::new(Arc::clone(&inner), output.clone());

        let delay = match tokio::spawn(router.run()).await {
            Ok(RouterExit::Stopped) => break,
            Ok(RouterExit::DialExhausted) => reconnect.redial_delay,
            Err(e) if e.is_panic() => {
                let reason = panic_reason(e.into_panic().as_ref());
                inner.log.record(&SessionEvent::RouterCrashed {
                    reason: reason.clone(),
                    cooldown: reconnect.crash_cooldown,
                });
                inner.state.disconnected(WsError::Panicked(reason));
                reconnect.crash_cooldown
            }
            // The runtime is shutting down
            Err(_) => break,
        };

        if !pause(&inner.cancel, delay).await {
            break;
        }
    }

    inner.log.record(&SessionEvent::Stopped);
}

/// Sleeps for `duration` unless `cancel` fires first. Returns `false` when cancelled.
pub(crate) async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = sleep(duration) => true,
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        (*reason).to_owned()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "unknown panic".to_owned()
    }
}
