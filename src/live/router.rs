//! The message router: the task that owns the connection.
//!
//! One router runs at a time. It dials, performs the handshake, reads and classifies frames,
//! forwards measurements and recovers from read failures. Only panics escape it; those are
//! handled by the supervising loop in [`super::stream`].

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::{Backoff as _, Constant};
use tokio::sync::mpsc;

use super::events::SessionEvent;
use super::stream::{Inner, pause};
use super::types::response::{InboundFrame, StreamMessage};
use crate::ws::{Connection, Connector, MessageParser as _, WsError};

/// Position in the init → subscribe handshake of the current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingAck { init_sent: bool },
    AwaitingSubscriptionResult { subscribe_sent: bool },
    Streaming,
}

/// Why [`Router::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RouterExit {
    /// The stop signal was raised
    Stopped,
    /// The initial dial gave up
    DialExhausted,
}

#[derive(Debug)]
enum DialError {
    Cancelled,
    Exhausted,
}

pub(crate) struct Router<C: Connector> {
    inner: Arc<Inner<C>>,
    output: mpsc::Sender<StreamMessage>,
    connection: Option<C::Connection>,
    phase: Phase,
    unknown_errors: u32,
}

impl<C: Connector> Router<C> {
    pub(crate) fn new(inner: Arc<Inner<C>>, output: mpsc::Sender<StreamMessage>) -> Self {
        Self {
            inner,
            output,
            connection: None,
            phase: Phase::AwaitingAck { init_sent: false },
            unknown_errors: 0,
        }
    }

    /// Dials, then reads until the stop signal is raised. The connection is closed exactly
    /// once on the way out.
    pub(crate) async fn run(mut self) -> RouterExit {
        let exit = match self.connect().await {
            Ok(()) => {
                self.read_loop().await;
                RouterExit::Stopped
            }
            Err(DialError::Cancelled) => RouterExit::Stopped,
            Err(DialError::Exhausted) => RouterExit::DialExhausted,
        };

        self.release().await;
        exit
    }

    async fn read_loop(&mut self) {
        let failure_delay = self.inner.config.reconnect.close_reconnect_failure_delay;

        while !self.inner.cancel.is_cancelled() {
            if self.connection.is_none() {
                self.reconnect(failure_delay).await;
                continue;
            }

            if let Err(e) = self.send_pending().await {
                self.on_read_error(e).await;
                continue;
            }

            let Some(connection) = self.connection.as_mut() else {
                continue;
            };
            let read = tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => break,
                read = connection.next_text() => read,
            };

            match read.and_then(|text| self.inner.profile.parse(&text)) {
                Ok(frame) => {
                    self.unknown_errors = 0;
                    self.dispatch(frame).await;
                }
                Err(e) => self.on_read_error(e).await,
            }
        }
    }

    /// Sends the handshake message the current phase still owes the server. A failed send
    /// leaves the phase untouched so the next pass retries it.
    async fn send_pending(&mut self) -> Result<(), WsError> {
        match self.phase {
            Phase::AwaitingAck { init_sent: false } => {
                let init = self.inner.profile.init_message(&self.inner.token)?;
                self.send(init).await?;
                self.phase = Phase::AwaitingAck { init_sent: true };
                self.inner.log.record(&SessionEvent::InitSent);
            }
            Phase::AwaitingSubscriptionResult {
                subscribe_sent: false,
            } => {
                let subscribe = self.inner.profile.subscribe_message(&self.inner.home_id)?;
                self.send(subscribe).await?;
                self.phase = Phase::AwaitingSubscriptionResult {
                    subscribe_sent: true,
                };
                self.inner.log.record(&SessionEvent::SubscribeSent);
            }
            _ => {}
        }
        Ok(())
    }

    async fn dispatch(&mut self, frame: InboundFrame) {
        let log = &self.inner.log;

        match frame {
            InboundFrame::ConnectionAck => {
                if !matches!(self.phase, Phase::AwaitingAck { .. }) {
                    log.record(&SessionEvent::DuplicateAck);
                    return;
                }

                log.record(&SessionEvent::InitAcknowledged);
                self.phase = Phase::AwaitingSubscriptionResult {
                    subscribe_sent: false,
                };
                if let Err(e) = self.send_pending().await {
                    self.on_read_error(e).await;
                }
            }
            InboundFrame::SubscriptionSuccess { .. } => {
                log.record(&SessionEvent::SubscriptionSucceeded);
                self.phase = Phase::Streaming;
            }
            InboundFrame::Data(message) => {
                let cancel = &self.inner.cancel;
                let delivered = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    delivered = self.output.send(message) => delivered,
                };

                if delivered.is_err() {
                    log.record(&SessionEvent::ConsumerGone);
                    cancel.cancel();
                }
            }
            InboundFrame::SubscriptionFail { message, .. } => {
                log.record(&SessionEvent::SubscriptionFailed {
                    message: message.clone(),
                });
                self.inner
                    .state
                    .disconnected(WsError::SubscriptionFailed(message));
            }
            InboundFrame::Ping => {
                let answered = match self.inner.profile.pong_message() {
                    Ok(pong) => self.send(pong).await,
                    Err(e) => Err(e),
                };
                match answered {
                    Ok(()) => self.inner.log.record(&SessionEvent::PingAnswered),
                    Err(e) => self.on_read_error(e).await,
                }
            }
            InboundFrame::Unrecognized { kind } => {
                log.record(&SessionEvent::UnexpectedMessage { kind });
            }
        }
    }

    async fn on_read_error(&mut self, error: WsError) {
        let reconnect = &self.inner.config.reconnect;

        if error.is_close() {
            let retry_in = reconnect.close_reconnect_delay;
            let failure_delay = reconnect.close_reconnect_failure_delay;
            self.inner.log.record(&SessionEvent::CloseError {
                error: error.to_string(),
                retry_in,
            });
            self.inner.state.disconnected(error);

            if pause(&self.inner.cancel, retry_in).await {
                self.reconnect(failure_delay).await;
            }
            return;
        }

        self.unknown_errors = self.unknown_errors.saturating_add(1);
        let retry_in = reconnect.read_error_delay;
        let threshold = reconnect.read_error_threshold;
        let failure_delay = reconnect.forced_reconnect_failure_delay;
        self.inner.log.record(&SessionEvent::ReadError {
            consecutive: self.unknown_errors,
            error: error.to_string(),
            retry_in,
        });
        self.inner.state.disconnected(error);

        if !pause(&self.inner.cancel, retry_in).await {
            return;
        }

        if self.unknown_errors > threshold {
            self.inner.log.record(&SessionEvent::ForcedReconnect {
                consecutive: self.unknown_errors,
            });
            self.reconnect(failure_delay).await;
        }
    }

    /// Replaces the connection, waiting `failure_delay` if no new one could be established.
    async fn reconnect(&mut self, failure_delay: Duration) {
        if let Err(DialError::Exhausted) = self.connect().await {
            self.inner.log.record(&SessionEvent::ReconnectFailed {
                retry_in: failure_delay,
            });
            pause(&self.inner.cancel, failure_delay).await;
        }
    }

    /// Closes the current connection, then dials until an attempt succeeds, the configured
    /// attempts are used up or the stream is stopped.
    async fn connect(&mut self) -> Result<(), DialError> {
        self.release().await;

        let reconnect = &self.inner.config.reconnect;
        let mut backoff = Constant::from(reconnect);
        let mut attempt = 0_u32;

        loop {
            attempt = attempt.saturating_add(1);
            self.inner.log.record(&SessionEvent::Connecting {
                url: self.inner.url.clone(),
            });

            let dialed = tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => return Err(DialError::Cancelled),
                dialed = self.inner.connector.connect() => dialed,
            };

            match dialed {
                Ok(connection) => {
                    self.connection = Some(connection);
                    self.phase = Phase::AwaitingAck { init_sent: false };
                    self.inner.log.record(&SessionEvent::Connected);
                    self.inner.state.connected();
                    return Ok(());
                }
                Err(e) => {
                    if let Some(max) = reconnect.max_dial_attempts
                        && attempt >= max
                    {
                        self.inner
                            .log
                            .record(&SessionEvent::DialExhausted { attempts: attempt });
                        self.inner
                            .state
                            .disconnected(WsError::DialExhausted { attempts: attempt });
                        return Err(DialError::Exhausted);
                    }

                    let retry_in = backoff
                        .next_backoff()
                        .unwrap_or(reconnect.dial_retry_interval);
                    self.inner.log.record(&SessionEvent::DialFailed {
                        attempt,
                        error: e.to_string(),
                        retry_in,
                    });
                    if !pause(&self.inner.cancel, retry_in).await {
                        return Err(DialError::Cancelled);
                    }
                }
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<(), WsError> {
        match self.connection.as_mut() {
            Some(connection) => connection.send_text(text).await,
            None => Err(WsError::ConnectionClosed),
        }
    }

    async fn release(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
        }
        self.phase = Phase::AwaitingAck { init_sent: false };
    }
}
