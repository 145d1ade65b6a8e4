#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests, and https://github.com/rust-lang/rust-clippy/issues/13981"
)]
#![allow(
    unused,
    reason = "Not every test file uses every helper"
)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tibber_client_sdk::live::{EventLog, Profile, SessionEvent, Stream};
use tibber_client_sdk::ws::config::Config;
use tibber_client_sdk::ws::{Connection, Connector, WsError};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite;

pub const HOME_ID: &str = "96a14971-525a-4420-aae9-e5aedaa129ff";
pub const TOKEN: &str = "5K4MVS-OjfWhK_4yrjOlFe1F6kJXPVf7eQYggo8ebAE";

/// What a scripted connection yields on each read.
#[derive(Debug)]
pub enum Step {
    Text(String),
    Fail(WsError),
    Panic(&'static str),
}

/// Outcome of one write on a scripted connection.
#[derive(Debug)]
pub enum Write {
    Ok,
    Fail(WsError),
}

/// Outcome of one dial attempt.
#[derive(Debug)]
pub enum Dial {
    Refuse,
    /// Connects; reads yield the steps in order, then block forever
    Accept(Vec<Step>),
    /// Like [`Dial::Accept`], but writes follow their own script. Writes past its end succeed.
    AcceptWithWrites { reads: Vec<Step>, writes: Vec<Write> },
}

/// Everything the scripted transport observed.
#[derive(Debug, Default)]
pub struct Transcript {
    attempts: AtomicU32,
    closes: AtomicU32,
    drops: AtomicU32,
    sent: Mutex<Vec<String>>,
}

impl Transcript {
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> u32 {
        self.drops.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Sent frames parsed as JSON.
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .collect()
    }

    pub fn sent_of_type(&self, kind: &str) -> usize {
        self.sent_json()
            .iter()
            .filter(|frame| frame["type"] == kind)
            .count()
    }
}

/// A [`Connector`] that replays a fixed script. Once the script is used up, further dials
/// never complete.
pub struct ScriptedConnector {
    dials: Mutex<VecDeque<Dial>>,
    transcript: Arc<Transcript>,
}

impl ScriptedConnector {
    pub fn new(dials: Vec<Dial>) -> (Self, Arc<Transcript>) {
        let transcript = Arc::new(Transcript::default());
        let connector = Self {
            dials: Mutex::new(dials.into()),
            transcript: Arc::clone(&transcript),
        };
        (connector, transcript)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    async fn connect(&self) -> Result<ScriptedConnection, WsError> {
        self.transcript.attempts.fetch_add(1, Ordering::SeqCst);
        let dial = self.dials.lock().unwrap().pop_front();

        match dial {
            Some(Dial::Refuse) => Err(WsError::Connection(tungstenite::Error::Io(
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            ))),
            Some(Dial::Accept(steps)) => Ok(ScriptedConnection::new(
                steps,
                Vec::new(),
                Arc::clone(&self.transcript),
            )),
            Some(Dial::AcceptWithWrites { reads, writes }) => Ok(ScriptedConnection::new(
                reads,
                writes,
                Arc::clone(&self.transcript),
            )),
            None => std::future::pending().await,
        }
    }
}

/// `Send` but not `Sync`, which is all the router may rely on.
pub struct ScriptedConnection {
    steps: VecDeque<Step>,
    writes: VecDeque<Write>,
    transcript: Arc<Transcript>,
    _unsync: PhantomData<Cell<()>>,
}

impl ScriptedConnection {
    fn new(steps: Vec<Step>, writes: Vec<Write>, transcript: Arc<Transcript>) -> Self {
        Self {
            steps: steps.into(),
            writes: writes.into(),
            transcript,
            _unsync: PhantomData,
        }
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    /// Only successful writes end up in the transcript.
    async fn send_text(&mut self, text: String) -> Result<(), WsError> {
        if let Some(Write::Fail(error)) = self.writes.pop_front() {
            return Err(error);
        }
        self.transcript.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Result<String, WsError> {
        match self.steps.pop_front() {
            Some(Step::Text(text)) => Ok(text),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Panic(reason)) => panic!("{reason}"),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.transcript.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        self.transcript.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Keeps every event together with the (paused) time it was recorded at.
#[derive(Debug, Default)]
pub struct RecordingLog {
    events: Mutex<Vec<(Instant, SessionEvent)>>,
}

impl EventLog for RecordingLog {
    fn record(&self, event: &SessionEvent) {
        self.events
            .lock()
            .unwrap()
            .push((Instant::now(), event.clone()));
    }
}

impl RecordingLog {
    pub fn events(&self) -> Vec<(Instant, SessionEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count<F: Fn(&SessionEvent) -> bool>(&self, predicate: F) -> usize {
        self.events()
            .iter()
            .filter(|(_, event)| predicate(event))
            .count()
    }

    /// Times of the events matching `predicate`, in order.
    pub fn times<F: Fn(&SessionEvent) -> bool>(&self, predicate: F) -> Vec<Instant> {
        self.events()
            .into_iter()
            .filter(|(_, event)| predicate(event))
            .map(|(at, _)| at)
            .collect()
    }
}

pub struct Harness {
    pub stream: Stream<ScriptedConnector>,
    pub transcript: Arc<Transcript>,
    pub log: Arc<RecordingLog>,
}

pub fn harness(dials: Vec<Dial>, profile: Profile, config: Config) -> Harness {
    let (connector, transcript) = ScriptedConnector::new(dials);
    let log = Arc::new(RecordingLog::default());
    let stream = Stream::with_connector(
        HOME_ID,
        TOKEN,
        profile,
        config,
        connector,
        Arc::clone(&log) as Arc<dyn EventLog>,
    );

    Harness {
        stream,
        transcript,
        log,
    }
}

pub fn text(frame: &Value) -> Step {
    Step::Text(frame.to_string())
}

pub fn ack() -> Step {
    text(&json!({"type": "connection_ack"}))
}

pub fn subscribed() -> Step {
    text(&json!({"type": "subscription_success", "id": "0"}))
}

pub fn next(power: f64) -> Step {
    text(&json!({
        "id": "0",
        "type": "next",
        "payload": {"data": {"liveMeasurement": {
            "timestamp": "2024-03-01T10:15:30.000+01:00",
            "power": power,
            "accumulatedConsumption": 8.5,
            "currentPhase1": null
        }}}
    }))
}
