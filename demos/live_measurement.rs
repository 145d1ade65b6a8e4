//! Streams live measurements for one home.
//!
//! Prints the first `LIMIT` measurements (default 10) together with every connection state
//! change, then stops the stream.
//!
//! Run with tracing enabled:
//! ```sh
//! TIBBER_TOKEN=... TIBBER_HOME_ID=... RUST_LOG=info,tibber_client_sdk=debug cargo run --example live_measurement --features tracing
//! ```

use std::time::Duration;

use anyhow::Context as _;
use futures::StreamExt as _;
use tibber_client_sdk::live::Stream;
use tibber_client_sdk::{HOME_ID_VAR, TOKEN_VAR};
use tokio::time::timeout;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let token = std::env::var(TOKEN_VAR).with_context(|| format!("{TOKEN_VAR} is not set"))?;
    let home_id = std::env::var(HOME_ID_VAR).with_context(|| format!("{HOME_ID_VAR} is not set"))?;
    let limit = std::env::var("LIMIT")
        .ok()
        .and_then(|limit| limit.parse::<usize>().ok())
        .unwrap_or(10);

    let stream = Stream::new(home_id, token);

    let mut states = stream.state_receiver();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            info!(
                status = %state.status,
                error = ?state.error.as_deref().map(ToString::to_string),
                "state changed"
            );
        }
    });

    let mut measurements = Box::pin(stream.measurements(32)?);
    let mut received = 0;

    while received < limit {
        match timeout(Duration::from_secs(60), measurements.next()).await {
            Ok(Some(message)) => {
                let measurement = &message.measurement;
                info!(
                    timestamp = ?measurement.timestamp,
                    power = measurement.power,
                    power_production = measurement.power_production,
                    accumulated_consumption = measurement.accumulated_consumption,
                    extended = measurement.is_extended(),
                    "measurement"
                );
                received += 1;
            }
            Ok(None) => break,
            Err(_) => warn!("no measurement for 60 seconds"),
        }
    }

    stream.stop();
    info!(received, "stopped");

    Ok(())
}
