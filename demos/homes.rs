//! Lists the account's homes with their live measurement capability and current price.
//!
//! Run with tracing enabled:
//! ```sh
//! TIBBER_TOKEN=... RUST_LOG=info,hyper_util=off,hyper=off,reqwest=off,rustls=off cargo run --example homes --features api,tracing
//! ```

use anyhow::Context as _;
use tibber_client_sdk::TOKEN_VAR;
use tibber_client_sdk::api::Client;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let token = std::env::var(TOKEN_VAR).with_context(|| format!("{TOKEN_VAR} is not set"))?;
    let client = Client::new(token)?;

    match client.subscription_url().await {
        Ok(url) => info!(endpoint = "subscription_url", %url),
        Err(e) => error!(endpoint = "subscription_url", error = %e),
    }

    let homes = client.homes().await?;
    info!(endpoint = "homes", count = homes.len());

    for home in &homes {
        info!(
            endpoint = "homes",
            id = %home.id,
            nickname = ?home.app_nickname,
            live_measurements = home.has_live_measurements()
        );

        match client.current_price(&home.id).await {
            Ok(price) => info!(
                endpoint = "current_price",
                home = %home.id,
                total = ?price.total,
                level = ?price.level.map(|level| level.to_string()),
                currency = %price.currency
            ),
            Err(e) => error!(endpoint = "current_price", home = %home.id, error = %e),
        }
    }

    Ok(())
}
