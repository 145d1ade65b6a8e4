#![cfg_attr(doc, doc = include_str!("../README.md"))]

#[cfg(feature = "api")]
pub mod api;
pub mod auth;
pub mod error;
pub mod live;
pub(crate) mod serde_helpers;
pub mod ws;

#[cfg(feature = "api")]
use reqwest::Request;
#[cfg(feature = "api")]
use serde::de::DeserializeOwned;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Environment variable conventionally holding the personal access token.
pub const TOKEN_VAR: &str = "TIBBER_TOKEN";

/// Environment variable conventionally holding the home id to subscribe to.
pub const HOME_ID_VAR: &str = "TIBBER_HOME_ID";

#[cfg(feature = "api")]
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip(client, request),
        fields(
            method = %request.method(),
            path = request.url().path(),
            status_code
        )
    )
)]
async fn request<Response: DeserializeOwned>(
    client: &reqwest::Client,
    request: Request,
) -> Result<Response> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    let response = client.execute(request).await?;
    let status_code = response.status();

    #[cfg(feature = "tracing")]
    tracing::Span::current().record("status_code", status_code.as_u16());

    if !status_code.is_success() {
        let message = response.text().await.unwrap_or_default();

        #[cfg(feature = "tracing")]
        tracing::warn!(
            status = %status_code,
            method = %method,
            path = %path,
            message = %message,
            "API request failed"
        );

        return Err(Error::status(status_code, method, path, message));
    }

    let json_value = response.json::<serde_json::Value>().await?;
    serde_helpers::deserialize_with_warnings(json_value)
}
