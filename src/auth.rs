/// Secret string types that redact values in debug output for security.
pub use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Personal access token used against both the GraphQL API and the websocket subscription.
///
/// The value is kept in a [`SecretString`], so `Debug` output never reveals it. It is only
/// exposed when the init frame or an `Authorization` header is rendered.
#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct Token(SecretString);

impl Token {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self(SecretString::from(token))
    }

    /// Returns the secret.
    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.0
    }

    /// `Bearer <token>` header value for the GraphQL API.
    #[cfg(feature = "api")]
    pub(crate) fn bearer(&self) -> crate::Result<reqwest::header::HeaderValue> {
        let mut value =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", self.0.expose_secret()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl From<String> for Token {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl From<&str> for Token {
    fn from(token: &str) -> Self {
        Self::new(token.to_owned())
    }
}
