use std::fmt::Write as _;

use secrecy::ExposeSecret as _;
use serde::Serialize;

use crate::auth::Token;

/// Handshake request carrying the credential.
///
/// # Security
///
/// The serialized form contains the token in plaintext. It is only ever written to the
/// socket and never logged.
#[derive(Debug, Serialize)]
pub(crate) struct ConnectionInit<'token> {
    #[serde(rename = "type")]
    pub(crate) kind: &'static str,
    pub(crate) payload: InitPayload<'token>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum InitPayload<'token> {
    /// `{"token": "..."}` (graphql-transport-ws)
    Token { token: &'token str },
    /// `"token=..."` (legacy)
    Parameter(String),
}

impl<'token> ConnectionInit<'token> {
    pub(crate) fn with_token(kind: &'static str, token: &'token Token) -> Self {
        Self {
            kind,
            payload: InitPayload::Token {
                token: token.secret().expose_secret(),
            },
        }
    }

    pub(crate) fn with_parameter(kind: &'static str, token: &Token) -> Self {
        Self {
            kind,
            payload: InitPayload::Parameter(format!("token={}", token.secret().expose_secret())),
        }
    }
}

/// Subscribe/start envelope around the GraphQL document.
#[derive(Debug, Serialize)]
pub(crate) struct SubscribeRequest<'query> {
    pub(crate) id: &'static str,
    #[serde(rename = "type")]
    pub(crate) kind: &'static str,
    pub(crate) payload: QueryPayload<'query>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryPayload<'query> {
    pub(crate) query: &'query str,
    pub(crate) variables: Option<()>,
    pub(crate) extensions: Option<()>,
}

/// Outbound pong answering a server ping (graphql-transport-ws).
#[derive(Debug, Serialize)]
pub(crate) struct Pong {
    #[serde(rename = "type")]
    pub(crate) kind: &'static str,
}

/// Renders the `liveMeasurement` subscription document for one home.
///
/// The home id is embedded as a quoted, escaped string literal, so ids containing quotes or
/// control characters cannot break out of the argument.
pub(crate) fn live_measurement_query(home_id: &str, fields: &[&str]) -> String {
    // A &str always serializes; the fallback keeps the document well-formed regardless.
    let home_id = serde_json::to_string(home_id).unwrap_or_else(|_| "\"\"".to_owned());

    let mut query = format!("subscription {{\n  liveMeasurement(homeId:{home_id}) {{\n");
    for field in fields {
        let _ = writeln!(query, "    {field}");
    }
    query.push_str("  }\n}");
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_lists_requested_fields() {
        let query = live_measurement_query(
            "96a14971-525a-4420-aae9-e5aedaa129ff",
            &["timestamp", "power"],
        );

        assert_eq!(
            query,
            "subscription {\n  liveMeasurement(homeId:\"96a14971-525a-4420-aae9-e5aedaa129ff\") {\n    timestamp\n    power\n  }\n}"
        );
    }

    #[test]
    fn query_escapes_home_id() {
        let query = live_measurement_query("a\"){ viewer { name } }\n", &["power"]);

        assert!(
            query.contains(r#"homeId:"a\"){ viewer { name } }\n""#),
            "home id not escaped: {query}"
        );
    }

    #[test]
    fn init_payload_shapes() {
        let token = Token::from("se\"cret");

        let current = serde_json::to_string(&ConnectionInit::with_token("connection_init", &token))
            .expect("serializable");
        assert_eq!(
            current,
            r#"{"type":"connection_init","payload":{"token":"se\"cret"}}"#
        );

        let legacy = serde_json::to_string(&ConnectionInit::with_parameter("init", &token))
            .expect("serializable");
        assert_eq!(legacy, r#"{"type":"init","payload":"token=se\"cret"}"#);
    }

    #[test]
    fn subscribe_envelope_escapes_query() {
        let query = live_measurement_query("home", &["power"]);
        let request = SubscribeRequest {
            id: "0",
            kind: "subscribe",
            payload: QueryPayload {
                query: &query,
                variables: None,
                extensions: None,
            },
        };

        let text = serde_json::to_string(&request).expect("serializable");
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");

        assert_eq!(value["id"], "0");
        assert_eq!(value["type"], "subscribe");
        assert_eq!(value["payload"]["query"], query.as_str());
        assert!(value["payload"]["variables"].is_null(), "variables is null");
        assert!(value["payload"]["extensions"].is_null(), "extensions is null");
    }
}
