use super::types::request::{
    ConnectionInit, Pong, QueryPayload, SubscribeRequest, live_measurement_query,
};
use super::types::response::{DataPayload, InboundFrame, RawFrame, StreamMessage};
use crate::auth::Token;
use crate::ws::{MessageParser, WsError};

/// Every field of the current `liveMeasurement` schema.
const FULL_FIELDS: &[&str] = &[
    "timestamp",
    "power",
    "lastMeterConsumption",
    "lastMeterProduction",
    "accumulatedConsumption",
    "accumulatedCost",
    "accumulatedProduction",
    "accumulatedReward",
    "minPower",
    "averagePower",
    "maxPower",
    "powerProduction",
    "minPowerProduction",
    "maxPowerProduction",
    "voltagePhase1",
    "voltagePhase2",
    "voltagePhase3",
    "currentPhase1",
    "currentPhase2",
    "currentPhase3",
];

/// Fields served by the legacy endpoint.
const LEGACY_FIELDS: &[&str] = &[
    "timestamp",
    "power",
    "accumulatedConsumption",
    "accumulatedCost",
    "currency",
    "minPower",
    "averagePower",
    "maxPower",
];

/// Protocol generation spoken on the subscription socket.
///
/// Both generations share the handshake → subscribe → data flow and differ in host, message
/// names, subscription id and requested field set.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Profile {
    /// `graphql-transport-ws` on `websocket-api.tibber.com`
    #[default]
    GraphqlTransportWs,
    /// The original `graphql-subscriptions` protocol on `api.tibber.com`
    Legacy,
}

impl Profile {
    /// Default subscription endpoint.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::GraphqlTransportWs => "wss://websocket-api.tibber.com/v1-beta/gql/subscriptions",
            Self::Legacy => "wss://api.tibber.com/v1-beta/gql/subscriptions",
        }
    }

    /// Value of the `Sec-WebSocket-Protocol` request header.
    #[must_use]
    pub const fn subprotocol(self) -> &'static str {
        match self {
            Self::GraphqlTransportWs => "graphql-transport-ws",
            Self::Legacy => "graphql-subscriptions",
        }
    }

    /// Id attached to the single subscription started per connection.
    #[must_use]
    pub const fn subscription_id(self) -> &'static str {
        match self {
            Self::GraphqlTransportWs => "0",
            Self::Legacy => "1",
        }
    }

    /// `liveMeasurement` fields requested by the subscription document.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::GraphqlTransportWs => FULL_FIELDS,
            Self::Legacy => LEGACY_FIELDS,
        }
    }

    /// Renders the handshake request.
    pub fn init_message(self, token: &Token) -> Result<String, WsError> {
        let init = match self {
            Self::GraphqlTransportWs => ConnectionInit::with_token("connection_init", token),
            Self::Legacy => ConnectionInit::with_parameter("init", token),
        };
        Ok(serde_json::to_string(&init)?)
    }

    /// Renders the subscribe request for `home_id`.
    pub fn subscribe_message(self, home_id: &str) -> Result<String, WsError> {
        let query = live_measurement_query(home_id, self.fields());
        let request = SubscribeRequest {
            id: self.subscription_id(),
            kind: match self {
                Self::GraphqlTransportWs => "subscribe",
                Self::Legacy => "subscription_start",
            },
            payload: QueryPayload {
                query: &query,
                variables: None,
                extensions: None,
            },
        };
        Ok(serde_json::to_string(&request)?)
    }

    /// Renders the reply to a server ping.
    pub fn pong_message(self) -> Result<String, WsError> {
        Ok(serde_json::to_string(&Pong { kind: "pong" })?)
    }

    fn classify(self, raw: RawFrame) -> Result<InboundFrame, WsError> {
        let RawFrame { kind, id, payload } = raw;

        let frame = match (self, kind.as_str()) {
            (Self::GraphqlTransportWs, "connection_ack") | (Self::Legacy, "init_success") => {
                InboundFrame::ConnectionAck
            }
            (_, "subscription_success") => InboundFrame::SubscriptionSuccess { id },
            (Self::GraphqlTransportWs, "next") | (Self::Legacy, "subscription_data") => {
                let payload = payload.ok_or_else(|| {
                    WsError::InvalidMessage(format!("{kind} frame without payload"))
                })?;
                let data: DataPayload = serde_json::from_value(payload)?;
                let measurement = data
                    .data
                    .and_then(|data| data.live_measurement)
                    .ok_or_else(|| {
                        let errors = data
                            .errors
                            .unwrap_or_default()
                            .into_iter()
                            .map(|e| e.message)
                            .collect::<Vec<_>>();
                        WsError::InvalidMessage(format!(
                            "{kind} frame without liveMeasurement: {}",
                            errors.join("; ")
                        ))
                    })?;

                InboundFrame::Data(StreamMessage {
                    id: id.unwrap_or_default(),
                    measurement,
                })
            }
            (_, "subscription_fail") | (Self::GraphqlTransportWs, "error") => {
                InboundFrame::SubscriptionFail {
                    id,
                    message: payload.map(|p| p.to_string()).unwrap_or_default(),
                }
            }
            (Self::GraphqlTransportWs, "ping") => InboundFrame::Ping,
            _ => InboundFrame::Unrecognized { kind },
        };

        Ok(frame)
    }
}

impl MessageParser<InboundFrame> for Profile {
    fn parse(&self, text: &str) -> Result<InboundFrame, WsError> {
        let raw: RawFrame = serde_json::from_str(text)?;
        self.classify(raw)
    }
}
