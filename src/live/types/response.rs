use std::collections::HashMap;

use bon::Builder;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DefaultOnNull, serde_as};

use crate::serde_helpers::StringFromAny;

/// One live measurement as pushed by the meter.
///
/// Every numeric field is optional on the wire: a missing or `null` value decodes to `0.0`, so
/// no field is guaranteed to be non-zero. Devices without per-phase sensors only report the
/// power and accumulated values.
#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Builder)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveMeasurement {
    /// When the measurement was taken, with the home's UTC offset
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Consumption at the moment (W)
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub power: f64,
    /// Last meter active import register state (kWh)
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub last_meter_consumption: f64,
    /// Last meter active export register state (kWh)
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub last_meter_production: f64,
    /// kWh consumed since midnight
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub accumulated_consumption: f64,
    /// Accumulated cost since midnight
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub accumulated_cost: f64,
    /// kWh produced since midnight
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub accumulated_production: f64,
    /// Accumulated reward since midnight
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub accumulated_reward: f64,
    /// Min consumption since midnight (W)
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub min_power: f64,
    /// Average consumption since midnight (W)
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub average_power: f64,
    /// Peak consumption since midnight (W)
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub max_power: f64,
    /// Net production at the moment (W)
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub power_production: f64,
    /// Min net production since midnight (W)
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub min_power_production: f64,
    /// Max net production since midnight (W)
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub max_power_production: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub voltage_phase1: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub voltage_phase2: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub voltage_phase3: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub current_phase1: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub current_phase2: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[builder(default)]
    pub current_phase3: f64,
    /// Currency of the accumulated cost, only requested by the legacy profile
    pub currency: Option<String>,
}

impl LiveMeasurement {
    /// Whether this is an extended report, i.e. it carries at least one phase current.
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.current_phase1 > 0.0 || self.current_phase2 > 0.0 || self.current_phase3 > 0.0
    }

    /// Whether the report contains a consumption reading.
    #[must_use]
    pub fn has_power(&self) -> bool {
        self.power > 0.0
    }

    /// Whether the report contains a consumption or a production reading.
    #[must_use]
    pub fn has_production_or_consumption_power(&self) -> bool {
        self.power > 0.0 || self.power_production > 0.0
    }

    /// Projects the measurement onto the flat meter key set used by energy managers
    /// (`p_import`, `e_import`, `u1`, `i1`, ...).
    #[must_use]
    pub fn as_float_map(&self) -> HashMap<&'static str, f64> {
        HashMap::from([
            ("p_import", self.power),
            ("e_import", self.last_meter_consumption),
            ("e_export", self.last_meter_production),
            ("last_e_import", self.accumulated_consumption),
            ("last_e_export", self.accumulated_production),
            ("p_import_min", self.min_power),
            ("p_import_avg", self.average_power),
            ("p_import_max", self.max_power),
            ("p_export", self.power_production),
            ("p_export_min", self.min_power_production),
            ("p_export_max", self.max_power_production),
            ("u1", self.voltage_phase1),
            ("u2", self.voltage_phase2),
            ("u3", self.voltage_phase3),
            ("i1", self.current_phase1),
            ("i2", self.current_phase2),
            ("i3", self.current_phase3),
        ])
    }
}

/// A decoded data frame, the only thing delivered to the output channel.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMessage {
    /// Subscription id the server echoed
    pub id: String,
    pub measurement: LiveMeasurement,
}

/// One classified inbound protocol frame.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Handshake accepted (`connection_ack` / `init_success`)
    ConnectionAck,
    /// Subscription accepted
    SubscriptionSuccess { id: Option<String> },
    /// Measurement pushed for the subscription (`next` / `subscription_data`)
    Data(StreamMessage),
    /// Subscription rejected
    SubscriptionFail { id: Option<String>, message: String },
    /// Keep-alive ping that expects a pong (graphql-transport-ws)
    Ping,
    /// Anything else; logged and ignored
    Unrecognized { kind: String },
}

/// Envelope shared by every inbound message of both protocol generations.
#[serde_as]
#[derive(Debug, Deserialize)]
pub(crate) struct RawFrame {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde_as(as = "Option<StringFromAny>")]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) payload: Option<Value>,
}

/// `payload` of a data frame.
#[derive(Debug, Deserialize)]
pub(crate) struct DataPayload {
    #[serde(default)]
    pub(crate) data: Option<MeasurementData>,
    #[serde(default)]
    pub(crate) errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MeasurementData {
    pub(crate) live_measurement: Option<LiveMeasurement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub(crate) message: String,
}
