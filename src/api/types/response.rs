use bon::Builder;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use strum_macros::Display;

use crate::error::Error;

/// Envelope of every GraphQL response.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub(crate) data: Option<T>,
    pub(crate) errors: Option<Vec<GraphQlMessage>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlMessage {
    pub(crate) message: String,
}

impl<T> GraphQlResponse<T> {
    /// Returns `data`, or the reported errors when there are any.
    pub(crate) fn into_data(self) -> crate::Result<T> {
        if let Some(errors) = self.errors
            && !errors.is_empty()
        {
            return Err(Error::graphql(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        self.data
            .ok_or_else(|| Error::graphql(vec!["response contained no data".to_owned()]))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewerData<T> {
    pub(crate) viewer: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HomesViewer {
    pub(crate) homes: Vec<Home>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HomeViewer<T> {
    pub(crate) home: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriptionUrlViewer {
    pub(crate) websocket_subscription_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PriceHome {
    pub(crate) current_subscription: Option<CurrentSubscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CurrentSubscription {
    pub(crate) price_info: Option<PriceInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriceInfo {
    pub(crate) current: Option<Price>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PushData {
    pub(crate) send_push_notification: PushResult,
}

/// A home registered on the account.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    #[builder(into)]
    pub id: String,
    pub app_nickname: Option<String>,
    pub time_zone: Option<String>,
    pub address: Option<Address>,
    pub features: Option<HomeFeatures>,
}

impl Home {
    /// Whether a Pulse or Watty is paired, i.e. the home has a live measurement stream.
    #[must_use]
    pub fn has_live_measurements(&self) -> bool {
        self.features
            .as_ref()
            .is_some_and(|f| f.real_time_consumption_enabled)
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address1: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeatures {
    #[serde(default)]
    #[builder(default)]
    pub real_time_consumption_enabled: bool,
}

/// Price level relative to the trailing average.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceLevel {
    VeryCheap,
    Cheap,
    Normal,
    Expensive,
    VeryExpensive,
    /// A level this client does not know yet
    #[serde(other)]
    Unknown,
}

/// The electricity price for the current hour.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Energy plus tax
    pub total: Option<f64>,
    /// Nord Pool spot price
    pub energy: Option<f64>,
    pub tax: Option<f64>,
    pub starts_at: Option<DateTime<FixedOffset>>,
    pub level: Option<PriceLevel>,
    #[builder(into)]
    pub currency: String,
}

/// Outcome of a push notification.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct PushResult {
    pub successful: bool,
    pub pushed_to_number_of_devices: u32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Kind;

    #[test]
    fn errors_take_precedence_over_data() {
        let response: GraphQlResponse<ViewerData<HomesViewer>> = serde_json::from_value(json!({
            "data": {"viewer": {"homes": []}},
            "errors": [{"message": "first"}, {"message": "second"}]
        }))
        .expect("valid response");

        let err = response.into_data().expect_err("errors present");
        assert_eq!(err.kind(), Kind::GraphQl);
        assert_eq!(err.to_string(), "GraphQl: graphql errors: first; second");
    }

    #[test]
    fn missing_data_is_an_error() {
        let response: GraphQlResponse<ViewerData<HomesViewer>> =
            serde_json::from_value(json!({"data": null})).expect("valid response");

        let err = response.into_data().expect_err("no data");
        assert_eq!(err.kind(), Kind::GraphQl);
    }

    #[test]
    fn unknown_price_levels_are_tolerated() {
        let price: Price = serde_json::from_value(json!({
            "total": 1.2,
            "energy": 0.9,
            "tax": 0.3,
            "startsAt": "2024-03-01T10:00:00.000+01:00",
            "level": "EXTREMELY_CHEAP",
            "currency": "NOK"
        }))
        .expect("valid price");

        assert_eq!(price.level, Some(PriceLevel::Unknown));
        assert_eq!(PriceLevel::VeryExpensive.to_string(), "VERY_EXPENSIVE");
    }

    #[test]
    fn live_measurement_feature_flag() {
        let home = Home::builder()
            .id("home")
            .features(
                HomeFeatures::builder()
                    .real_time_consumption_enabled(true)
                    .build(),
            )
            .build();

        assert!(home.has_live_measurements());
        assert!(!Home::builder().id("home").build().has_live_measurements());
    }
}
