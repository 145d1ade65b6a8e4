use bon::Builder;
use serde::Serialize;

pub(crate) const HOMES_QUERY: &str = "{
  viewer {
    homes {
      id
      appNickname
      timeZone
      address { address1 postalCode city country }
      features { realTimeConsumptionEnabled }
    }
  }
}";

pub(crate) const HOME_QUERY: &str = "query Home($id: ID!) {
  viewer {
    home(id: $id) {
      id
      appNickname
      timeZone
      address { address1 postalCode city country }
      features { realTimeConsumptionEnabled }
    }
  }
}";

pub(crate) const CURRENT_PRICE_QUERY: &str = "query CurrentPrice($id: ID!) {
  viewer {
    home(id: $id) {
      currentSubscription {
        priceInfo {
          current { total energy tax startsAt level currency }
        }
      }
    }
  }
}";

pub(crate) const SUBSCRIPTION_URL_QUERY: &str = "{ viewer { websocketSubscriptionUrl } }";

pub(crate) const PUSH_NOTIFICATION_MUTATION: &str =
    "mutation Push($input: PushNotificationInput!) {
  sendPushNotification(input: $input) {
    successful
    pushedToNumberOfDevices
  }
}";

/// Body of a GraphQL POST.
#[derive(Debug, Serialize)]
pub(crate) struct GraphQlRequest<V> {
    pub(crate) query: &'static str,
    pub(crate) variables: V,
}

#[derive(Debug, Serialize)]
pub(crate) struct HomeVariables<'id> {
    pub(crate) id: &'id str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PushVariables<'input> {
    pub(crate) input: &'input PushNotification,
}

/// Screen of the Tibber app opened when the notification is tapped.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppScreen {
    #[default]
    Home,
    Reports,
    Consumption,
    Comparison,
    Disaggregation,
    HomeProfile,
    CustomerProfile,
    MeterReading,
    Notifications,
    Invoices,
}

/// A push notification to the account's devices.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct PushNotification {
    #[builder(into)]
    pub title: String,
    #[builder(into)]
    pub message: String,
    #[builder(default)]
    pub screen_to_open: AppScreen,
}
