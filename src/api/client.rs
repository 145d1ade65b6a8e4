use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::types::request::{
    CURRENT_PRICE_QUERY, GraphQlRequest, HOME_QUERY, HOMES_QUERY, HomeVariables,
    PUSH_NOTIFICATION_MUTATION, PushNotification, PushVariables, SUBSCRIPTION_URL_QUERY,
};
use super::types::response::{
    GraphQlResponse, Home, HomeViewer, HomesViewer, Price, PriceHome, PushData, PushResult,
    SubscriptionUrlViewer, ViewerData,
};
use crate::Result;
use crate::auth::Token;
use crate::error::Error;
use crate::ws::config::default_user_agent;

/// Tibber GraphQL endpoint.
pub const DEFAULT_HOST: &str = "https://api.tibber.com/v1-beta/gql";

/// One-shot client for the Tibber GraphQL API.
///
/// Every call is a single authenticated POST; nothing is cached.
///
/// # Example
///
/// ```no_run
/// use tibber_client_sdk::api::Client;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("token")?;
///
/// for home in client.homes().await? {
///     println!("{} live: {}", home.id, home.has_live_measurements());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    host: Url,
    client: ReqwestClient,
}

impl Client {
    /// Creates a client for the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP client fails to
    /// build.
    pub fn new<T: Into<Token>>(token: T) -> Result<Client> {
        Self::with_host(DEFAULT_HOST, token)
    }

    /// Creates a client for a custom GraphQL endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the host URL is invalid, the token is not a valid header value or
    /// the HTTP client fails to build.
    pub fn with_host<T: Into<Token>>(host: &str, token: T) -> Result<Client> {
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, HeaderValue::from_str(&default_user_agent())?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, token.into().bearer()?);
        let client = ReqwestClient::builder().default_headers(headers).build()?;

        Ok(Self {
            host: Url::parse(host)?,
            client,
        })
    }

    /// Returns the GraphQL endpoint.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    /// All homes of the account.
    pub async fn homes(&self) -> Result<Vec<Home>> {
        let data: ViewerData<HomesViewer> = self.execute(HOMES_QUERY, ()).await?;
        Ok(data.viewer.homes)
    }

    /// A single home.
    ///
    /// # Errors
    ///
    /// Returns a [`Kind::Status`](crate::error::Kind::Status) error with `404` if the account
    /// has no home with that id.
    pub async fn home(&self, id: &str) -> Result<Home> {
        let data: ViewerData<HomeViewer<Home>> =
            self.execute(HOME_QUERY, HomeVariables { id }).await?;

        data.viewer.home.ok_or_else(|| self.not_found("home"))
    }

    /// The price for the current hour at a home.
    pub async fn current_price(&self, home_id: &str) -> Result<Price> {
        let data: ViewerData<HomeViewer<PriceHome>> = self
            .execute(CURRENT_PRICE_QUERY, HomeVariables { id: home_id })
            .await?;

        data.viewer
            .home
            .and_then(|home| home.current_subscription)
            .and_then(|subscription| subscription.price_info)
            .and_then(|info| info.current)
            .ok_or_else(|| self.not_found("current price"))
    }

    /// The websocket endpoint live measurement subscriptions should dial.
    pub async fn subscription_url(&self) -> Result<Url> {
        let data: ViewerData<SubscriptionUrlViewer> =
            self.execute(SUBSCRIPTION_URL_QUERY, ()).await?;

        Ok(Url::parse(&data.viewer.websocket_subscription_url)?)
    }

    /// Sends a push notification that opens the app's home screen.
    pub async fn send_push_notification(&self, title: &str, message: &str) -> Result<PushResult> {
        let notification = PushNotification::builder()
            .title(title)
            .message(message)
            .build();

        self.send_notification(&notification).await
    }

    /// Sends a push notification to the account's devices.
    pub async fn send_notification(&self, notification: &PushNotification) -> Result<PushResult> {
        let data: PushData = self
            .execute(
                PUSH_NOTIFICATION_MUTATION,
                PushVariables {
                    input: notification,
                },
            )
            .await?;

        Ok(data.send_push_notification)
    }

    async fn execute<V: Serialize, T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: V,
    ) -> Result<T> {
        let request = self
            .client
            .request(Method::POST, self.host.clone())
            .json(&GraphQlRequest { query, variables })
            .build()?;

        let response: GraphQlResponse<T> = crate::request(&self.client, request).await?;
        response.into_data()
    }

    fn not_found(&self, what: &str) -> Error {
        Error::status(
            StatusCode::NOT_FOUND,
            Method::POST,
            self.host.path().to_owned(),
            format!("Unable to find {what}"),
        )
    }
}
