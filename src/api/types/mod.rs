pub mod request;
pub mod response;

pub use request::{AppScreen, PushNotification};
pub use response::{Address, Home, HomeFeatures, Price, PriceLevel, PushResult};
