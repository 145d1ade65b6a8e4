//! One-shot GraphQL API client.
//!
//! Covers the queries a live measurement consumer needs around the stream: listing homes to
//! find the home id, checking that a home has a real-time meter, looking up the subscription
//! URL and the current price, and sending push notifications.
//!
//! **Feature flag:** `api`

pub mod client;
pub mod types;

pub use client::{Client, DEFAULT_HOST};
