//! HTTP backend and auth client for the Presto store API.
//!
//! The API stores the whole document as JSON and exchanges credentials for
//! bearer tokens.

pub mod auth;
pub mod client;

pub use auth::AuthClient;
pub use client::{ApiConfig, HttpBackend};
