//! HTTP submission client for the registry.

mod auth;
mod http;

pub use auth::{StaticTokenProvider, TokenProvider};
pub use http::CrptClient;
