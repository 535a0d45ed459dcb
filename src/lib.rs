//! crpt-api - Rate-limited CRPT registry client
//!
//! This crate submits goods documents to the CRPT "create document" API while
//! keeping the number of submissions inside a sliding time window. The
//! [`ratelimit::SlidingWindowLimiter`] is the core; the [`client`] and
//! [`document`] modules build and send the actual requests.

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod ratelimit;

pub use client::CrptClient;
pub use config::CrptConfig;
pub use document::{Description, Document, Product};
pub use error::{CancelReason, CrptError, Result};
pub use ratelimit::{Admission, SlidingWindowLimiter, TimeWindow};
