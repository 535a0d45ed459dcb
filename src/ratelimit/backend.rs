//! Admission trait for abstracting over rate limiter implementations.

use async_trait::async_trait;
use tokio::time::Instant;

use super::limiter::SlidingWindowLimiter;
use crate::error::Result;

/// Something that decides when a gated action may proceed.
///
/// The submission client only depends on this trait, so it never sees the
/// window length, the ledger, or how waiting is done.
#[async_trait]
pub trait Admission: Send + Sync {
    /// Wait for a free slot and return the instant it was granted.
    async fn acquire(&self) -> Result<Instant>;
}

#[async_trait]
impl Admission for SlidingWindowLimiter {
    async fn acquire(&self) -> Result<Instant> {
        SlidingWindowLimiter::acquire(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::ratelimit::TimeWindow;

    #[tokio::test]
    async fn test_limiter_through_trait_object() {
        let limiter: Arc<dyn Admission> =
            Arc::new(SlidingWindowLimiter::new(TimeWindow::Second, 3).unwrap());

        for _ in 0..3 {
            limiter.acquire().await.unwrap();
        }
    }
}
