//! Sliding-window rate limiter implementation.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::ledger::Ledger;
use super::window::TimeWindow;
use crate::error::{CancelReason, CrptError, Result};

/// Outcome of one evaluation of the ledger under the lock.
enum Decision {
    /// A slot was free and has been recorded at this instant.
    Admitted(Instant),
    /// The window is full; retry once this instant has passed. `None` means
    /// the oldest entry never expires within the clock's range.
    WaitUntil(Option<Instant>),
}

/// A rate limiter admitting at most `capacity` acquisitions within any
/// trailing window of length `window`.
///
/// The ledger of admission instants is the only shared state and is guarded
/// by a single mutex that is never held across an await point. Waiting
/// callers sleep outside the lock until the oldest entry is due to expire,
/// then re-evaluate. Admission order is not FIFO; whichever waiter observes
/// capacity first proceeds.
///
/// This struct is thread-safe and can be shared across tasks behind an `Arc`.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    /// Length of the trailing window
    window: Duration,
    /// Maximum admissions per window
    capacity: usize,
    /// Admission instants, oldest first
    ledger: Mutex<Ledger>,
    /// Set once the limiter is closed; wakes every waiter
    closed: watch::Sender<bool>,
}

impl SlidingWindowLimiter {
    /// Create a limiter allowing `capacity` acquisitions per `window` unit.
    ///
    /// Fails with [`CrptError::Config`] if `capacity` is not positive.
    pub fn new(window: TimeWindow, capacity: i64) -> Result<Self> {
        Self::with_duration(window.duration(), capacity)
    }

    /// Create a limiter with an arbitrary window length.
    pub fn with_duration(window: Duration, capacity: i64) -> Result<Self> {
        if capacity <= 0 {
            return Err(CrptError::Config(format!(
                "request limit must be positive, got {}",
                capacity
            )));
        }
        if window.is_zero() {
            return Err(CrptError::Config("window must be non-zero".to_string()));
        }
        let capacity = usize::try_from(capacity)
            .map_err(|_| CrptError::Config(format!("request limit {} is too large", capacity)))?;

        debug!(
            window_ms = window.as_millis() as u64,
            capacity = capacity,
            "Creating sliding window limiter"
        );

        let (closed, _) = watch::channel(false);
        Ok(Self {
            window,
            capacity,
            ledger: Mutex::new(Ledger::new()),
            closed,
        })
    }

    /// Wait until a slot is free, record it, and return its instant.
    ///
    /// Waits as long as needed. Dropping the returned future abandons the
    /// wait without recording anything.
    ///
    /// # Errors
    ///
    /// Returns [`CrptError::Cancelled`] with [`CancelReason::LimiterClosed`]
    /// if the limiter is closed before a slot is obtained.
    pub async fn acquire(&self) -> Result<Instant> {
        self.acquire_until(std::future::pending()).await
    }

    /// Like [`acquire`](Self::acquire), but gives up when `signal` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`CrptError::Cancelled`] with [`CancelReason::Signal`] if the
    /// signal fires first, or [`CancelReason::LimiterClosed`] if the limiter
    /// is closed. No ledger entry is recorded in either case.
    pub async fn acquire_until<F>(&self, signal: F) -> Result<Instant>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);
        let mut closed = self.closed.subscribe();

        loop {
            if self.is_closed() {
                return Err(CrptError::Cancelled(CancelReason::LimiterClosed));
            }

            let deadline = match self.evaluate() {
                Decision::Admitted(at) => return Ok(at),
                Decision::WaitUntil(deadline) => deadline,
            };

            trace!(
                wait_ms = deadline.map(|d| d.saturating_duration_since(Instant::now()).as_millis() as u64),
                "Window full, waiting for oldest slot to expire"
            );

            let expiry = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = expiry => {}
                _ = &mut signal => {
                    debug!("Acquire cancelled by signal");
                    return Err(CrptError::Cancelled(CancelReason::Signal));
                }
                _ = closed.wait_for(|closed| *closed) => {
                    debug!("Acquire cancelled, limiter closed");
                    return Err(CrptError::Cancelled(CancelReason::LimiterClosed));
                }
            }
        }
    }

    /// Take a slot if one is free right now, without waiting.
    pub fn try_acquire(&self) -> Option<Instant> {
        if self.is_closed() {
            return None;
        }
        match self.evaluate() {
            Decision::Admitted(at) => Some(at),
            Decision::WaitUntil(_) => None,
        }
    }

    /// Close the limiter, releasing every waiter with a cancellation error.
    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            debug!("Sliding window limiter closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Number of admissions still inside the trailing window.
    pub fn in_flight(&self) -> usize {
        let mut ledger = self.ledger.lock();
        ledger.prune(Instant::now(), self.window);
        ledger.len()
    }

    /// Prune, check, and possibly record, all inside one critical section.
    fn evaluate(&self) -> Decision {
        let mut ledger = self.ledger.lock();
        // Read the clock under the lock so recorded instants stay ordered.
        let now = Instant::now();
        let pruned = ledger.prune(now, self.window);
        if pruned > 0 {
            trace!(pruned = pruned, "Pruned expired ledger entries");
        }

        if ledger.len() < self.capacity {
            ledger.record(now);
            trace!(in_flight = ledger.len(), "Slot acquired");
            return Decision::Admitted(now);
        }

        Decision::WaitUntil(ledger.next_expiry(self.window))
    }
}
