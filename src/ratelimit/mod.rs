//! Rate limiting logic and state management.

mod backend;
mod ledger;
mod limiter;
mod window;

pub use backend::Admission;
pub use limiter::SlidingWindowLimiter;
pub use window::TimeWindow;
