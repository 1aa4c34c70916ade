//! Time-related operations.
//!
//! `timeout` bounds every health probe; `sleep` paces batch runs.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, timeout, Duration};
//!
//! async fn example() {
//!     let result = timeout(Duration::from_millis(50), sleep(Duration::from_secs(5))).await;
//!     assert!(result.is_err());
//! }
//! ```

pub use tokio::time::{error::Elapsed, sleep, timeout};

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_elapses() {
        let result = timeout(Duration::from_millis(10), sleep(Duration::from_secs(5))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_timeout_passes_through_value() {
        let result = timeout(Duration::from_secs(1), async { 7 }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
