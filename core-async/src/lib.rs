//! Async facade for the post archive core.
//!
//! Domain crates depend on this crate instead of naming tokio directly, so the
//! executor-facing surface (spawning, timers, locks, cancellation) lives in one
//! place.
//!
//! # Modules
//!
//! - `task`: Task spawning and joining
//! - `time`: Sleep, timeout, duration and instant
//! - `sync`: Locks, channels, semaphores and cooperative cancellation
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(5)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
