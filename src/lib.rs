//! Workspace placeholder crate.
//!
//! Exposes a single feature flag that pulls in the `core-service` facade with its
//! desktop wiring. Host applications can depend on `post-archive-workspace` instead
//! of wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;
