//! # Media Backup
//!
//! Keeps stored copies of post media durable across a primary and a
//! secondary storage provider.
//!
//! - [`HealthChecker`] - is a stored locator still serving media?
//! - [`DualUploader`] - awaited primary upload, best-effort secondary copy
//! - [`ReconciliationEngine`] - per-slot Reuse / ReuseSecondary / Reupload
//! - [`SecondaryWave`] - detached write-back of secondary locators
//!
//! Partial success is the normal case, so reconciliation reports counts
//! rather than a single pass/fail flag.

pub mod error;
pub mod health;
pub mod reconcile;
pub mod uploader;
pub mod wave;

pub use error::{BackupError, Result};
pub use health::{HealthCheck, HealthChecker, ProbeOutcome};
pub use reconcile::{
    ReconcileOptions, ReconcileOutcome, ReconcileStats, ReconciliationDecision,
    ReconciliationEngine,
};
pub use uploader::{DualUploader, SecondaryHandle, UploadMode, UploadReceipt};
pub use wave::{
    PendingSecondaries, PendingSecondary, RepositoryRecorder, SecondaryLocator,
    SecondaryRecorder, SecondaryWave, SlotField, WaveReport,
};
