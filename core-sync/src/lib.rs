//! # Sync Module
//!
//! Re-synchronizes archived posts with their source.
//!
//! ## Overview
//!
//! This module drives single-item and batch re-synchronization:
//! - Running the extraction pipeline for a recorded post
//! - Diffing fresh data against the record and asking before visible changes
//! - Reconciling media slots through the backup engine
//! - Persisting through the record store and dispatching secondary waves
//!
//! ## Components
//!
//! - **Sync Job State Machine** (`job`): phases, counters and the cancellation handle
//! - **Diff** (`diff`): caption and media-count change detection
//! - **Timestamps** (`timestamp`): local civil time and caption dates
//! - **Record update** (`apply`): folding an extraction into a record
//! - **Prompts** (`prompt`): confirmation seam for single-item syncs
//! - **Sync Coordinator** (`coordinator`): single and batch runs

pub mod apply;
pub mod coordinator;
pub mod diff;
pub mod error;
pub mod job;
pub mod prompt;
pub mod timestamp;

pub use apply::apply_extraction;
pub use coordinator::{
    BatchOptions, BatchReport, PostSyncOutcome, PostSyncReport, SyncCoordinator,
};
pub use diff::PostDiff;
pub use error::{Result, SyncError};
pub use job::{ItemOutcome, JobCounters, JobHandle, JobPhase, SyncJob, SyncJobId};
pub use prompt::{Confirmation, ConfirmationPrompt, FixedAnswer, PostPreview};
pub use timestamp::{caption_date, local_date, local_stamp, LocalStamp};
