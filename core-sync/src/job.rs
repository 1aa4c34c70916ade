//! # Sync Job State Machine
//!
//! Tracks one sync run: its phase, its counters and the cancellation flag.
//!
//! ## State Machine
//!
//! ```text
//! Idle → Extracting → DiffPending → Reconciling → Persisting → Done
//!           ↑  ↺          │   │                        │
//!           └─────────────┘   └──────────→ Persisting  │
//!           └──────────────────────────────────────────┘
//!
//! any non-terminal phase → Cancelled
//! ```
//!
//! Batches loop back to `Extracting` for the next item. The cancellation flag
//! lives in a [`JobHandle`]; it is the only part of a job touched from outside
//! the run that owns it.
//!
//! ## Usage
//!
//! ```rust
//! use core_sync::{ItemOutcome, JobPhase, SyncJob};
//!
//! let mut job = SyncJob::new(2);
//! job.transition(JobPhase::Extracting).unwrap();
//! job.begin_item();
//! job.record_outcome(ItemOutcome::Succeeded);
//!
//! let handle = job.handle();
//! handle.cancel();
//! assert!(job.is_cancelled());
//! assert_eq!(job.counters().current, 1);
//! ```

use crate::{Result, SyncError};
use core_async::sync::CancellationToken;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a sync job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncJobId(Uuid);

impl SyncJobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a sync job ID from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self> {
        Ok(Self(
            Uuid::parse_str(s).map_err(|e| SyncError::InvalidJobId(e.to_string()))?,
        ))
    }
}

impl Default for SyncJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SyncJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Phases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Idle,
    Extracting,
    DiffPending,
    Reconciling,
    Persisting,
    Done,
    Cancelled,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Done | JobPhase::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Idle => "idle",
            JobPhase::Extracting => "extracting",
            JobPhase::DiffPending => "diff_pending",
            JobPhase::Reconciling => "reconciling",
            JobPhase::Persisting => "persisting",
            JobPhase::Done => "done",
            JobPhase::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How one item of a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOutcome {
    Succeeded,
    /// Not eligible for this run, nothing was fetched
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounters {
    /// Items started
    pub attempted: u32,
    pub succeeded: u32,
    pub skipped: u32,
    pub failed: u32,
    /// Items finished, whatever their outcome
    pub current: u32,
}

// ============================================================================
// Handle
// ============================================================================

/// Clonable cancellation handle for a running job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: SyncJobId,
    token: CancellationToken,
}

impl JobHandle {
    pub fn new() -> Self {
        Self {
            id: SyncJobId::new(),
            token: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> SyncJobId {
        self.id
    }

    /// Request a stop at the next checkpoint.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Sync Job
// ============================================================================

#[derive(Debug)]
pub struct SyncJob {
    handle: JobHandle,
    phase: JobPhase,
    total: u32,
    counters: JobCounters,
    started_at: i64,
}

impl SyncJob {
    /// New idle job over `total` items.
    pub fn new(total: u32) -> Self {
        Self::with_handle(JobHandle::new(), total)
    }

    /// New idle job driven by an existing handle.
    pub fn with_handle(handle: JobHandle, total: u32) -> Self {
        Self {
            handle,
            phase: JobPhase::Idle,
            total,
            counters: JobCounters::default(),
            started_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn id(&self) -> SyncJobId {
        self.handle.id
    }

    pub fn handle(&self) -> JobHandle {
        self.handle.clone()
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn counters(&self) -> JobCounters {
        self.counters
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Whole seconds since the job was created.
    pub fn elapsed_secs(&self) -> u64 {
        (chrono::Utc::now().timestamp() - self.started_at).max(0) as u64
    }

    /// Count an item as started.
    pub fn begin_item(&mut self) {
        self.counters.attempted += 1;
    }

    /// Count an item as finished.
    pub fn record_outcome(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Succeeded => self.counters.succeeded += 1,
            ItemOutcome::Skipped => self.counters.skipped += 1,
            ItemOutcome::Failed => self.counters.failed += 1,
        }
        self.counters.current += 1;
    }

    /// Move to `to`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if `to` is not reachable from the
    /// current phase.
    pub fn transition(&mut self, to: JobPhase) -> Result<()> {
        self.validate_transition(to)?;
        self.phase = to;
        Ok(())
    }

    fn validate_transition(&self, to: JobPhase) -> Result<()> {
        use JobPhase::*;

        let valid = match (self.phase, to) {
            // Terminal phases cannot transition
            (Done | Cancelled, _) => false,
            (_, Cancelled) => true,

            (Idle, Extracting) | (Idle, Done) => true,

            (Extracting, DiffPending) => true,
            // item failed; next item or end of input
            (Extracting, Extracting) | (Extracting, Done) => true,

            (DiffPending, Reconciling) => true,
            // media cleared without anything to reconcile
            (DiffPending, Persisting) => true,
            (DiffPending, Extracting) | (DiffPending, Done) => true,

            (Reconciling, Persisting) => true,

            (Persisting, Done) | (Persisting, Extracting) => true,

            _ => false,
        };

        if !valid {
            return Err(SyncError::InvalidStateTransition {
                from: self.phase.to_string(),
                to: to.to_string(),
                reason: format!("Cannot transition from {} to {}", self.phase, to),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
