//! Media slot reconciliation
//!
//! Pairs freshly extracted media with the recorded slots by position and
//! decides, per slot, whether the durable copy can stay, whether the
//! secondary copy takes over, or whether the origin has to be uploaded again.
//!
//! Video streams are never uploaded; their slot is re-pointed at the fresh
//! origin URL and only the thumbnail goes through the decision ladder.

use bridge_traits::upload::{ContentKind, MediaSource};
use core_extract::ExtractedMedia;
use core_library::models::{MediaKind, StoredMediaSlot};
use core_runtime::events::{BackupEvent, CoreEvent, EventBus};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::health::HealthCheck;
use crate::uploader::{DualUploader, SecondaryHandle, UploadMode};
use crate::wave::{PendingSecondaries, PendingSecondary, SlotField};

/// Per-slot decision, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationDecision {
    /// Existing primary is healthy
    Reuse,
    /// Primary is dead but the secondary is healthy and takes its place
    ReuseSecondary,
    /// Nothing usable; upload from the fresh origin
    Reupload,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Reuse and ReuseSecondary, and video slots with no thumbnail anywhere
    pub reused: u32,
    pub reuploaded: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Re-point video slots that already have a thumbnail, without probing
    pub video_only: bool,
    pub mode: UploadMode,
}

#[derive(Debug)]
pub struct ReconcileOutcome {
    /// Reconciled slots followed by the untouched manual slots
    pub slots: Vec<StoredMediaSlot>,
    /// One decision per reconciled slot
    pub decisions: Vec<ReconciliationDecision>,
    pub stats: ReconcileStats,
    pub pending_secondaries: PendingSecondaries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotStatus {
    Reused,
    Reuploaded,
    Failed,
}

/// Result of the ladder for one locator pair (a main image or a thumbnail).
struct PairResult {
    primary: Option<String>,
    secondary: Option<String>,
    decision: ReconciliationDecision,
    status: SlotStatus,
    pending: Option<PendingSecondary>,
}

struct SlotResult {
    slot: StoredMediaSlot,
    decision: ReconciliationDecision,
    status: SlotStatus,
    pending: Option<PendingSecondary>,
}

pub struct ReconciliationEngine {
    health: Arc<dyn HealthCheck>,
    uploader: Arc<DualUploader>,
    event_bus: Option<EventBus>,
}

impl ReconciliationEngine {
    pub fn new(health: Arc<dyn HealthCheck>, uploader: Arc<DualUploader>) -> Self {
        Self {
            health,
            uploader,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn uploader(&self) -> &Arc<DualUploader> {
        &self.uploader
    }

    /// Slots for a post that has none yet.
    pub async fn populate(
        &self,
        post_id: &str,
        fresh: &[ExtractedMedia],
        mode: UploadMode,
    ) -> ReconcileOutcome {
        let options = ReconcileOptions {
            video_only: false,
            mode,
        };
        self.reconcile(post_id, fresh, &[], options).await
    }

    /// Reconcile `existing` against `fresh`, slot by slot and concurrently.
    ///
    /// Trailing existing slots without a fresh counterpart are dropped; manual
    /// slots are appended unchanged.
    #[instrument(skip(self, fresh, existing), fields(fresh = fresh.len(), existing = existing.len()))]
    pub async fn reconcile(
        &self,
        post_id: &str,
        fresh: &[ExtractedMedia],
        existing: &[StoredMediaSlot],
        options: ReconcileOptions,
    ) -> ReconcileOutcome {
        let (manual, origin): (Vec<&StoredMediaSlot>, Vec<&StoredMediaSlot>) =
            existing.iter().partition(|slot| slot.manual);

        if origin.len() > fresh.len() {
            debug!(dropped = origin.len() - fresh.len(), "Dropping trailing slots");
        }

        let results = join_all(
            fresh
                .iter()
                .enumerate()
                .map(|(index, media)| self.reconcile_slot(media, origin.get(index).copied(), options)),
        )
        .await;

        let mut outcome = ReconcileOutcome {
            slots: Vec::with_capacity(results.len() + manual.len()),
            decisions: Vec::with_capacity(results.len()),
            stats: ReconcileStats::default(),
            pending_secondaries: PendingSecondaries::new(post_id, Vec::new()),
        };

        for result in results {
            match result.status {
                SlotStatus::Reused => outcome.stats.reused += 1,
                SlotStatus::Reuploaded => outcome.stats.reuploaded += 1,
                SlotStatus::Failed => outcome.stats.failed += 1,
            }
            outcome.slots.push(result.slot);
            outcome.decisions.push(result.decision);
            outcome.pending_secondaries.entries.extend(result.pending);
        }
        outcome.slots.extend(manual.into_iter().cloned());

        let stats = outcome.stats;
        info!(
            post_id,
            reused = stats.reused,
            reuploaded = stats.reuploaded,
            failed = stats.failed,
            "Slots reconciled"
        );
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Backup(BackupEvent::SlotsReconciled {
                post_id: post_id.to_string(),
                reused: stats.reused,
                reuploaded: stats.reuploaded,
                failed: stats.failed,
            }))
            .ok();
        }

        outcome
    }

    async fn reconcile_slot(
        &self,
        fresh: &ExtractedMedia,
        existing: Option<&StoredMediaSlot>,
        options: ReconcileOptions,
    ) -> SlotResult {
        let existing = existing.filter(|slot| slot.kind == fresh.kind);

        match fresh.kind {
            MediaKind::Image => {
                let pair = self
                    .resolve_pair(
                        existing.map(|slot| slot.primary.as_str()),
                        existing.and_then(|slot| slot.secondary.as_deref()),
                        Some(fresh.url.as_str()),
                        SlotField::Main,
                        options.mode,
                    )
                    .await;

                // primary failure with nothing to keep falls back to the origin URL
                let primary = pair.primary.unwrap_or_else(|| fresh.url.clone());
                let mut slot = StoredMediaSlot::image(primary);
                slot.secondary = pair.secondary;

                SlotResult {
                    slot,
                    decision: pair.decision,
                    status: pair.status,
                    pending: pair.pending,
                }
            }
            MediaKind::Video => {
                if let Some(existing) = existing {
                    if options.video_only && existing.thumbnail.is_some() {
                        let mut slot = existing.clone();
                        slot.primary = fresh.url.clone();
                        return SlotResult {
                            slot,
                            decision: ReconciliationDecision::Reuse,
                            status: SlotStatus::Reused,
                            pending: None,
                        };
                    }
                }

                let pair = self
                    .resolve_pair(
                        existing.and_then(|slot| slot.thumbnail.as_deref()),
                        existing.and_then(|slot| slot.thumbnail_secondary.as_deref()),
                        fresh.thumbnail.as_deref(),
                        SlotField::Thumbnail,
                        options.mode,
                    )
                    .await;

                // same fallback as images: the fresh thumbnail beats losing it
                let thumbnail = pair.primary.or_else(|| fresh.thumbnail.clone());
                let mut slot = StoredMediaSlot::video(fresh.url.clone(), thumbnail);
                slot.thumbnail_secondary = pair.secondary;

                SlotResult {
                    slot,
                    decision: pair.decision,
                    status: pair.status,
                    pending: pair.pending,
                }
            }
        }
    }

    /// Reuse > ReuseSecondary > Reupload for one locator pair.
    async fn resolve_pair(
        &self,
        primary: Option<&str>,
        secondary: Option<&str>,
        origin: Option<&str>,
        field: SlotField,
        mode: UploadMode,
    ) -> PairResult {
        if let Some(primary) = primary {
            if self.health.is_alive(primary).await {
                return PairResult {
                    primary: Some(primary.to_string()),
                    secondary: secondary.map(str::to_string),
                    decision: ReconciliationDecision::Reuse,
                    status: SlotStatus::Reused,
                    pending: None,
                };
            }
        }

        if let Some(secondary) = secondary {
            if self.health.is_alive(secondary).await {
                // the promoted copy is now the only one; owe a new secondary
                let source = MediaSource::url(origin.unwrap_or(secondary));
                let handle = self.uploader.secondary_handle(&source, ContentKind::Image, mode);
                let pending = handle.is_applicable().then(|| PendingSecondary {
                    primary: secondary.to_string(),
                    field,
                    handle,
                });
                return PairResult {
                    primary: Some(secondary.to_string()),
                    secondary: None,
                    decision: ReconciliationDecision::ReuseSecondary,
                    status: SlotStatus::Reused,
                    pending,
                };
            }
        }

        let failed = |primary: Option<&str>| PairResult {
            primary: primary.map(str::to_string),
            secondary: None,
            decision: ReconciliationDecision::Reupload,
            status: SlotStatus::Failed,
            pending: None,
        };

        let Some(origin) = origin else {
            if primary.is_none() && secondary.is_none() {
                // nothing durable existed and nothing can be uploaded
                debug!(?field, "No locator to reconcile");
                return PairResult {
                    primary: None,
                    secondary: None,
                    decision: ReconciliationDecision::Reuse,
                    status: SlotStatus::Reused,
                    pending: None,
                };
            }
            debug!(?field, "No origin to upload from");
            return failed(primary);
        };

        match self
            .uploader
            .upload(MediaSource::url(origin), ContentKind::Image, mode)
            .await
        {
            Ok(receipt) => {
                let primary = receipt.primary;
                let pending = match receipt.secondary {
                    SecondaryHandle::NotApplicable => None,
                    handle => Some(PendingSecondary {
                        primary: primary.clone(),
                        field,
                        handle,
                    }),
                };
                PairResult {
                    primary: Some(primary),
                    secondary: None,
                    decision: ReconciliationDecision::Reupload,
                    status: SlotStatus::Reuploaded,
                    pending,
                }
            }
            Err(e) => {
                warn!(?field, error = %e, "Keeping previous locator");
                failed(primary)
            }
        }
    }
}
