//! # Sync Coordinator
//!
//! Re-synchronizes archived posts against their source.
//!
//! ## Workflow
//!
//! ### Single item
//! 1. Extract the post
//! 2. On failure, ask whether to clear the record's media
//! 3. Diff against the record; ask before applying a caption or media-count change
//! 4. Reconcile media slots (secondary uploads run in parallel)
//! 5. Persist, then dispatch the post's secondary wave
//!
//! ### Batch
//! Items run strictly one after another with a pause in between. Each item is
//! extract → diff → reconcile → persist without prompts; failures are counted
//! and the run moves on. Cancellation is checked before every item, after
//! extraction and after reconciliation. Secondary uploads of the whole batch
//! go out in one wave at the end, also when the batch was cancelled.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{BatchOptions, FixedAnswer, SyncCoordinator};
//!
//! let report = coordinator.sync_post(&post_id, &FixedAnswer(true)).await?;
//!
//! let (handle, task) = coordinator
//!     .start_batch(post_ids, BatchOptions::default())
//!     .await;
//! handle.cancel();
//! let report = task.await??;
//! println!("{} of {} finished", report.counters.current, report.total);
//! ```

use core_async::sync::Mutex;
use core_async::task::{self, JoinHandle};
use core_async::time::sleep;
use core_backup::{
    PendingSecondaries, ReconcileOptions, ReconcileStats, ReconciliationEngine, SecondaryWave,
    UploadMode, WaveReport,
};
use core_extract::{ExtractionPipeline, PostReference};
use core_library::models::ArchivedPost;
use core_library::repositories::PostRepository;
use core_runtime::config::SyncConfig;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::apply::apply_extraction;
use crate::diff::PostDiff;
use crate::job::{ItemOutcome, JobCounters, JobHandle, JobPhase, SyncJob, SyncJobId};
use crate::prompt::{Confirmation, ConfirmationPrompt, PostPreview};
use crate::{Result, SyncError};

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSyncOutcome {
    /// Fresh data reconciled and stored
    Synced(ReconcileStats),
    /// Extraction failed and the origin media was cleared on confirmation
    Cleared,
    /// A confirmation was declined; the record is unchanged
    Declined,
    /// Stopped at a checkpoint; the record is unchanged
    Cancelled,
}

#[derive(Debug)]
pub struct PostSyncReport {
    pub job_id: SyncJobId,
    /// The record as it is now stored
    pub post: ArchivedPost,
    pub outcome: PostSyncOutcome,
    pub secondary_wave: Option<JoinHandle<WaveReport>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Only items that already hold a video; existing thumbnails are kept
    pub video_only: bool,
}

#[derive(Debug)]
pub struct BatchReport {
    pub job_id: SyncJobId,
    pub total: u32,
    pub counters: JobCounters,
    pub cancelled: bool,
    pub secondary_wave: Option<JoinHandle<WaveReport>>,
}

enum ItemStep {
    Finished(ItemOutcome, Option<PendingSecondaries>),
    Cancelled,
}

// ============================================================================
// Coordinator
// ============================================================================

#[derive(Clone)]
pub struct SyncCoordinator {
    pipeline: Arc<ExtractionPipeline>,
    engine: Arc<ReconciliationEngine>,
    wave: Arc<SecondaryWave>,
    repository: Arc<dyn PostRepository>,
    config: SyncConfig,
    defer_secondary_in_batch: bool,
    event_bus: Option<EventBus>,
    active_jobs: Arc<Mutex<HashMap<SyncJobId, JobHandle>>>,
}

impl SyncCoordinator {
    pub fn new(
        pipeline: Arc<ExtractionPipeline>,
        engine: Arc<ReconciliationEngine>,
        wave: Arc<SecondaryWave>,
        repository: Arc<dyn PostRepository>,
        config: SyncConfig,
    ) -> Self {
        Self {
            pipeline,
            engine,
            wave,
            repository,
            config,
            defer_secondary_in_batch: true,
            event_bus: None,
            active_jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether batch runs queue secondary uploads until the batch ends.
    pub fn with_deferred_secondaries(mut self, defer: bool) -> Self {
        self.defer_secondary_in_batch = defer;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Request a stop of a running job.
    ///
    /// # Errors
    ///
    /// Returns `JobNotFound` if no job with that id is running.
    pub async fn cancel(&self, job_id: SyncJobId) -> Result<()> {
        let handle = self.active_jobs.lock().await.get(&job_id).cloned();
        match handle {
            Some(handle) => {
                handle.cancel();
                info!(%job_id, "Cancellation requested");
                Ok(())
            }
            None => Err(SyncError::JobNotFound {
                job_id: job_id.to_string(),
            }),
        }
    }

    pub async fn running_jobs(&self) -> Vec<SyncJobId> {
        self.active_jobs.lock().await.keys().copied().collect()
    }

    async fn register(&self, handle: &JobHandle) {
        self.active_jobs
            .lock()
            .await
            .insert(handle.id(), handle.clone());
    }

    async fn unregister(&self, job_id: SyncJobId) {
        self.active_jobs.lock().await.remove(&job_id);
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Sync(event)).ok();
        }
    }

    // ========================================================================
    // Single item
    // ========================================================================

    /// Re-sync one record, asking `prompt` before destructive or visible changes.
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound` for an unknown id and `Library` when storing fails.
    #[instrument(skip(self, prompt))]
    pub async fn sync_post(
        &self,
        post_id: &str,
        prompt: &dyn ConfirmationPrompt,
    ) -> Result<PostSyncReport> {
        let mut post = self
            .repository
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| SyncError::PostNotFound {
                post_id: post_id.to_string(),
            })?;

        let mut job = SyncJob::new(1);
        let job_id = job.id();
        self.register(&job.handle()).await;
        let result = self.run_single(&mut job, &mut post, prompt).await;
        self.unregister(job_id).await;

        let (outcome, secondary_wave) = result?;
        info!(%job_id, shortcode = %post.shortcode, ?outcome, "Post sync finished");

        Ok(PostSyncReport {
            job_id,
            post,
            outcome,
            secondary_wave,
        })
    }

    async fn run_single(
        &self,
        job: &mut SyncJob,
        post: &mut ArchivedPost,
        prompt: &dyn ConfirmationPrompt,
    ) -> Result<(PostSyncOutcome, Option<JoinHandle<WaveReport>>)> {
        job.transition(JobPhase::Extracting)?;
        job.begin_item();
        let reference = PostReference::new(post.shortcode.clone(), post.kind);
        let extracted = self.pipeline.extract(&reference).await;

        if job.is_cancelled() {
            job.transition(JobPhase::Cancelled)?;
            return Ok((PostSyncOutcome::Cancelled, None));
        }
        job.transition(JobPhase::DiffPending)?;

        let fresh = match extracted {
            Ok(fresh) => fresh,
            Err(e) => {
                let request = Confirmation::ClearMedia {
                    post_id: post.id.clone(),
                    shortcode: post.shortcode.clone(),
                    diagnostics: e.note(),
                };
                if !prompt.confirm(&request).await {
                    job.record_outcome(ItemOutcome::Skipped);
                    job.transition(JobPhase::Done)?;
                    return Ok((PostSyncOutcome::Declined, None));
                }

                job.transition(JobPhase::Persisting)?;
                post.media.retain(|slot| slot.manual);
                post.touch();
                self.repository.update(post).await?;
                job.record_outcome(ItemOutcome::Succeeded);
                job.transition(JobPhase::Done)?;
                return Ok((PostSyncOutcome::Cleared, None));
            }
        };

        let diff = PostDiff::compute(post, &fresh);
        if !diff.is_empty() {
            debug!(media_count = ?diff.media_count, caption_changed = diff.caption.is_some(), "Changes detected");
            let request = Confirmation::ApplyChanges {
                post_id: post.id.clone(),
                before: PostPreview::of_record(post),
                after: PostPreview::of_extraction(&fresh),
            };
            if !prompt.confirm(&request).await {
                job.record_outcome(ItemOutcome::Skipped);
                job.transition(JobPhase::Done)?;
                return Ok((PostSyncOutcome::Declined, None));
            }
        }

        job.transition(JobPhase::Reconciling)?;
        let options = ReconcileOptions {
            video_only: false,
            mode: UploadMode::Parallel,
        };
        let outcome = self
            .engine
            .reconcile(&post.id, &fresh.media, &post.media, options)
            .await;

        if job.is_cancelled() {
            job.transition(JobPhase::Cancelled)?;
            return Ok((PostSyncOutcome::Cancelled, None));
        }

        job.transition(JobPhase::Persisting)?;
        let stats = outcome.stats;
        apply_extraction(post, &fresh, outcome.slots, &self.config);
        self.repository.update(post).await?;
        job.record_outcome(ItemOutcome::Succeeded);
        job.transition(JobPhase::Done)?;

        let pending = outcome.pending_secondaries;
        let wave = (!pending.is_empty()).then(|| self.wave.dispatch(vec![pending]));

        Ok((PostSyncOutcome::Synced(stats), wave))
    }

    // ========================================================================
    // Batch
    // ========================================================================

    /// Spawn a batch run and return its handle right away.
    pub async fn start_batch(
        &self,
        targets: Vec<String>,
        options: BatchOptions,
    ) -> (JobHandle, JoinHandle<Result<BatchReport>>) {
        let handle = JobHandle::new();
        self.register(&handle).await;

        let coordinator = self.clone();
        let job_handle = handle.clone();
        let task = task::spawn(async move {
            let job_id = job_handle.id();
            let result = coordinator.run_batch(job_handle, &targets, options).await;
            coordinator.unregister(job_id).await;
            result
        });

        (handle, task)
    }

    /// Run a batch to completion or cancellation.
    ///
    /// Per-item failures never fail the batch; they are counted. `handle` can
    /// be cancelled from anywhere, or through [`SyncCoordinator::cancel`].
    pub async fn sync_batch(
        &self,
        handle: JobHandle,
        targets: Vec<String>,
        options: BatchOptions,
    ) -> Result<BatchReport> {
        let job_id = handle.id();
        self.register(&handle).await;
        let result = self.run_batch(handle, &targets, options).await;
        self.unregister(job_id).await;
        result
    }

    #[instrument(skip(self, handle, targets), fields(job_id = %handle.id(), total = targets.len()))]
    async fn run_batch(
        &self,
        handle: JobHandle,
        targets: &[String],
        options: BatchOptions,
    ) -> Result<BatchReport> {
        let mut job = SyncJob::with_handle(handle, targets.len() as u32);
        let job_id = job.id();
        let total = job.total();
        let reconcile_options = ReconcileOptions {
            video_only: options.video_only,
            mode: if self.defer_secondary_in_batch {
                UploadMode::Deferred
            } else {
                UploadMode::Parallel
            },
        };

        info!(video_only = options.video_only, "Starting batch sync");
        self.emit(SyncEvent::Started {
            job_id: job_id.to_string(),
            total,
        });

        let mut pending = Vec::new();
        let mut cancelled = false;

        for (index, post_id) in targets.iter().enumerate() {
            if job.is_cancelled() {
                cancelled = true;
                break;
            }

            job.transition(JobPhase::Extracting)?;
            job.begin_item();

            match self.sync_item(&mut job, post_id, reconcile_options).await? {
                ItemStep::Finished(outcome, secondaries) => {
                    job.record_outcome(outcome);
                    pending.extend(secondaries.filter(|s| !s.is_empty()));
                }
                ItemStep::Cancelled => {
                    cancelled = true;
                    break;
                }
            }

            let counters = job.counters();
            self.emit(SyncEvent::Progress {
                job_id: job_id.to_string(),
                current: counters.current,
                total,
                succeeded: counters.succeeded,
                skipped: counters.skipped,
                failed: counters.failed,
            });

            if index + 1 < targets.len() {
                sleep(self.config.inter_item_delay).await;
            }
        }

        let secondary_wave = (!pending.is_empty()).then(|| self.wave.dispatch(pending));
        let counters = job.counters();

        if cancelled {
            job.transition(JobPhase::Cancelled)?;
            info!(current = counters.current, "Batch sync cancelled");
            self.emit(SyncEvent::Cancelled {
                job_id: job_id.to_string(),
                current: counters.current,
            });
        } else {
            job.transition(JobPhase::Done)?;
            info!(
                succeeded = counters.succeeded,
                skipped = counters.skipped,
                failed = counters.failed,
                "Batch sync completed"
            );
            self.emit(SyncEvent::Completed {
                job_id: job_id.to_string(),
                succeeded: counters.succeeded,
                skipped: counters.skipped,
                failed: counters.failed,
                duration_secs: job.elapsed_secs(),
            });
        }

        Ok(BatchReport {
            job_id,
            total,
            counters,
            cancelled,
            secondary_wave,
        })
    }

    /// One batch item. Only state machine misuse is an error here.
    async fn sync_item(
        &self,
        job: &mut SyncJob,
        post_id: &str,
        options: ReconcileOptions,
    ) -> Result<ItemStep> {
        let mut post = match self.repository.find_by_id(post_id).await {
            Ok(Some(post)) => post,
            Ok(None) => {
                warn!(post_id, "Record not found");
                return Ok(ItemStep::Finished(ItemOutcome::Failed, None));
            }
            Err(e) => {
                warn!(post_id, error = %e, "Could not load record");
                return Ok(ItemStep::Finished(ItemOutcome::Failed, None));
            }
        };

        if options.video_only && !post.has_video() {
            debug!(post_id, "No video slot, skipping");
            return Ok(ItemStep::Finished(ItemOutcome::Skipped, None));
        }

        let reference = PostReference::new(post.shortcode.clone(), post.kind);
        let fresh = match self.pipeline.extract(&reference).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(post_id, error = %e, "Extraction failed, record left untouched");
                return Ok(ItemStep::Finished(ItemOutcome::Failed, None));
            }
        };

        if job.is_cancelled() {
            return Ok(ItemStep::Cancelled);
        }

        job.transition(JobPhase::DiffPending)?;
        let diff = PostDiff::compute(&post, &fresh);
        if !diff.is_empty() {
            debug!(post_id, media_count = ?diff.media_count, caption_changed = diff.caption.is_some(), "Applying changes");
        }

        job.transition(JobPhase::Reconciling)?;
        let outcome = self
            .engine
            .reconcile(&post.id, &fresh.media, &post.media, options)
            .await;

        if job.is_cancelled() {
            return Ok(ItemStep::Cancelled);
        }

        job.transition(JobPhase::Persisting)?;
        let stats = outcome.stats;
        apply_extraction(&mut post, &fresh, outcome.slots, &self.config);

        match self.repository.update(&post).await {
            Ok(()) => {
                if stats.failed > 0 {
                    warn!(post_id, failed = stats.failed, "Stored with slots left on their previous locator");
                }
                Ok(ItemStep::Finished(
                    ItemOutcome::Succeeded,
                    Some(outcome.pending_secondaries),
                ))
            }
            Err(e) => {
                warn!(post_id, error = %e, "Could not store record");
                Ok(ItemStep::Finished(ItemOutcome::Failed, None))
            }
        }
    }
}
