//! Archive service façade.

use std::sync::Arc;

use bridge_traits::{http::HttpClient, upload::MediaUploader};
use core_backup::{
    DualUploader, HealthChecker, ReconcileStats, ReconciliationEngine, RepositoryRecorder,
    SecondaryWave, UploadMode, WaveReport,
};
use core_async::task::JoinHandle;
use core_extract::{ExtractionOutput, ExtractionPipeline, PostReference};
use core_library::models::{AccountKind, ArchivedPost};
use core_library::repositories::PostRepository;
use core_runtime::config::{ArchiveConfig, SyncConfig};
use core_runtime::events::{CoreEvent, EventBus, Receiver, DEFAULT_EVENT_BUFFER_SIZE};
use core_sync::{
    apply_extraction, local_date, BatchOptions, BatchReport, ConfirmationPrompt, JobHandle,
    PostSyncReport, SyncCoordinator, SyncJobId,
};
use provider_cloudinary::CloudinaryConnector;
use provider_imgbb::ImgbbConnector;
use tracing::{info, instrument};

use crate::error::Result;

/// Aggregated handle to the collaborators the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub repository: Arc<dyn PostRepository>,
    pub primary: Arc<dyn MediaUploader>,
    pub secondary: Option<Arc<dyn MediaUploader>>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        repository: Arc<dyn PostRepository>,
        primary: Arc<dyn MediaUploader>,
        secondary: Option<Arc<dyn MediaUploader>>,
    ) -> Self {
        Self {
            http_client,
            repository,
            primary,
            secondary,
        }
    }

    /// Cloudinary as primary and, when configured, ImgBB as secondary.
    ///
    /// # Errors
    ///
    /// Returns `Config` if no HTTP client was injected into `config`.
    pub fn from_config(config: &ArchiveConfig, repository: Arc<dyn PostRepository>) -> Result<Self> {
        let http_client = config.require_http_client()?;
        let primary: Arc<dyn MediaUploader> = Arc::new(CloudinaryConnector::new(
            http_client.clone(),
            config.cloudinary.clone(),
        ));
        let secondary = config.imgbb.clone().map(|imgbb| {
            Arc::new(ImgbbConnector::new(http_client.clone(), imgbb)) as Arc<dyn MediaUploader>
        });

        Ok(Self::new(http_client, repository, primary, secondary))
    }
}

/// Result of archiving a new post.
#[derive(Debug)]
pub struct ArchiveReport {
    pub post: ArchivedPost,
    pub stats: ReconcileStats,
    pub secondary_wave: Option<JoinHandle<WaveReport>>,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct ArchiveService {
    pipeline: Arc<ExtractionPipeline>,
    engine: Arc<ReconciliationEngine>,
    wave: Arc<SecondaryWave>,
    repository: Arc<dyn PostRepository>,
    coordinator: SyncCoordinator,
    sync_config: SyncConfig,
    event_bus: EventBus,
}

impl ArchiveService {
    pub fn new(deps: CoreDependencies, config: &ArchiveConfig) -> Self {
        let event_bus = EventBus::new(DEFAULT_EVENT_BUFFER_SIZE);

        let pipeline = Arc::new(
            ExtractionPipeline::new(deps.http_client.clone(), &config.extraction)
                .with_event_bus(event_bus.clone()),
        );
        let uploader = Arc::new(DualUploader::new(deps.primary, deps.secondary));
        let health = Arc::new(HealthChecker::from_config(deps.http_client, &config.backup));
        let engine = Arc::new(
            ReconciliationEngine::new(health, uploader.clone()).with_event_bus(event_bus.clone()),
        );
        let wave = Arc::new(
            SecondaryWave::new(
                uploader,
                Arc::new(RepositoryRecorder::new(deps.repository.clone())),
                config.backup.secondary_concurrency,
            )
            .with_event_bus(event_bus.clone()),
        );
        let coordinator = SyncCoordinator::new(
            pipeline.clone(),
            engine.clone(),
            wave.clone(),
            deps.repository.clone(),
            config.sync.clone(),
        )
        .with_deferred_secondaries(config.backup.defer_secondary_in_batch)
        .with_event_bus(event_bus.clone());

        info!(strategies = ?pipeline.strategy_names(), "Archive service ready");

        Self {
            pipeline,
            engine,
            wave,
            repository: deps.repository,
            coordinator,
            sync_config: config.sync.clone(),
            event_bus,
        }
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn repository(&self) -> Arc<dyn PostRepository> {
        Arc::clone(&self.repository)
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// Extraction output for the presentation layer. Never fails; failures
    /// come back as `success: false` with a note.
    #[instrument(skip(self))]
    pub async fn extract(&self, url: &str) -> ExtractionOutput {
        let reference = match PostReference::parse(url) {
            Ok(reference) => reference,
            Err(e) => return ExtractionOutput::failure(None, &e),
        };

        match self.pipeline.extract(&reference).await {
            Ok(post) => {
                let date = post
                    .taken_at
                    .and_then(|taken_at| local_date(taken_at, self.sync_config.utc_offset_hours));
                ExtractionOutput::from_post(&post, date)
            }
            Err(e) => ExtractionOutput::failure(Some(&reference), &e),
        }
    }

    /// Extract a new post, upload its media and create the record.
    ///
    /// # Errors
    ///
    /// Returns `Extraction` when the URL is not a post or every strategy
    /// failed, and `Library` when the record cannot be created.
    #[instrument(skip(self))]
    pub async fn archive(&self, url: &str, account: AccountKind) -> Result<ArchiveReport> {
        let (reference, fresh) = self.pipeline.extract_url(url).await?;

        let mut post =
            ArchivedPost::new(url.trim(), reference.shortcode.clone(), reference.kind).with_account(account);
        let outcome = self
            .engine
            .populate(&post.id, &fresh.media, UploadMode::Parallel)
            .await;

        let stats = outcome.stats;
        apply_extraction(&mut post, &fresh, outcome.slots, &self.sync_config);
        self.repository.create(&post).await?;

        let pending = outcome.pending_secondaries;
        let secondary_wave = (!pending.is_empty()).then(|| self.wave.dispatch(vec![pending]));

        info!(
            shortcode = %post.shortcode,
            media = post.media.len(),
            uploaded = stats.reuploaded,
            failed = stats.failed,
            "Post archived"
        );

        Ok(ArchiveReport {
            post,
            stats,
            secondary_wave,
        })
    }

    /// Re-sync one record, prompting before destructive or visible changes.
    pub async fn sync_post(
        &self,
        post_id: &str,
        prompt: &dyn ConfirmationPrompt,
    ) -> Result<PostSyncReport> {
        Ok(self.coordinator.sync_post(post_id, prompt).await?)
    }

    /// Start a batch in the background.
    pub async fn start_batch(
        &self,
        post_ids: Vec<String>,
        options: BatchOptions,
    ) -> (JobHandle, JoinHandle<core_sync::Result<BatchReport>>) {
        self.coordinator.start_batch(post_ids, options).await
    }

    /// Run a batch to completion or cancellation.
    pub async fn sync_batch(
        &self,
        handle: JobHandle,
        post_ids: Vec<String>,
        options: BatchOptions,
    ) -> Result<BatchReport> {
        Ok(self.coordinator.sync_batch(handle, post_ids, options).await?)
    }

    pub async fn cancel(&self, job_id: SyncJobId) -> Result<()> {
        Ok(self.coordinator.cancel(job_id).await?)
    }
}
