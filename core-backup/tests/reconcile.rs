//! Reconciliation scenarios with a scripted health check and in-memory providers.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::upload::{ContentKind, MediaSource, MediaUploader};
use core_backup::{
    DualUploader, HealthCheck, ReconcileOptions, ReconciliationDecision, ReconciliationEngine,
    RepositoryRecorder, SecondaryWave, UploadMode,
};
use core_extract::ExtractedMedia;
use core_library::models::{ArchivedPost, PostKind, StoredMediaSlot};
use core_library::repositories::{InMemoryPostRepository, PostRepository};
use core_runtime::events::{BackupEvent, CoreEvent, EventBus};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Alive iff the URL is in the set; records every probe.
struct ScriptedHealth {
    alive: HashSet<String>,
    probed: Mutex<Vec<String>>,
}

impl ScriptedHealth {
    fn new(alive: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            alive: alive.iter().map(|s| s.to_string()).collect(),
            probed: Mutex::new(Vec::new()),
        })
    }

    fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl HealthCheck for ScriptedHealth {
    async fn is_alive(&self, url: &str) -> bool {
        self.probed.lock().unwrap().push(url.to_string());
        self.alive.contains(url)
    }
}

/// Stores everything under `https://{name}.example.com/{last path segment}`.
struct MemoryProvider {
    name: &'static str,
    fail: bool,
    uploads: AtomicUsize,
}

impl MemoryProvider {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail: false,
            uploads: AtomicUsize::new(0),
        })
    }

    fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail: true,
            uploads: AtomicUsize::new(0),
        })
    }

    fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaUploader for MemoryProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn accepts(&self, kind: ContentKind) -> bool {
        kind == ContentKind::Image
    }

    async fn upload(&self, source: &MediaSource) -> BridgeResult<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BridgeError::OperationFailed("quota exceeded".to_string()));
        }
        let described = source.describe();
        let file = described.rsplit('/').next().unwrap_or_default();
        Ok(format!("https://{}.example.com/{}", self.name, file))
    }
}

fn engine(
    health: Arc<ScriptedHealth>,
    primary: Arc<MemoryProvider>,
    secondary: Option<Arc<MemoryProvider>>,
) -> ReconciliationEngine {
    let secondary = secondary.map(|s| s as Arc<dyn MediaUploader>);
    ReconciliationEngine::new(health, Arc::new(DualUploader::new(primary, secondary)))
}

fn deferred() -> ReconcileOptions {
    ReconcileOptions {
        video_only: false,
        mode: UploadMode::Deferred,
    }
}

#[tokio::test]
async fn test_dead_primary_promotes_healthy_secondary() {
    let health = ScriptedHealth::new(&["https://i.ibb.co/old.jpg"]);
    let primary = MemoryProvider::new("primary");
    let engine = engine(health.clone(), primary.clone(), None);

    let existing = vec![
        StoredMediaSlot::image("https://res.example.com/old.jpg").with_secondary("https://i.ibb.co/old.jpg"),
    ];
    let fresh = vec![ExtractedMedia::image("https://x.fbcdn.net/new.jpg")];

    let outcome = engine.reconcile("post-1", &fresh, &existing, deferred()).await;

    assert_eq!(outcome.decisions, vec![ReconciliationDecision::ReuseSecondary]);
    assert_eq!(outcome.slots[0].primary, "https://i.ibb.co/old.jpg");
    assert!(outcome.slots[0].secondary.is_none());
    assert_eq!(outcome.stats.reused, 1);
    assert_eq!(primary.uploads(), 0, "the origin is never fetched when a copy is healthy");
    assert_eq!(
        health.probed(),
        vec!["https://res.example.com/old.jpg", "https://i.ibb.co/old.jpg"]
    );
}

#[tokio::test]
async fn test_healthy_slots_are_idempotent() {
    let health = ScriptedHealth::new(&["https://res.example.com/a.jpg", "https://res.example.com/t.jpg"]);
    let primary = MemoryProvider::new("primary");
    let engine = engine(health, primary.clone(), Some(MemoryProvider::new("secondary")));

    let existing = vec![
        StoredMediaSlot::image("https://res.example.com/a.jpg").with_secondary("https://i.ibb.co/a.jpg"),
        StoredMediaSlot::video(
            "https://x.fbcdn.net/v.mp4",
            Some("https://res.example.com/t.jpg".to_string()),
        ),
    ];
    let fresh = vec![
        ExtractedMedia::image("https://x.fbcdn.net/a.jpg"),
        ExtractedMedia::video("https://x.fbcdn.net/v.mp4", Some("https://x.fbcdn.net/t.jpg".to_string())),
    ];

    let first = engine.reconcile("post-1", &fresh, &existing, deferred()).await;
    let second = engine.reconcile("post-1", &fresh, &first.slots, deferred()).await;

    assert_eq!(first.slots, existing);
    assert_eq!(second.slots, first.slots);
    assert_eq!(primary.uploads(), 0);
    assert!(first.pending_secondaries.is_empty());
}

#[tokio::test]
async fn test_reupload_and_primary_failure_policy() {
    let health = ScriptedHealth::new(&[]);
    let engine = engine(health, MemoryProvider::failing("primary"), None);

    let existing = vec![StoredMediaSlot::image("https://res.example.com/dead.jpg")];
    let fresh = vec![
        ExtractedMedia::image("https://x.fbcdn.net/a.jpg"),
        ExtractedMedia::image("https://x.fbcdn.net/b.jpg"),
    ];

    let outcome = engine.reconcile("post-1", &fresh, &existing, deferred()).await;

    assert_eq!(outcome.stats.failed, 2);
    assert_eq!(outcome.slots[0].primary, "https://res.example.com/dead.jpg", "keeps the old locator");
    assert_eq!(outcome.slots[1].primary, "https://x.fbcdn.net/b.jpg", "falls back to the origin");
    assert!(outcome.decisions.iter().all(|d| *d == ReconciliationDecision::Reupload));
}

#[tokio::test]
async fn test_trailing_slots_dropped_and_manual_appended() {
    let health = ScriptedHealth::new(&["https://res.example.com/a.jpg"]);
    let engine = engine(health.clone(), MemoryProvider::new("primary"), None);

    let manual = StoredMediaSlot::image("https://www.youtube.com/embed/x").manual();
    let existing = vec![
        StoredMediaSlot::image("https://res.example.com/a.jpg"),
        manual.clone(),
        StoredMediaSlot::image("https://res.example.com/b.jpg"),
    ];
    let fresh = vec![ExtractedMedia::image("https://x.fbcdn.net/a.jpg")];

    let outcome = engine.reconcile("post-1", &fresh, &existing, deferred()).await;

    assert_eq!(outcome.slots.len(), 2);
    assert_eq!(outcome.slots[1], manual);
    assert!(!health.probed().iter().any(|u| u.contains("youtube")));
}

#[tokio::test]
async fn test_video_slot_repoints_and_reuploads_thumbnail() {
    let health = ScriptedHealth::new(&[]);
    let primary = MemoryProvider::new("primary");
    let engine = engine(health, primary.clone(), Some(MemoryProvider::new("secondary")));

    let existing = vec![StoredMediaSlot::video(
        "https://x.fbcdn.net/expired.mp4",
        Some("https://res.example.com/dead-thumb.jpg".to_string()),
    )];
    let fresh = vec![ExtractedMedia::video(
        "https://x.fbcdn.net/fresh.mp4",
        Some("https://x.fbcdn.net/thumb.jpg".to_string()),
    )];

    let outcome = engine.reconcile("post-1", &fresh, &existing, deferred()).await;

    let slot = &outcome.slots[0];
    assert_eq!(slot.primary, "https://x.fbcdn.net/fresh.mp4");
    assert_eq!(slot.thumbnail.as_deref(), Some("https://primary.example.com/thumb.jpg"));
    assert_eq!(primary.uploads(), 1, "only the thumbnail is uploaded");
    assert_eq!(outcome.pending_secondaries.entries.len(), 1);
}

#[tokio::test]
async fn test_failed_thumbnail_upload_keeps_fresh_thumbnail() {
    let health = ScriptedHealth::new(&[]);
    let primary = MemoryProvider::failing("primary");
    let engine = engine(health, primary.clone(), None);

    let fresh = vec![ExtractedMedia::video(
        "https://x.fbcdn.net/v.mp4",
        Some("https://x.fbcdn.net/thumb.jpg".to_string()),
    )];

    let outcome = engine.populate("post-1", &fresh, UploadMode::Deferred).await;

    let slot = &outcome.slots[0];
    assert_eq!(slot.primary, "https://x.fbcdn.net/v.mp4");
    assert_eq!(slot.thumbnail.as_deref(), Some("https://x.fbcdn.net/thumb.jpg"));
    assert_eq!(outcome.stats.failed, 1);
    assert_eq!(primary.uploads(), 1);
}

#[tokio::test]
async fn test_video_without_any_thumbnail_is_not_a_failure() {
    let health = ScriptedHealth::new(&[]);
    let primary = MemoryProvider::new("primary");
    let engine = engine(health.clone(), primary.clone(), None);

    let fresh = vec![ExtractedMedia::video("https://x.fbcdn.net/v.mp4", None)];

    let outcome = engine.populate("post-1", &fresh, UploadMode::Deferred).await;

    assert_eq!(outcome.slots[0].primary, "https://x.fbcdn.net/v.mp4");
    assert!(outcome.slots[0].thumbnail.is_none());
    assert_eq!(outcome.stats.failed, 0);
    assert_eq!(outcome.stats.reused, 1);
    assert_eq!(primary.uploads(), 0);
    assert!(health.probed().is_empty());
}

#[tokio::test]
async fn test_promoted_secondary_is_copied_again() {
    let health = ScriptedHealth::new(&["https://i.ibb.co/old.jpg"]);
    let primary = MemoryProvider::new("primary");
    let secondary = MemoryProvider::new("secondary");
    let uploader = Arc::new(DualUploader::new(
        primary.clone(),
        Some(secondary.clone() as Arc<dyn MediaUploader>),
    ));
    let engine = ReconciliationEngine::new(health, uploader.clone());

    let mut post = ArchivedPost::new("https://www.instagram.com/p/ABC123/", "ABC123", PostKind::Standard);
    post.media = vec![
        StoredMediaSlot::image("https://res.example.com/old.jpg").with_secondary("https://i.ibb.co/old.jpg"),
    ];
    let fresh = vec![ExtractedMedia::image("https://x.fbcdn.net/new.jpg")];

    let outcome = engine.reconcile(&post.id, &fresh, &post.media, deferred()).await;
    assert_eq!(outcome.decisions, vec![ReconciliationDecision::ReuseSecondary]);
    assert_eq!(outcome.pending_secondaries.entries.len(), 1);
    assert_eq!(outcome.pending_secondaries.entries[0].primary, "https://i.ibb.co/old.jpg");
    assert_eq!(primary.uploads(), 0);
    assert_eq!(secondary.uploads(), 0, "deferred copies wait for the wave");

    post.media = outcome.slots;
    let repository = Arc::new(InMemoryPostRepository::new());
    repository.create(&post).await.unwrap();
    let wave = SecondaryWave::new(uploader, Arc::new(RepositoryRecorder::new(repository.clone())), 1);
    let report = wave.dispatch(vec![outcome.pending_secondaries]).await.unwrap();

    assert_eq!(report.stored, 1);
    let saved = repository.find_by_id(&post.id).await.unwrap().unwrap();
    assert_eq!(saved.media[0].primary, "https://i.ibb.co/old.jpg");
    assert_eq!(saved.media[0].secondary.as_deref(), Some("https://secondary.example.com/new.jpg"));
}

#[tokio::test]
async fn test_video_only_mode_skips_probes() {
    let health = ScriptedHealth::new(&[]);
    let primary = MemoryProvider::new("primary");
    let engine = engine(health.clone(), primary.clone(), None);

    let existing = vec![StoredMediaSlot::video(
        "https://x.fbcdn.net/expired.mp4",
        Some("https://res.example.com/thumb.jpg".to_string()),
    )
    .with_thumbnail_secondary("https://i.ibb.co/thumb.jpg")];
    let fresh = vec![ExtractedMedia::video("https://x.fbcdn.net/fresh.mp4", None)];

    let options = ReconcileOptions {
        video_only: true,
        mode: UploadMode::Deferred,
    };
    let outcome = engine.reconcile("post-1", &fresh, &existing, options).await;

    assert_eq!(outcome.slots[0].primary, "https://x.fbcdn.net/fresh.mp4");
    assert_eq!(outcome.slots[0].thumbnail, existing[0].thumbnail);
    assert_eq!(outcome.slots[0].thumbnail_secondary, existing[0].thumbnail_secondary);
    assert!(health.probed().is_empty());
    assert_eq!(primary.uploads(), 0);
}

#[tokio::test]
async fn test_kind_change_forces_fresh_populate() {
    let health = ScriptedHealth::new(&["https://res.example.com/a.jpg"]);
    let engine = engine(health, MemoryProvider::new("primary"), None);

    let existing = vec![StoredMediaSlot::image("https://res.example.com/a.jpg")];
    let fresh = vec![ExtractedMedia::video(
        "https://x.fbcdn.net/v.mp4",
        Some("https://x.fbcdn.net/t.jpg".to_string()),
    )];

    let outcome = engine.reconcile("post-1", &fresh, &existing, deferred()).await;
    assert_eq!(outcome.decisions, vec![ReconciliationDecision::Reupload]);
    assert!(outcome.slots[0].is_video());
}

#[tokio::test]
async fn test_deferred_wave_writes_back_through_store() {
    let health = ScriptedHealth::new(&[]);
    let secondary = MemoryProvider::new("secondary");
    let uploader = Arc::new(DualUploader::new(
        MemoryProvider::new("primary"),
        Some(secondary.clone() as Arc<dyn MediaUploader>),
    ));
    let bus = EventBus::new(8);
    let mut events = bus.subscribe();
    let engine = ReconciliationEngine::new(health, uploader.clone()).with_event_bus(bus.clone());

    let fresh = vec![
        ExtractedMedia::image("https://x.fbcdn.net/a.jpg"),
        ExtractedMedia::image("https://x.fbcdn.net/b.jpg"),
    ];
    let mut post = ArchivedPost::new("https://www.instagram.com/p/ABC123/", "ABC123", PostKind::Standard);
    let outcome = engine.populate(&post.id, &fresh, UploadMode::Deferred).await;
    assert_eq!(outcome.stats.reuploaded, 2);
    assert_eq!(secondary.uploads(), 0);

    post.media = outcome.slots;
    let repository = Arc::new(InMemoryPostRepository::new());
    repository.create(&post).await.unwrap();

    let wave = SecondaryWave::new(uploader, Arc::new(RepositoryRecorder::new(repository.clone())), 2)
        .with_event_bus(bus);
    let report = wave.dispatch(vec![outcome.pending_secondaries]).await.unwrap();

    assert_eq!(report.stored, 2);
    assert_eq!(report.dropped, 0);
    let saved = repository.find_by_id(&post.id).await.unwrap().unwrap();
    assert_eq!(saved.media[0].secondary.as_deref(), Some("https://secondary.example.com/a.jpg"));
    assert_eq!(saved.media[1].secondary.as_deref(), Some("https://secondary.example.com/b.jpg"));

    let mut saw_wave = false;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Backup(BackupEvent::SecondaryWaveFinished { stored, .. }) = event {
            assert_eq!(stored, 2);
            saw_wave = true;
        }
    }
    assert!(saw_wave);
}

#[tokio::test]
async fn test_wave_drops_copies_for_deleted_records() {
    let uploader = Arc::new(DualUploader::new(
        MemoryProvider::new("primary"),
        Some(MemoryProvider::new("secondary") as Arc<dyn MediaUploader>),
    ));
    let engine = ReconciliationEngine::new(ScriptedHealth::new(&[]), uploader.clone());
    let outcome = engine
        .populate("deleted", &[ExtractedMedia::image("https://x.fbcdn.net/a.jpg")], UploadMode::Parallel)
        .await;

    let wave = SecondaryWave::new(
        uploader,
        Arc::new(RepositoryRecorder::new(Arc::new(InMemoryPostRepository::new()))),
        4,
    );
    let report = wave.dispatch(vec![outcome.pending_secondaries]).await.unwrap();

    assert_eq!(report.stored, 0);
    assert_eq!(report.dropped, 1);
}
