//! Secondary upload waves
//!
//! After a record has been persisted with its primary locators, the pending
//! secondary copies are resolved in one detached task. Each locator that comes
//! back is written to the record through the store's `update`, matched by the
//! primary locator it belongs to. Nothing here can fail the caller.

use async_trait::async_trait;
use core_async::task::{self, JoinHandle};
use core_library::models::StoredMediaSlot;
use core_library::repositories::PostRepository;
use core_runtime::events::{BackupEvent, CoreEvent, EventBus};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::uploader::{DualUploader, SecondaryHandle};

/// Which locator pair of a slot a secondary copy belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    Main,
    Thumbnail,
}

#[derive(Debug)]
pub struct PendingSecondary {
    /// Primary locator the copy belongs to
    pub primary: String,
    pub field: SlotField,
    pub handle: SecondaryHandle,
}

/// Secondary copies owed to one record.
#[derive(Debug)]
pub struct PendingSecondaries {
    pub post_id: String,
    pub entries: Vec<PendingSecondary>,
}

impl PendingSecondaries {
    pub fn new(post_id: impl Into<String>, entries: Vec<PendingSecondary>) -> Self {
        Self {
            post_id: post_id.into(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A resolved secondary copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryLocator {
    pub primary: String,
    pub field: SlotField,
    pub locator: String,
}

/// Writes resolved secondary locators back to a record.
#[async_trait]
pub trait SecondaryRecorder: Send + Sync {
    /// Returns how many locators were stored.
    async fn record(&self, post_id: &str, locators: &[SecondaryLocator]) -> usize;
}

/// [`SecondaryRecorder`] over the record store.
pub struct RepositoryRecorder {
    repository: Arc<dyn PostRepository>,
}

impl RepositoryRecorder {
    pub fn new(repository: Arc<dyn PostRepository>) -> Self {
        Self { repository }
    }
}

fn attach(slots: &mut [StoredMediaSlot], found: &SecondaryLocator) -> bool {
    let slot = slots.iter_mut().find(|slot| {
        !slot.manual
            && match found.field {
                SlotField::Main => slot.primary == found.primary,
                SlotField::Thumbnail => slot.thumbnail.as_deref() == Some(found.primary.as_str()),
            }
    });

    match (slot, found.field) {
        (Some(slot), SlotField::Main) => {
            slot.secondary = Some(found.locator.clone());
            true
        }
        (Some(slot), SlotField::Thumbnail) => {
            slot.thumbnail_secondary = Some(found.locator.clone());
            true
        }
        (None, _) => false,
    }
}

#[async_trait]
impl SecondaryRecorder for RepositoryRecorder {
    async fn record(&self, post_id: &str, locators: &[SecondaryLocator]) -> usize {
        let mut post = match self.repository.find_by_id(post_id).await {
            Ok(Some(post)) => post,
            Ok(None) => {
                debug!(post_id, "Record gone before secondary copies landed");
                return 0;
            }
            Err(e) => {
                warn!(post_id, error = %e, "Could not load record for secondary copies");
                return 0;
            }
        };

        let stored = locators
            .iter()
            .filter(|found| {
                let attached = attach(&mut post.media, found);
                if !attached {
                    debug!(post_id, primary = %found.primary, "Slot no longer present");
                }
                attached
            })
            .count();

        if stored == 0 {
            return 0;
        }

        post.touch();
        match self.repository.update(&post).await {
            Ok(()) => stored,
            Err(e) => {
                warn!(post_id, error = %e, "Could not store secondary copies");
                0
            }
        }
    }
}

/// Outcome of one wave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveReport {
    pub stored: u32,
    pub dropped: u32,
}

pub struct SecondaryWave {
    uploader: Arc<DualUploader>,
    recorder: Arc<dyn SecondaryRecorder>,
    concurrency: usize,
    event_bus: Option<EventBus>,
}

impl SecondaryWave {
    pub fn new(
        uploader: Arc<DualUploader>,
        recorder: Arc<dyn SecondaryRecorder>,
        concurrency: usize,
    ) -> Self {
        Self {
            uploader,
            recorder,
            concurrency: concurrency.max(1),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Resolve every pending copy in a detached task.
    pub fn dispatch(&self, pending: Vec<PendingSecondaries>) -> JoinHandle<WaveReport> {
        let uploader = self.uploader.clone();
        let recorder = self.recorder.clone();
        let concurrency = self.concurrency;
        let event_bus = self.event_bus.clone();

        task::spawn(async move {
            let report = run_wave(uploader, recorder, concurrency, pending).await;

            if report.stored + report.dropped > 0 {
                info!(stored = report.stored, dropped = report.dropped, "Secondary wave finished");
                if let Some(bus) = event_bus {
                    bus.emit(CoreEvent::Backup(BackupEvent::SecondaryWaveFinished {
                        stored: report.stored,
                        dropped: report.dropped,
                    }))
                    .ok();
                }
            }
            report
        })
    }
}

async fn run_wave(
    uploader: Arc<DualUploader>,
    recorder: Arc<dyn SecondaryRecorder>,
    concurrency: usize,
    pending: Vec<PendingSecondaries>,
) -> WaveReport {
    let jobs: Vec<(String, PendingSecondary)> = pending
        .into_iter()
        .flat_map(|batch| {
            let post_id = batch.post_id;
            batch
                .entries
                .into_iter()
                .filter(|entry| entry.handle.is_applicable())
                .map(move |entry| (post_id.clone(), entry))
        })
        .collect();
    let total = jobs.len() as u32;

    let resolved: Vec<(String, Option<SecondaryLocator>)> = stream::iter(jobs)
        .map(|(post_id, entry)| {
            let uploader = uploader.clone();
            async move {
                let locator = uploader.resolve(entry.handle).await.map(|locator| SecondaryLocator {
                    primary: entry.primary,
                    field: entry.field,
                    locator,
                });
                (post_id, locator)
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut by_post: BTreeMap<String, Vec<SecondaryLocator>> = BTreeMap::new();
    for (post_id, locator) in resolved {
        if let Some(locator) = locator {
            by_post.entry(post_id).or_default().push(locator);
        }
    }

    let mut stored = 0u32;
    for (post_id, locators) in &by_post {
        stored += recorder.record(post_id, locators).await as u32;
    }

    WaveReport {
        stored,
        dropped: total - stored,
    }
}
