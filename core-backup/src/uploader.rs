//! Dual-provider uploader
//!
//! The primary upload is awaited and its failure is reported. The secondary
//! upload either runs as a detached task next to the primary
//! ([`UploadMode::Parallel`]) or is queued for a later wave
//! ([`UploadMode::Deferred`]). Secondary failures are logged and dropped.

use bridge_traits::upload::{ContentKind, MediaSource, MediaUploader};
use core_async::task::{self, JoinHandle};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{BackupError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    /// Start the secondary upload before awaiting the primary
    #[default]
    Parallel,
    /// Queue the source; a secondary wave uploads it later
    Deferred,
}

/// Where the secondary copy of one upload stands.
pub enum SecondaryHandle {
    /// No secondary provider, or it does not take this content
    NotApplicable,
    InFlight(JoinHandle<Option<String>>),
    Deferred(MediaSource),
}

impl SecondaryHandle {
    pub fn is_applicable(&self) -> bool {
        !matches!(self, SecondaryHandle::NotApplicable)
    }
}

impl fmt::Debug for SecondaryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecondaryHandle::NotApplicable => f.write_str("NotApplicable"),
            SecondaryHandle::InFlight(_) => f.write_str("InFlight"),
            SecondaryHandle::Deferred(source) => {
                f.debug_tuple("Deferred").field(&source.describe()).finish()
            }
        }
    }
}

#[derive(Debug)]
pub struct UploadReceipt {
    pub primary: String,
    pub secondary: SecondaryHandle,
}

pub struct DualUploader {
    primary: Arc<dyn MediaUploader>,
    secondary: Option<Arc<dyn MediaUploader>>,
}

impl DualUploader {
    pub fn new(primary: Arc<dyn MediaUploader>, secondary: Option<Arc<dyn MediaUploader>>) -> Self {
        Self { primary, secondary }
    }

    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Upload to the primary and arrange the secondary copy per `mode`.
    ///
    /// # Errors
    ///
    /// `BackupError::UploadPrimary` when the primary provider fails; any
    /// in-flight secondary upload is aborted with it.
    #[instrument(skip(self, source), fields(source = %source.describe()))]
    pub async fn upload(
        &self,
        source: MediaSource,
        kind: ContentKind,
        mode: UploadMode,
    ) -> Result<UploadReceipt> {
        let secondary = self.secondary_handle(&source, kind, mode);

        match self.primary.upload(&source).await {
            Ok(primary) => {
                debug!(provider = self.primary.name(), "Primary upload stored");
                Ok(UploadReceipt { primary, secondary })
            }
            Err(e) => {
                if let SecondaryHandle::InFlight(handle) = &secondary {
                    handle.abort();
                }
                Err(BackupError::UploadPrimary {
                    origin: source.describe(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Arrange a secondary copy of `source` without touching the primary.
    pub fn secondary_handle(
        &self,
        source: &MediaSource,
        kind: ContentKind,
        mode: UploadMode,
    ) -> SecondaryHandle {
        match &self.secondary {
            Some(provider) if provider.accepts(kind) => match mode {
                UploadMode::Parallel => {
                    let provider = provider.clone();
                    let source = source.clone();
                    SecondaryHandle::InFlight(task::spawn(async move {
                        upload_secondary(provider.as_ref(), &source).await
                    }))
                }
                UploadMode::Deferred => SecondaryHandle::Deferred(source.clone()),
            },
            _ => SecondaryHandle::NotApplicable,
        }
    }

    /// Upload to both providers and wait for both.
    ///
    /// The secondary locator is `None` when there is no applicable secondary
    /// provider or its upload failed.
    pub async fn upload_both(
        &self,
        source: MediaSource,
        kind: ContentKind,
    ) -> Result<(String, Option<String>)> {
        let receipt = self.upload(source, kind, UploadMode::Parallel).await?;
        let secondary = self.resolve(receipt.secondary).await;
        Ok((receipt.primary, secondary))
    }

    /// Drive a secondary handle to its locator, swallowing failures.
    pub async fn resolve(&self, handle: SecondaryHandle) -> Option<String> {
        match handle {
            SecondaryHandle::NotApplicable => None,
            SecondaryHandle::InFlight(join) => join.await.ok().flatten(),
            SecondaryHandle::Deferred(source) => match &self.secondary {
                Some(provider) => upload_secondary(provider.as_ref(), &source).await,
                None => None,
            },
        }
    }
}

async fn upload_secondary(provider: &dyn MediaUploader, source: &MediaSource) -> Option<String> {
    match provider.upload(source).await {
        Ok(locator) => Some(locator),
        Err(e) => {
            let error = BackupError::UploadSecondary {
                provider: provider.name().to_string(),
                message: e.to_string(),
            };
            warn!(source = %source.describe(), "{}", error);
            None
        }
    }
}
