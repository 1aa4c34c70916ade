//! # Core Configuration Module
//!
//! Provides configuration management for the post archive core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! [`ArchiveConfig`] holding the HTTP bridge, the storage provider credentials
//! and the tuning knobs of each pipeline stage. `build()` runs fail-fast
//! validation so a misconfigured host learns about it before the first sync.
//!
//! ## Required Settings
//!
//! - [`CloudinaryConfig`] - primary storage provider
//!
//! ## Optional Settings (with defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest, wired by `core-service`)
//! - [`ImgbbConfig`] - secondary storage provider; secondary uploads are skipped without it
//! - `database_path` - SQLite file for archived posts; in-memory store without it
//! - [`ExtractionConfig`], [`BackupConfig`], [`SyncConfig`]
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{ArchiveConfig, CloudinaryConfig};
//!
//! let config = ArchiveConfig::builder()
//!     .database_path("/path/to/archive.db")
//!     .cloudinary(CloudinaryConfig::new("my-cloud", "unsigned-preset"))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::ArchiveConfig;
//!
//! // Missing primary provider
//! let config = ArchiveConfig::builder()
//!     .build()
//!     .expect("Should fail - missing primary provider");
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Desktop browser user agent used by the structured query and page strategies.
pub const DEFAULT_DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Mobile app user agent accepted by the private media endpoint.
pub const DEFAULT_MOBILE_USER_AGENT: &str =
    "Instagram 219.0.0.12.117 Android (31/12; 420dpi; 1080x2400; samsung; SM-G991B; o1s; exynos2100; en_US; 346138365)";

/// Web application id sent as `X-IG-App-ID`.
pub const DEFAULT_WEB_APP_ID: &str = "936619743392459";

// ============================================================================
// Extraction
// ============================================================================

/// Settings for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Structured query template identifiers, tried in order
    pub query_templates: Vec<String>,
    /// Value of the `X-IG-App-ID` header
    pub web_app_id: String,
    pub desktop_user_agent: String,
    pub mobile_user_agent: String,
    /// Host suffixes whose URLs count as post media during raw scans
    pub cdn_hosts: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            query_templates: vec![
                "8845758582119845".to_string(),
                "10015901848480474".to_string(),
            ],
            web_app_id: DEFAULT_WEB_APP_ID.to_string(),
            desktop_user_agent: DEFAULT_DESKTOP_USER_AGENT.to_string(),
            mobile_user_agent: DEFAULT_MOBILE_USER_AGENT.to_string(),
            cdn_hosts: vec!["cdninstagram.com".to_string(), "fbcdn.net".to_string()],
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.query_templates.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Config(
                "Query template identifiers cannot be empty".to_string(),
            ));
        }

        if self.web_app_id.trim().is_empty() {
            return Err(Error::Config("Web app id cannot be empty".to_string()));
        }

        if self.desktop_user_agent.trim().is_empty() || self.mobile_user_agent.trim().is_empty()
        {
            return Err(Error::Config("User agents cannot be empty".to_string()));
        }

        if self.cdn_hosts.is_empty() {
            return Err(Error::Config(
                "At least one CDN host suffix is required for media scans".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Backup
// ============================================================================

/// Settings for health checks and the dual-provider upload path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    /// Upper bound for one health probe (HEAD plus optional GET fallback)
    pub health_timeout: Duration,
    /// Batch runs queue secondary uploads into one wave after the batch
    pub defer_secondary_in_batch: bool,
    /// Concurrent uploads inside one secondary wave
    pub secondary_concurrency: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            health_timeout: Duration::from_secs(10),
            defer_secondary_in_batch: true,
            secondary_concurrency: 4,
        }
    }
}

impl BackupConfig {
    pub fn validate(&self) -> Result<()> {
        let secs = self.health_timeout.as_secs();
        if self.health_timeout.is_zero() || secs > 120 {
            return Err(Error::Config(
                "Health check timeout must be between 1 and 120 seconds".to_string(),
            ));
        }

        if self.secondary_concurrency == 0 {
            return Err(Error::Config(
                "Secondary wave concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Sync
// ============================================================================

/// Date notations recognised inside captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptionDateFormat {
    /// Six digits, `YYMMDD`
    Compact,
    /// `YYYY-MM-DD`, also with `.` or `/` separators
    IsoLike,
}

/// Settings for the sync orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Pause between items of a batch
    pub inter_item_delay: Duration,
    /// Fixed local UTC offset applied to post timestamps
    pub utc_offset_hours: i32,
    /// Caption date notations, in preference order
    pub caption_date_formats: Vec<CaptionDateFormat>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            inter_item_delay: Duration::from_millis(1500),
            utc_offset_hours: 8,
            caption_date_formats: vec![CaptionDateFormat::Compact, CaptionDateFormat::IsoLike],
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<()> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(Error::Config(format!(
                "UTC offset {} is outside the valid range -12..=14",
                self.utc_offset_hours
            )));
        }

        if self.inter_item_delay > Duration::from_secs(60) {
            return Err(Error::Config(
                "Inter-item delay exceeds maximum of 60 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Storage providers
// ============================================================================

/// Primary provider credentials (unsigned upload preset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub folder: Option<String>,
}

impl CloudinaryConfig {
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
            folder: None,
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cloud_name.trim().is_empty() {
            return Err(Error::Config("Cloudinary cloud name cannot be empty".to_string()));
        }
        if self.upload_preset.trim().is_empty() {
            return Err(Error::Config(
                "Cloudinary upload preset cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Secondary provider credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ImgbbConfig {
    pub api_key: String,
    /// Optional auto-delete, in seconds (provider accepts 60..=15552000)
    pub expiration_secs: Option<u64>,
}

impl std::fmt::Debug for ImgbbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImgbbConfig")
            .field("api_key", &"[REDACTED]")
            .field("expiration_secs", &self.expiration_secs)
            .finish()
    }
}

impl ImgbbConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            expiration_secs: None,
        }
    }

    pub fn with_expiration(mut self, secs: u64) -> Self {
        self.expiration_secs = Some(secs);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("ImgBB API key cannot be empty".to_string()));
        }
        if let Some(secs) = self.expiration_secs {
            if !(60..=15_552_000).contains(&secs) {
                return Err(Error::Config(
                    "ImgBB expiration must be between 60 and 15552000 seconds".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Archive configuration
// ============================================================================

/// Complete configuration for the archive core.
///
/// Use [`ArchiveConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ArchiveConfig {
    /// SQLite file for archived posts; `None` keeps records in memory
    pub database_path: Option<PathBuf>,

    /// HTTP client (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    pub extraction: ExtractionConfig,
    pub backup: BackupConfig,
    pub sync: SyncConfig,

    /// Primary storage provider (required)
    pub cloudinary: CloudinaryConfig,

    /// Secondary storage provider (optional)
    pub imgbb: Option<ImgbbConfig>,
}

impl std::fmt::Debug for ArchiveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveConfig")
            .field("database_path", &self.database_path)
            .field("http_client", &self.http_client.as_ref().map(|_| "<injected>"))
            .field("extraction", &self.extraction)
            .field("backup", &self.backup)
            .field("sync", &self.sync)
            .field("cloudinary", &self.cloudinary)
            .field("imgbb", &self.imgbb)
            .finish()
    }
}

impl ArchiveConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ArchiveConfigBuilder {
        ArchiveConfigBuilder::default()
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        self.extraction.validate()?;
        self.backup.validate()?;
        self.sync.validate()?;
        self.cloudinary.validate()?;
        if let Some(imgbb) = &self.imgbb {
            imgbb.validate()?;
        }

        Ok(())
    }

    /// Returns the HTTP client or an actionable error when none was injected.
    pub fn require_http_client(&self) -> Result<Arc<dyn HttpClient>> {
        self.http_client.clone().ok_or_else(|| Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "An HttpClient implementation is required for extraction and uploads. \
                      Desktop: enable the 'desktop-shims' feature of core-service to use \
                      the reqwest client. Other hosts: inject one with .http_client()."
                .to_string(),
        })
    }
}

/// Builder for constructing [`ArchiveConfig`] instances.
#[derive(Default)]
pub struct ArchiveConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    extraction: Option<ExtractionConfig>,
    backup: Option<BackupConfig>,
    sync: Option<SyncConfig>,
    cloudinary: Option<CloudinaryConfig>,
    imgbb: Option<ImgbbConfig>,
}

impl ArchiveConfigBuilder {
    /// Sets the SQLite database path.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn extraction(mut self, config: ExtractionConfig) -> Self {
        self.extraction = Some(config);
        self
    }

    pub fn backup(mut self, config: BackupConfig) -> Self {
        self.backup = Some(config);
        self
    }

    pub fn sync(mut self, config: SyncConfig) -> Self {
        self.sync = Some(config);
        self
    }

    /// Sets the primary provider.
    pub fn cloudinary(mut self, config: CloudinaryConfig) -> Self {
        self.cloudinary = Some(config);
        self
    }

    /// Sets the secondary provider.
    pub fn imgbb(mut self, config: ImgbbConfig) -> Self {
        self.imgbb = Some(config);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the primary provider is missing or any
    /// section fails validation.
    pub fn build(self) -> Result<ArchiveConfig> {
        let cloudinary = self.cloudinary.ok_or_else(|| {
            Error::Config(
                "Primary storage provider is required. Use .cloudinary() to set it.".to_string(),
            )
        })?;

        let config = ArchiveConfig {
            database_path: self.database_path,
            http_client: self.http_client,
            extraction: self.extraction.unwrap_or_default(),
            backup: self.backup.unwrap_or_default(),
            sync: self.sync.unwrap_or_default(),
            cloudinary,
            imgbb: self.imgbb,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary() -> CloudinaryConfig {
        CloudinaryConfig::new("demo", "unsigned")
    }

    #[test]
    fn test_builder_applies_defaults() {
        let config = ArchiveConfig::builder().cloudinary(primary()).build().unwrap();

        assert!(config.database_path.is_none());
        assert!(config.imgbb.is_none());
        assert_eq!(config.backup.health_timeout, Duration::from_secs(10));
        assert!(config.backup.defer_secondary_in_batch);
        assert_eq!(config.sync.utc_offset_hours, 8);
        assert_eq!(config.sync.inter_item_delay, Duration::from_millis(1500));
        assert_eq!(
            config.sync.caption_date_formats,
            vec![CaptionDateFormat::Compact, CaptionDateFormat::IsoLike]
        );
        assert_eq!(config.extraction.query_templates.len(), 2);
    }

    #[test]
    fn test_missing_primary_provider() {
        let result = ArchiveConfig::builder().build();
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains(".cloudinary()")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        let result = ArchiveConfig::builder()
            .cloudinary(CloudinaryConfig::new("", "preset"))
            .build();
        assert!(result.is_err());

        let result = ArchiveConfig::builder()
            .cloudinary(primary())
            .imgbb(ImgbbConfig::new("  "))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_health_timeout_bounds() {
        let mut backup = BackupConfig::default();
        backup.health_timeout = Duration::ZERO;
        assert!(backup.validate().is_err());

        backup.health_timeout = Duration::from_secs(121);
        assert!(backup.validate().is_err());

        backup.health_timeout = Duration::from_secs(120);
        assert!(backup.validate().is_ok());
    }

    #[test]
    fn test_utc_offset_bounds() {
        let mut sync = SyncConfig::default();
        sync.utc_offset_hours = 15;
        assert!(sync.validate().is_err());

        sync.utc_offset_hours = -12;
        assert!(sync.validate().is_ok());
    }

    #[test]
    fn test_imgbb_expiration_bounds() {
        assert!(ImgbbConfig::new("key").with_expiration(30).validate().is_err());
        assert!(ImgbbConfig::new("key").with_expiration(600).validate().is_ok());
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let config = ImgbbConfig::new("super-secret-key");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_missing_http_client_is_actionable() {
        let config = ArchiveConfig::builder().cloudinary(primary()).build().unwrap();
        match config.require_http_client() {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "HttpClient")
            }
            _ => panic!("expected missing capability"),
        }
    }
}
