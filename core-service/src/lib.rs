//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided collaborators (HTTP, record store, storage
//! providers) into the archive core. Desktop apps typically enable the
//! `desktop-shims` feature, which depends on `bridge-desktop` for the reqwest
//! client and keeps records in SQLite.

pub mod error;
pub mod service;

pub use error::{Result, ServiceError};
pub use service::{ArchiveReport, ArchiveService, CoreDependencies};

#[cfg(feature = "desktop-shims")]
use std::sync::Arc;

#[cfg(feature = "desktop-shims")]
use core_library::{
    db::{create_pool, DatabaseConfig},
    repositories::{InMemoryPostRepository, PostRepository, SqlitePostRepository},
};
#[cfg(feature = "desktop-shims")]
use core_runtime::config::ArchiveConfig;

/// Convenience bootstrapper for desktop hosts.
///
/// Uses the injected HTTP client or the reqwest one, and a SQLite store when
/// `database_path` is set (in-memory records otherwise).
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::config::{ArchiveConfig, CloudinaryConfig};
///
/// let config = ArchiveConfig::builder()
///     .database_path("archive.db")
///     .cloudinary(CloudinaryConfig::new("demo", "unsigned"))
///     .build()?;
/// let core = core_service::bootstrap_desktop(config).await?;
/// let output = core.extract("https://www.instagram.com/p/ABC123/").await;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(mut config: ArchiveConfig) -> Result<ArchiveService> {
    if config.http_client.is_none() {
        let client = bridge_desktop::ReqwestHttpClient::new()
            .map_err(|err| ServiceError::InitializationFailed(err.to_string()))?;
        config.http_client = Some(Arc::new(client));
    }

    let repository: Arc<dyn PostRepository> = match &config.database_path {
        Some(path) => {
            let pool = create_pool(DatabaseConfig::new(path.clone())).await?;
            Arc::new(SqlitePostRepository::new(pool))
        }
        None => Arc::new(InMemoryPostRepository::new()),
    };

    let deps = CoreDependencies::from_config(&config, repository)?;
    Ok(ArchiveService::new(deps, &config))
}
