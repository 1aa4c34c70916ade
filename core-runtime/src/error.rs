use thiserror::Error;

/// Errors raised while validating configuration or bringing up the runtime.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A host collaborator the core cannot run without was not injected.
    #[error("Missing host capability {capability}: {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
