use thiserror::Error;

/// Errors raised by the record store.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// The `media` column held JSON that no longer matches the slot layout.
    #[error("Stored media could not be decoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Schema setup failed: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
