use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Malformed coordinate: {0}")]
    MalformedCoordinate(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Import error: {0}")]
    Import(String),
}

impl AppError {
    /// Whether a caller may retry the failed operation with backoff.
    ///
    /// Only connectivity/database failures qualify; every other variant
    /// describes the input or the stored state and would fail again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StoreUnavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
