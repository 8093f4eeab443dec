use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResqError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Malformed data in '{collection}': {reason}")]
    Malformed { collection: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ResqError {
    /// True for failures of the persisted tables themselves (I/O or bad content).
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            ResqError::Malformed { .. } | ResqError::Io(_) | ResqError::Csv(_) | ResqError::Json(_)
        )
    }

    pub(crate) fn malformed(collection: &str, reason: impl Into<String>) -> Self {
        ResqError::Malformed {
            collection: collection.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for ResqError {
    fn from(e: reqwest::Error) -> Self {
        ResqError::Upstream(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ResqError>;
