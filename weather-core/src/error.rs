use thiserror::Error;

/// Failures of the query pipeline.
///
/// The message is always user-facing; the HTTP layer copies it into the
/// `{"error": ...}` body for create and update.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Bad or missing request input.
    #[error("{0}")]
    Validation(String),

    /// Unknown id, or no geocoding match.
    #[error("{0}")]
    NotFound(String),

    /// Upstream weather API failed or answered with something unexpected.
    #[error("{0}")]
    Upstream(String),

    /// Persistence failure.
    #[error("{0}")]
    Store(String),

    /// A geocoder or forecast failure surfaced while serving a request.
    #[error("{0}")]
    Adapter(Box<QueryError>),
}

pub type Result<T, E = QueryError> = std::result::Result<T, E>;

impl QueryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn adapter(inner: QueryError) -> Self {
        match inner {
            already @ Self::Adapter(_) => already,
            other => Self::Adapter(Box::new(other)),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(format!("SQLite error: {err}"))
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(format!("Failed to (de)serialize stored query: {err}"))
    }
}
