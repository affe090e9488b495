use thiserror::Error;

/// Errors raised while resolving, authorizing or rendering a discussion request.
///
/// The view functions themselves only fail on template errors; capability checks
/// there hide controls instead of rejecting. The remaining variants come from the
/// request handler and the board store.
#[derive(Debug, Error)]
pub enum DiscussionError {
    /// Wrapper around askama rendering errors.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// Wrapper around IO errors (board file, config file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON (de)serialization of the board.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A referenced group, forum, topic or message does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// The viewer lacks the capability or role a mode requires.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Malformed request field (unknown action, non-numeric id, bad path).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Submitted form field rejected by validation.
    #[error("invalid form: {0}")]
    Form(#[from] crate::validation::FormError),
}

impl DiscussionError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        DiscussionError::NotFound { entity, id }
    }
}

pub type Result<T> = std::result::Result<T, DiscussionError>;
