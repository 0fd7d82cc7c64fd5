use playvault_core::error::CoreError;
use playvault_core::types::Playlist;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Remote write failed: {0}")]
    RemoteWrite(String),

    #[error("Query needs an index that is not ready: {0}")]
    IndexUnavailable(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Search provider error: {0}")]
    Search(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Result discarded: the view was closed before the request finished")]
    Discarded,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    pub fn playlist_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Playlist",
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Validation(_) => ErrorKind::Validation,
            SyncError::NotFound { .. } => ErrorKind::NotFound,
            SyncError::RemoteWrite(_) => ErrorKind::RemoteWrite,
            SyncError::IndexUnavailable(_) => ErrorKind::IndexUnavailable,
            _ => ErrorKind::Other,
        }
    }
}

impl From<CoreError> for SyncError {
    fn from(err: CoreError) -> Self {
        SyncError::Validation(err.to_string())
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::IndexNotReady(msg) => SyncError::IndexUnavailable(msg),
            other => SyncError::Store(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// How a failure should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inline next to the offending field.
    Validation,
    /// Page-level "not found" message.
    NotFound,
    /// Toast after the local state was rolled back.
    RemoteWrite,
    /// Never shown; handled by degraded paging.
    IndexUnavailable,
    Other,
}

// ---------------------------------------------------------------------------
// SyncFailure
// ---------------------------------------------------------------------------

/// What happened to local state after a failed mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    /// The failure happened before any local change was made.
    Unchanged,
    /// The write failed; local state was replaced with the stored playlist.
    RolledBack(Playlist),
    /// The write failed and the stored playlist could not be read back, so
    /// local state still holds the optimistic edit.
    RefetchFailed(String),
    /// The view was closed; the result was dropped.
    Discarded,
}

/// Error half of a reconciled mutation.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SyncFailure {
    pub error: SyncError,
    pub recovery: Recovery,
}

impl SyncFailure {
    pub fn unchanged(error: impl Into<SyncError>) -> Self {
        Self {
            error: error.into(),
            recovery: Recovery::Unchanged,
        }
    }

    pub fn discarded() -> Self {
        Self {
            error: SyncError::Discarded,
            recovery: Recovery::Discarded,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// The authoritative playlist, when a rollback produced one.
    pub fn rolled_back_to(&self) -> Option<&Playlist> {
        match &self.recovery {
            Recovery::RolledBack(p) => Some(p),
            _ => None,
        }
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncFailure>;
