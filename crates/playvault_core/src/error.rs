use thiserror::Error;

/// Errors from pure list and form operations. Both variants are caused by
/// user input and are meant to be shown next to the offending field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Index {index} out of range (list has {len} entries)")]
    Index { index: usize, len: usize },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
