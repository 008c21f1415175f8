//! DPQ error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DpqError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("script missing after re-upload: {0}")]
    ScriptMissing(String),
}

impl From<redis::RedisError> for DpqError {
    fn from(e: redis::RedisError) -> Self {
        DpqError::Store(e.to_string())
    }
}
