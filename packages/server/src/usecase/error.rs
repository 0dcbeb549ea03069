//! UseCase errors.

use thiserror::Error;

use crate::domain::InvalidContent;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("invalid content: {0}")]
    InvalidContent(#[from] InvalidContent),
}
