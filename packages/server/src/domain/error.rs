//! Domain errors.

use thiserror::Error;

/// Chat content was missing or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("message content must be a non-empty string")]
pub struct InvalidContent;
