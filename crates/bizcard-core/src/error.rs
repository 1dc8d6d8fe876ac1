//! Error types for `bizcard-core`.

use thiserror::Error;

/// Why a [`crate::profile::ContactProfile`] cannot be serialized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("display name is missing or blank")]
  MissingDisplayName,

  #[error("{field}[{index}] has an empty value")]
  EmptyFieldValue { field: &'static str, index: usize },

  #[error("invalid photo: {0}")]
  InvalidPhoto(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
