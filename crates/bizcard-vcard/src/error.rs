//! Error types for the bizcard-vcard codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid profile: {0}")]
  InvalidProfile(#[from] bizcard_core::Error),

  #[error("vCard missing BEGIN/END:VCARD envelope")]
  MissingEnvelope,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
