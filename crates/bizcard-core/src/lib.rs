//! Core types for the bizcard contact-card engine.
//!
//! This crate is deliberately free of I/O. It defines the validated
//! [`ContactProfile`] snapshot that the vCard codec consumes, plus the
//! conversion from the flat card records persisted by older clients.

pub mod error;
pub mod legacy;
pub mod profile;

pub use error::{Error, Result};
pub use profile::{
  ContactProfile, PhoneKind, PhoneNumber, Photo, PhotoEncoding, SocialProfile,
  validate,
};
