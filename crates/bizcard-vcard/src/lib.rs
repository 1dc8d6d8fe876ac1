//! vCard 3.0 codec for bizcard.
//!
//! Converts a [`ContactProfile`] into the vCard text embedded in QR codes and
//! offered as `.vcf` downloads, and reads such cards back. Pure synchronous;
//! no I/O and no shared state.
//!
//! # Quick start
//!
//! ```no_run
//! use bizcard_core::{ContactProfile, PhoneKind};
//!
//! let profile = ContactProfile::new("Ada Lovelace")
//!   .with_email("ada@example.com")
//!   .with_phone(PhoneKind::Cell, "555-1234");
//! let vcard = bizcard_vcard::encode(&profile).unwrap();
//! assert!(vcard.starts_with("BEGIN:VCARD\r\n"));
//! ```

pub mod error;
mod fingerprint;
mod parse;
mod serialize;

use bizcard_core::ContactProfile;

pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use serialize::{EncodeOptions, Escaping, LineEnding};

/// Media type for `.vcf` downloads.
pub const MEDIA_TYPE: &str = "text/vcard";

/// File extension for downloaded cards.
pub const FILE_EXTENSION: &str = "vcf";

// ─── Public API ───────────────────────────────────────────────────────────────

/// Serialize `profile` as a vCard 3.0 string (CRLF, unescaped, unfolded).
pub fn encode(profile: &ContactProfile) -> Result<String> {
  serialize::encode(profile)
}

/// Serialize `profile` as a vCard 3.0 string using `opts`.
pub fn encode_with(profile: &ContactProfile, opts: &EncodeOptions) -> Result<String> {
  serialize::encode_with(profile, opts)
}

/// Parse a single vCard into a profile with a fresh id.
pub fn decode(input: &str) -> Result<ContactProfile> { parse::parse_one(input) }

/// Parse zero or more vCards from `input`.
///
/// Each `BEGIN:VCARD … END:VCARD` block is parsed independently; a malformed
/// block yields `Err(…)` in the corresponding position without aborting the
/// rest.
pub fn decode_many(input: &str) -> Vec<Result<ContactProfile>> {
  let lines = parse::unfold_lines(input);
  let mut results = Vec::new();
  let mut i = 0;

  while i < lines.len() {
    if lines[i].eq_ignore_ascii_case("BEGIN:VCARD") {
      let start = i;
      let rel_end = lines[start + 1..]
        .iter()
        .position(|l| l.eq_ignore_ascii_case("END:VCARD"));

      if let Some(offset) = rel_end {
        let end = start + 1 + offset;
        let card_str = lines[start..=end].join("\r\n") + "\r\n";
        results.push(parse::parse_one(&card_str));
        i = end + 1;
      } else {
        results.push(Err(Error::MissingEnvelope));
        break;
      }
    } else {
      i += 1;
    }
  }

  results
}

/// Suggested file name for downloading `profile`, e.g. `Ada_Lovelace.vcf`.
pub fn download_filename(profile: &ContactProfile) -> String {
  let stem = profile
    .display_name
    .split_whitespace()
    .map(|token| {
      token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
    })
    .filter(|token| !token.is_empty())
    .collect::<Vec<_>>()
    .join("_");

  if stem.is_empty() {
    format!("contact.{FILE_EXTENSION}")
  } else {
    format!("{stem}.{FILE_EXTENSION}")
  }
}

// ─── Round-trip test ─────────────────────────────────────────────────────────
