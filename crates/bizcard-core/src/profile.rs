//! Contact profile — the value object handed to the vCard serializer.
//!
//! A profile is a snapshot taken from the editing surface. It is never
//! mutated by the codec; [`validate`] is the only behaviour it carries beyond
//! construction.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Phone numbers ───────────────────────────────────────────────────────────

/// The mode of a telephone number; the strum form is the vCard `TYPE` token.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum PhoneKind {
  Cell,
  Work,
  Fax,
}

/// A telephone number (maps to vCard `TEL`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
  pub kind:  PhoneKind,
  pub value: String,
}

// ─── Photo ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoEncoding {
  /// `value` is a link to the image.
  Uri,
  /// `value` is inline image data, optionally behind a `data:` URI header.
  Base64,
}

/// A profile photo, either linked or inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
  pub encoding: PhotoEncoding,
  pub value:    String,
}

impl Photo {
  pub fn uri(value: impl Into<String>) -> Self {
    Self {
      encoding: PhotoEncoding::Uri,
      value:    value.into(),
    }
  }

  pub fn base64(value: impl Into<String>) -> Self {
    Self {
      encoding: PhotoEncoding::Base64,
      value:    value.into(),
    }
  }

  /// The inline payload with any `data:<mime>;base64,` header stripped.
  /// Returns the value unchanged for URI photos.
  pub fn base64_data(&self) -> &str {
    match self.encoding {
      PhotoEncoding::Uri => &self.value,
      PhotoEncoding::Base64 => split_data_uri(&self.value).1,
    }
  }

  /// [`Self::base64_data`] with embedded line breaks and spaces removed, so
  /// the payload fits on a single content line.
  pub fn base64_data_compact(&self) -> String { compact(self.base64_data()) }

  /// Image subtype for inline photos (`JPEG`, `PNG`, `GIF`, `WEBP`).
  ///
  /// Taken from the data-URI header when there is one, otherwise sniffed
  /// from the decoded magic bytes.
  pub fn media_type(&self) -> Option<&'static str> {
    if self.encoding == PhotoEncoding::Uri {
      return None;
    }
    let (header, data) = split_data_uri(&self.value);
    if let Some(mime) = header {
      return subtype_from_mime(mime);
    }
    let bytes = decode_base64(data).ok()?;
    sniff_image(&bytes)
  }
}

/// Split `data:image/png;base64,AAAA` into (`Some("image/png")`, `"AAAA"`).
fn split_data_uri(value: &str) -> (Option<&str>, &str) {
  let Some(rest) = value.strip_prefix("data:") else {
    return (None, value);
  };
  match rest.split_once(',') {
    Some((header, data)) => {
      let mime = header.split(';').next().unwrap_or_default();
      (Some(mime), data)
    }
    None => (None, value),
  }
}

fn subtype_from_mime(mime: &str) -> Option<&'static str> {
  match mime.trim().to_ascii_lowercase().as_str() {
    "image/jpeg" | "image/jpg" => Some("JPEG"),
    "image/png" => Some("PNG"),
    "image/gif" => Some("GIF"),
    "image/webp" => Some("WEBP"),
    _ => None,
  }
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
  match bytes {
    [0xFF, 0xD8, 0xFF, ..] => Some("JPEG"),
    [0x89, b'P', b'N', b'G', ..] => Some("PNG"),
    [b'G', b'I', b'F', b'8', ..] => Some("GIF"),
    [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
      Some("WEBP")
    }
    _ => None,
  }
}

fn compact(data: &str) -> String {
  data.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}

/// Decode standard base64, ignoring embedded line breaks and spaces.
fn decode_base64(data: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
  STANDARD.decode(compact(data))
}

// ─── Social profiles ─────────────────────────────────────────────────────────

/// A social or messaging handle; `platform` is a free-form tag such as
/// `linkedin` or `telegram`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialProfile {
  pub platform: String,
  pub value:    String,
}

// ─── ContactProfile ──────────────────────────────────────────────────────────

/// One person's or organisation's shareable contact data.
///
/// `None` means the field was never set; `Some("")` means it was set to an
/// empty string. Neither produces a vCard line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactProfile {
  /// Opaque identifier owned by the application; never serialized to vCard.
  #[serde(default = "new_id")]
  pub id:                String,
  pub display_name:      String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub job_title:         Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub organization_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub department:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:             Option<String>,
  #[serde(default)]
  pub phone_numbers:     Vec<PhoneNumber>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub website:           Option<String>,
  /// Single free-text address line.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub address:           Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bio:               Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub photo:             Option<Photo>,
  #[serde(default)]
  pub social_profiles:   Vec<SocialProfile>,
}

fn new_id() -> String { Uuid::new_v4().to_string() }

impl ContactProfile {
  /// A profile with a fresh id and every optional field empty.
  pub fn new(display_name: impl Into<String>) -> Self {
    Self {
      id:                new_id(),
      display_name:      display_name.into(),
      job_title:         None,
      organization_name: None,
      department:        None,
      email:             None,
      phone_numbers:     Vec::new(),
      website:           None,
      address:           None,
      bio:               None,
      photo:             None,
      social_profiles:   Vec::new(),
    }
  }

  pub fn with_job_title(mut self, title: impl Into<String>) -> Self {
    self.job_title = Some(title.into());
    self
  }

  pub fn with_organization(mut self, name: impl Into<String>) -> Self {
    self.organization_name = Some(name.into());
    self
  }

  pub fn with_department(mut self, department: impl Into<String>) -> Self {
    self.department = Some(department.into());
    self
  }

  pub fn with_email(mut self, email: impl Into<String>) -> Self {
    self.email = Some(email.into());
    self
  }

  pub fn with_phone(mut self, kind: PhoneKind, value: impl Into<String>) -> Self {
    self.phone_numbers.push(PhoneNumber {
      kind,
      value: value.into(),
    });
    self
  }

  pub fn with_website(mut self, url: impl Into<String>) -> Self {
    self.website = Some(url.into());
    self
  }

  pub fn with_address(mut self, address: impl Into<String>) -> Self {
    self.address = Some(address.into());
    self
  }

  pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
    self.bio = Some(bio.into());
    self
  }

  pub fn with_photo(mut self, photo: Photo) -> Self {
    self.photo = Some(photo);
    self
  }

  pub fn with_social(
    mut self,
    platform: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    self.social_profiles.push(SocialProfile {
      platform: platform.into(),
      value:    value.into(),
    });
    self
  }

  /// Split the display name into `(first, last)`.
  ///
  /// The first whitespace token is the given name and the last token is the
  /// family name; any tokens in between are dropped. A single token yields an
  /// empty family name.
  pub fn name_parts(&self) -> (&str, &str) {
    let mut tokens = self.display_name.split_whitespace();
    let first = tokens.next().unwrap_or_default();
    let last = tokens.next_back().unwrap_or_default();
    (first, last)
  }

  pub fn validate(&self) -> Result<()> { validate(self) }
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Check the invariants the serializer relies on.
///
/// Free-form fields (email, website, ...) are accepted as-is.
pub fn validate(profile: &ContactProfile) -> Result<()> {
  if profile.display_name.trim().is_empty() {
    return Err(Error::MissingDisplayName);
  }

  if let Some(index) = profile.phone_numbers.iter().position(|p| p.value.is_empty())
  {
    return Err(Error::EmptyFieldValue {
      field: "phoneNumbers",
      index,
    });
  }

  if let Some(index) =
    profile.social_profiles.iter().position(|s| s.value.is_empty())
  {
    return Err(Error::EmptyFieldValue {
      field: "socialProfiles",
      index,
    });
  }

  if let Some(photo) = &profile.photo {
    validate_photo(photo)?;
  }

  Ok(())
}

fn validate_photo(photo: &Photo) -> Result<()> {
  match photo.encoding {
    PhotoEncoding::Uri if photo.value.trim().is_empty() => {
      Err(Error::InvalidPhoto("empty URI".to_string()))
    }
    PhotoEncoding::Uri => Ok(()),
    PhotoEncoding::Base64 => {
      let data = photo.base64_data();
      if data.trim().is_empty() {
        return Err(Error::InvalidPhoto("empty base64 payload".to_string()));
      }
      decode_base64(data)
        .map(|_| ())
        .map_err(|e| Error::InvalidPhoto(e.to_string()))
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
