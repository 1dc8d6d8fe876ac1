//! Flat card records written by older clients.
//!
//! Those records carry one optional string key per field and one key per
//! social platform (`linkedin`, `whatsapp`, ...). Empty strings meant "unset".
//! Anything else those clients stored alongside (`theme`, `userId`,
//! `createdAt`, ...) is application state and is dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::profile::{ContactProfile, PhoneKind, PhoneNumber, Photo};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCard {
  #[serde(default)]
  pub id:         Option<String>,
  #[serde(default)]
  pub name:       Option<String>,
  #[serde(default)]
  pub title:      Option<String>,
  #[serde(default)]
  pub company:    Option<String>,
  #[serde(default)]
  pub department: Option<String>,
  #[serde(default)]
  pub email:      Option<String>,
  #[serde(default)]
  pub phone:      Option<String>,
  #[serde(default)]
  pub mobile:     Option<String>,
  #[serde(default)]
  pub work_phone: Option<String>,
  #[serde(default)]
  pub fax:        Option<String>,
  #[serde(default)]
  pub website:    Option<String>,
  #[serde(default)]
  pub address:    Option<String>,
  #[serde(default)]
  pub bio:        Option<String>,
  /// Image URL or `data:` URI.
  #[serde(default)]
  pub avatar:     Option<String>,
  /// Every other key. Only [`KNOWN_PLATFORMS`] with string values become
  /// social profiles.
  #[serde(flatten)]
  pub platforms:  BTreeMap<String, serde_json::Value>,
}

/// Keys treated as social platform handles, matched case-insensitively.
pub const KNOWN_PLATFORMS: &[&str] = &[
  "linkedin", "twitter", "x", "instagram", "facebook", "github", "gitlab",
  "whatsapp", "telegram", "signal", "wechat", "line", "skype", "discord",
  "slack", "youtube", "tiktok", "snapchat", "pinterest", "reddit", "medium",
  "behance", "dribbble", "mastodon", "threads", "bluesky",
];

fn is_known_platform(key: &str) -> bool {
  KNOWN_PLATFORMS.iter().any(|p| p.eq_ignore_ascii_case(key))
}

/// `Some(s)` only for non-empty strings.
fn truthy(value: Option<String>) -> Option<String> {
  value.filter(|s| !s.is_empty())
}

impl From<LegacyCard> for ContactProfile {
  fn from(card: LegacyCard) -> Self {
    let mut profile = ContactProfile::new(card.name.unwrap_or_default());
    if let Some(id) = truthy(card.id) {
      profile.id = id;
    }

    profile.job_title = truthy(card.title);
    profile.organization_name = truthy(card.company);
    profile.department = truthy(card.department);
    profile.email = truthy(card.email);
    profile.website = truthy(card.website);
    profile.address = truthy(card.address);
    profile.bio = truthy(card.bio);

    let phones = [
      (PhoneKind::Cell, card.phone),
      (PhoneKind::Cell, card.mobile),
      (PhoneKind::Work, card.work_phone),
      (PhoneKind::Fax, card.fax),
    ];
    profile.phone_numbers = phones
      .into_iter()
      .filter_map(|(kind, value)| {
        truthy(value).map(|value| PhoneNumber { kind, value })
      })
      .collect();

    profile.photo = truthy(card.avatar).map(|avatar| {
      if avatar.starts_with("data:") {
        Photo::base64(avatar)
      } else {
        Photo::uri(avatar)
      }
    });

    // BTreeMap iteration is sorted by platform name.
    for (platform, value) in card.platforms {
      if let serde_json::Value::String(handle) = value
        && !handle.is_empty()
        && is_known_platform(&platform)
      {
        profile = profile.with_social(platform, handle);
      }
    }

    profile
  }
}
