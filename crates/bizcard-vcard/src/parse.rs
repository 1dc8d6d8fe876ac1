//! vCard 3.0 / 4.0 content-line parser.
//!
//! Pipeline:
//!   raw &str
//!     └─ unfold_lines()          → Vec<String>
//!          └─ parse_content_line() → ContentLine
//!               └─ apply to ContactProfile → validate

use bizcard_core::{ContactProfile, PhoneKind, Photo};

use crate::error::{Error, Result};

// ─── Content-line representation ─────────────────────────────────────────────

struct ContentLine {
  name:   String,
  params: Vec<Param>,
  value:  String,
}

struct Param {
  name:  String,
  value: String,
}

impl ContentLine {
  fn param(&self, name: &str) -> Option<&str> {
    self
      .params
      .iter()
      .find(|p| p.name == name)
      .map(|p| p.value.as_str())
  }
}

// ─── Low-level helpers ───────────────────────────────────────────────────────

/// Join CRLF+SP (or LF+SP / LF+HT) continuation lines.
/// Tolerates bare LF line endings.
pub(crate) fn unfold_lines(s: &str) -> Vec<String> {
  let mut lines: Vec<String> = Vec::new();
  for raw in s.split('\n') {
    let line = raw.strip_suffix('\r').unwrap_or(raw);
    if let Some(rest) = line.strip_prefix([' ', '\t']) {
      if let Some(last) = lines.last_mut() {
        last.push_str(rest);
      }
    } else {
      lines.push(line.to_string());
    }
  }
  lines.retain(|l| !l.is_empty());
  lines
}

/// Find the first `:` that is not inside a double-quoted string.
fn find_unquoted_colon(s: &str) -> Option<usize> {
  let mut in_quotes = false;
  for (i, c) in s.char_indices() {
    match c {
      '"' => in_quotes = !in_quotes,
      ':' if !in_quotes => return Some(i),
      _ => {}
    }
  }
  None
}

/// Split on `;` while respecting double-quoted strings.
fn split_semicolons_respecting_quotes(s: &str) -> Vec<&str> {
  let mut result = Vec::new();
  let mut start = 0usize;
  let mut in_quotes = false;
  for (i, c) in s.char_indices() {
    match c {
      '"' => in_quotes = !in_quotes,
      ';' if !in_quotes => {
        result.push(&s[start..i]);
        start = i + 1;
      }
      _ => {}
    }
  }
  result.push(&s[start..]);
  result
}

/// Split a structured value on unescaped `;`.
fn split_components(s: &str) -> Vec<String> {
  let mut parts = Vec::new();
  let mut current = String::new();
  let mut chars = s.chars();
  while let Some(c) = chars.next() {
    match c {
      '\\' => {
        current.push(c);
        if let Some(next) = chars.next() {
          current.push(next);
        }
      }
      ';' => parts.push(std::mem::take(&mut current)),
      _ => current.push(c),
    }
  }
  parts.push(current);
  parts
}

/// Collect all TYPE= values, handling `TYPE=A,B` and repeated `TYPE=` params.
fn type_values(params: &[Param]) -> Vec<String> {
  params
    .iter()
    .filter(|p| p.name == "TYPE")
    .flat_map(|p| p.value.split(','))
    .map(|t| t.trim().to_uppercase())
    .filter(|t| !t.is_empty())
    .collect()
}

/// FAX wins over CELL, which wins over WORK; anything else is a cell number.
fn phone_kind_from_types(types: &[String]) -> PhoneKind {
  let kinds: Vec<PhoneKind> = types
    .iter()
    .filter_map(|t| match t.as_str() {
      "MOBILE" => Some(PhoneKind::Cell),
      other => other.parse().ok(),
    })
    .collect();
  [PhoneKind::Fax, PhoneKind::Cell, PhoneKind::Work]
    .into_iter()
    .find(|k| kinds.contains(k))
    .unwrap_or(PhoneKind::Cell)
}

fn unescape_value(s: &str) -> String {
  let mut result = String::with_capacity(s.len());
  let mut chars = s.chars();
  while let Some(c) = chars.next() {
    if c == '\\' {
      match chars.next() {
        Some('n') | Some('N') => result.push('\n'),
        Some('\\') => result.push('\\'),
        Some(',') => result.push(','),
        Some(';') => result.push(';'),
        Some(other) => {
          result.push('\\');
          result.push(other);
        }
        None => result.push('\\'),
      }
    } else {
      result.push(c);
    }
  }
  result
}

/// Return `Some(unescaped)` when non-empty after trimming, `None` otherwise.
fn opt_text(s: &str) -> Option<String> {
  let s = s.trim();
  if s.is_empty() {
    None
  } else {
    Some(unescape_value(s))
  }
}

// ─── Content-line parser ─────────────────────────────────────────────────────

fn parse_content_line(line: &str) -> Option<ContentLine> {
  let colon_pos = find_unquoted_colon(line)?;

  let name_part = &line[..colon_pos];
  let value = line[colon_pos + 1..].to_string();

  let tokens = split_semicolons_respecting_quotes(name_part);
  let name_raw = tokens.first()?.trim();
  if name_raw.is_empty() {
    return None;
  }

  // Strip group prefix (e.g. "item1.TEL" → "TEL")
  let name = match name_raw.rfind('.') {
    Some(dot) => name_raw[dot + 1..].to_uppercase(),
    None => name_raw.to_uppercase(),
  };

  let mut params = Vec::new();
  for token in &tokens[1..] {
    if let Some((param_name, param_val)) = token.split_once('=') {
      params.push(Param {
        name:  param_name.trim().to_uppercase(),
        value: param_val.trim().trim_matches('"').to_string(),
      });
    } else {
      // Bare token, treated as TYPE=value (vCard 3.0 compat)
      let t = token.trim();
      if !t.is_empty() {
        params.push(Param {
          name:  "TYPE".to_string(),
          value: t.to_uppercase(),
        });
      }
    }
  }

  Some(ContentLine {
    name,
    params,
    value,
  })
}

// ─── Core parser ─────────────────────────────────────────────────────────────

fn photo_from_line(cl: &ContentLine) -> Option<Photo> {
  let value = cl.value.trim();
  if value.is_empty() {
    return None;
  }
  let inline = cl.param("ENCODING").is_some_and(|e| {
    e.eq_ignore_ascii_case("b") || e.eq_ignore_ascii_case("BASE64")
  });
  if inline {
    return Some(Photo::base64(value));
  }
  // vCard 4.0 inlines photos as data URIs with no ENCODING param.
  if value.starts_with("data:") {
    Some(Photo::base64(value))
  } else {
    Some(Photo::uri(value))
  }
}

/// Parse a single vCard from `input` into a validated profile with a fresh id.
pub(crate) fn parse_one(input: &str) -> Result<ContactProfile> {
  let lines = unfold_lines(input);

  let start = lines
    .iter()
    .position(|l| l.eq_ignore_ascii_case("BEGIN:VCARD"))
    .ok_or(Error::MissingEnvelope)?;
  let end = lines
    .iter()
    .rposition(|l| l.eq_ignore_ascii_case("END:VCARD"))
    .ok_or(Error::MissingEnvelope)?;
  if end <= start {
    return Err(Error::MissingEnvelope);
  }

  let mut profile = ContactProfile::new("");
  let mut structured_name: Option<(String, String)> = None;

  // Malformed lines are skipped.
  for cl in lines[start + 1..end]
    .iter()
    .filter_map(|l| parse_content_line(l))
  {
    let types = type_values(&cl.params);

    match cl.name.as_str() {
      "FN" => {
        if let Some(full) = opt_text(&cl.value) {
          profile.display_name = full;
        }
      }
      "N" => {
        let parts = split_components(&cl.value);
        let family = parts.first().and_then(|s| opt_text(s)).unwrap_or_default();
        let given = parts.get(1).and_then(|s| opt_text(s)).unwrap_or_default();
        structured_name = Some((given, family));
      }
      "PHOTO" if profile.photo.is_none() => {
        profile.photo = photo_from_line(&cl);
      }
      "ORG" => {
        let parts = split_components(&cl.value);
        profile.organization_name = parts.first().and_then(|s| opt_text(s));
        profile.department = parts.get(1).and_then(|s| opt_text(s));
      }
      "TITLE" => profile.job_title = opt_text(&cl.value),
      "EMAIL" if profile.email.is_none() => {
        profile.email = opt_text(&cl.value);
      }
      "TEL" => {
        if let Some(number) = opt_text(&cl.value) {
          profile = profile.with_phone(phone_kind_from_types(&types), number);
        }
      }
      "URL" if profile.website.is_none() => {
        profile.website = opt_text(&cl.value);
      }
      "ADR" if profile.address.is_none() => {
        // pobox;ext;street;locality;region;code;country
        let components = split_components(&cl.value);
        let street = components.get(2).and_then(|s| opt_text(s));
        let parts: Vec<String> =
          components.iter().filter_map(|s| opt_text(s)).collect();
        profile.address = match street {
          Some(street) if parts.len() == 1 => Some(street),
          _ if parts.is_empty() => None,
          _ => Some(parts.join(", ")),
        };
      }
      "X-SOCIALPROFILE" => {
        if let Some(handle) = opt_text(&cl.value) {
          let platform = cl.param("TYPE").unwrap_or_default().to_string();
          profile = profile.with_social(platform, handle);
        }
      }
      "NOTE" => profile.bio = opt_text(&cl.value),
      _ => {}
    }
  }

  if profile.display_name.is_empty()
    && let Some((given, family)) = structured_name
  {
    profile.display_name = [given, family]
      .into_iter()
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join(" ");
  }

  profile.validate()?;
  Ok(profile)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
