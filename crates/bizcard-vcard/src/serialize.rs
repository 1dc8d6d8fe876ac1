//! vCard 3.0 serializer.
//!
//! Output is deterministic: the same profile and options always yield the
//! same bytes. Property order is fixed; see [`encode_with`].

use std::borrow::Cow;

use bizcard_core::{ContactProfile, Photo, PhotoEncoding};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ─── Options ──────────────────────────────────────────────────────────────────

/// Physical line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
  #[default]
  Crlf,
  Lf,
}

impl LineEnding {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Crlf => "\r\n",
      Self::Lf => "\n",
    }
  }
}

/// How reserved characters in property values are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Escaping {
  /// Values are inserted verbatim. A `;`, `,` or newline inside a value can
  /// corrupt the card for strict importers.
  #[default]
  None,
  /// RFC 2426 §4 escaping of `\`, `,`, `;` and newlines.
  Rfc,
}

impl Escaping {
  /// Escape a full text value: `\`, `,`, `;`, newline.
  fn text(self, s: &str) -> Cow<'_, str> {
    match self {
      Self::None => Cow::Borrowed(s),
      Self::Rfc => Cow::Owned(
        s.replace('\\', "\\\\")
          .replace(',', "\\,")
          .replace(';', "\\;")
          .replace("\r\n", "\\n")
          .replace('\n', "\\n"),
      ),
    }
  }

  /// Escape one component of N or ADR: `\`, `;`, newline.
  /// Commas separate list items within a component and are left alone.
  fn component(self, s: &str) -> Cow<'_, str> {
    match self {
      Self::None => Cow::Borrowed(s),
      Self::Rfc => Cow::Owned(
        s.replace('\\', "\\\\")
          .replace(';', "\\;")
          .replace("\r\n", "\\n")
          .replace('\n', "\\n"),
      ),
    }
  }

  /// Drop `"` (never valid in a parameter value) and quote a value that
  /// contains `:`, `;` or `,`.
  fn param(self, s: &str) -> Cow<'_, str> {
    match self {
      Self::None => Cow::Borrowed(s),
      Self::Rfc => {
        let bare = s.replace('"', "");
        if bare.contains([':', ';', ',']) {
          Cow::Owned(format!("\"{bare}\""))
        } else {
          Cow::Owned(bare)
        }
      }
    }
  }
}

/// Output knobs for [`encode_with`]. The default reproduces the plain card
/// format: CRLF, no escaping, no folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
  pub line_ending: LineEnding,
  pub escaping:    Escaping,
  /// Fold physical lines at 75 octets.
  pub fold:        bool,
}

// ─── Line folding ─────────────────────────────────────────────────────────────

const MAX_LINE_OCTETS: usize = 75;

/// Emit `s` as one logical line, folding at 75 octets with `eol` + SP
/// continuation. Never splits a UTF-8 character.
pub(crate) fn fold_line(s: &str, eol: &str) -> String {
  if s.len() <= MAX_LINE_OCTETS {
    return format!("{s}{eol}");
  }

  let mut result = String::with_capacity(s.len() + s.len() / 25);
  let total = s.len();
  let mut pos = 0usize;
  let mut first = true;

  while pos < total {
    let limit = if first { MAX_LINE_OCTETS } else { MAX_LINE_OCTETS - 1 };
    let end = if pos + limit >= total {
      total
    } else {
      let mut e = pos + limit;
      while e > pos && !s.is_char_boundary(e) {
        e -= 1;
      }
      e
    };

    if !first {
      result.push(' ');
    }
    result.push_str(&s[pos..end]);
    result.push_str(eol);
    pos = end;
    first = false;
  }

  result
}

// ─── Writer ───────────────────────────────────────────────────────────────────

/// Accumulates content lines into a local buffer.
struct CardWriter<'o> {
  out:  String,
  opts: &'o EncodeOptions,
}

impl<'o> CardWriter<'o> {
  fn new(opts: &'o EncodeOptions) -> Self {
    Self {
      out: String::with_capacity(256),
      opts,
    }
  }

  fn line(&mut self, content: &str) {
    let eol = self.opts.line_ending.as_str();
    if self.opts.fold {
      self.out.push_str(&fold_line(content, eol));
    } else {
      self.out.push_str(content);
      self.out.push_str(eol);
    }
  }

  fn finish(self) -> String { self.out }
}

/// `Some(s)` for set, non-empty fields.
fn present(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|s| !s.is_empty())
}

fn photo_line(photo: &Photo) -> String {
  match photo.encoding {
    PhotoEncoding::Uri => format!("PHOTO;VALUE=URI:{}", photo.value),
    PhotoEncoding::Base64 => match photo.media_type() {
      Some(subtype) => format!(
        "PHOTO;ENCODING=b;TYPE={subtype}:{}",
        photo.base64_data_compact()
      ),
      None => format!("PHOTO;ENCODING=b:{}", photo.base64_data_compact()),
    },
  }
}

// ─── Public API ───────────────────────────────────────────────────────────────

/// Serialize `profile` as a vCard 3.0 string with default options.
pub fn encode(profile: &ContactProfile) -> Result<String> {
  encode_with(profile, &EncodeOptions::default())
}

/// Serialize `profile` as a vCard 3.0 string.
///
/// Properties are emitted in this order, each only when it has a value:
/// `N`, `FN`, `PHOTO`, `ORG`, `TITLE`, `EMAIL`, `TEL`..., `URL`, `ADR`,
/// `X-SOCIALPROFILE`..., `NOTE`. The profile is validated first; on failure
/// nothing is produced.
pub fn encode_with(
  profile: &ContactProfile,
  opts: &EncodeOptions,
) -> Result<String> {
  profile.validate()?;

  let esc = opts.escaping;
  let mut w = CardWriter::new(opts);

  w.line("BEGIN:VCARD");
  w.line("VERSION:3.0");

  let (first, last) = profile.name_parts();
  w.line(&format!(
    "N:{};{};;;",
    esc.component(last),
    esc.component(first)
  ));
  w.line(&format!("FN:{}", esc.text(&profile.display_name)));

  if let Some(photo) = &profile.photo {
    w.line(&photo_line(photo));
  }

  let org = present(&profile.organization_name);
  match (org, present(&profile.department)) {
    (None, None) => {}
    (Some(org), None) => w.line(&format!("ORG:{}", esc.text(org))),
    (org, Some(dept)) => w.line(&format!(
      "ORG:{};{}",
      esc.text(org.unwrap_or_default()),
      esc.text(dept)
    )),
  }
  if let Some(title) = present(&profile.job_title) {
    w.line(&format!("TITLE:{}", esc.text(title)));
  }

  if let Some(email) = present(&profile.email) {
    w.line(&format!("EMAIL;TYPE=INTERNET:{email}"));
  }
  for phone in &profile.phone_numbers {
    w.line(&format!("TEL;TYPE={}:{}", phone.kind.as_ref(), phone.value));
  }
  if let Some(url) = present(&profile.website) {
    w.line(&format!("URL:{url}"));
  }
  if let Some(address) = present(&profile.address) {
    w.line(&format!("ADR;TYPE=WORK:;;{};;;;", esc.component(address)));
  }

  for social in &profile.social_profiles {
    let value = esc.text(&social.value);
    if social.platform.is_empty() {
      w.line(&format!("X-SOCIALPROFILE:{value}"));
    } else {
      w.line(&format!(
        "X-SOCIALPROFILE;TYPE={}:{value}",
        esc.param(&social.platform)
      ));
    }
  }

  if let Some(bio) = present(&profile.bio) {
    w.line(&format!("NOTE:{}", esc.text(bio)));
  }

  w.line("END:VCARD");
  Ok(w.finish())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use bizcard_core::{PhoneKind, Photo};
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::Error;

  fn lines(out: &str) -> Vec<&str> {
    out.split("\r\n").filter(|l| !l.is_empty()).collect()
  }

  fn keys(out: &str) -> Vec<String> {
    lines(out)
      .iter()
      .map(|l| {
        let end = l.find([':', ';']).unwrap_or(l.len());
        l[..end].to_string()
      })
      .collect()
  }

  fn ada() -> ContactProfile {
    ContactProfile::new("Ada Lovelace")
      .with_job_title("Engineer")
      .with_organization("Analytical Co")
      .with_email("ada@example.com")
      .with_phone(PhoneKind::Cell, "555-1234")
      .with_social("linkedin", "https://linkedin.com/in/ada")
  }

  // ── Envelope & name ─────────────────────────────────────────────────────────

  #[test]
  fn minimal_card() {
    let out = encode(&ContactProfile::new("Jane")).unwrap();
    assert_eq!(
      out,
      "BEGIN:VCARD\r\nVERSION:3.0\r\nN:;Jane;;;\r\nFN:Jane\r\nEND:VCARD\r\n"
    );
  }

  #[test]
  fn name_decomposition() {
    let n = |name: &str| {
      let out = encode(&ContactProfile::new(name)).unwrap();
      lines(&out)[2].to_string()
    };
    assert_eq!(n("Jane"), "N:;Jane;;;");
    assert_eq!(n("Jane Doe"), "N:Doe;Jane;;;");
    assert_eq!(n("Jane Middle Doe"), "N:Doe;Jane;;;");
  }

  #[test]
  fn fn_is_verbatim() {
    let out = encode(&ContactProfile::new("Jane  Middle Doe")).unwrap();
    assert!(out.contains("\r\nFN:Jane  Middle Doe\r\n"), "got:\n{out}");
  }

  // ── Full scenario ───────────────────────────────────────────────────────────

  #[test]
  fn ada_scenario_line_order() {
    let out = encode(&ada()).unwrap();
    assert_eq!(
      lines(&out),
      vec![
        "BEGIN:VCARD",
        "VERSION:3.0",
        "N:Lovelace;Ada;;;",
        "FN:Ada Lovelace",
        "ORG:Analytical Co",
        "TITLE:Engineer",
        "EMAIL;TYPE=INTERNET:ada@example.com",
        "TEL;TYPE=CELL:555-1234",
        "X-SOCIALPROFILE;TYPE=linkedin:https://linkedin.com/in/ada",
        "END:VCARD",
      ]
    );
  }

  #[test]
  fn every_field_in_fixed_order() {
    // Fields set in reverse order of emission.
    let p = ContactProfile::new("Grace Hopper")
      .with_bio("Compiler pioneer")
      .with_social("github", "grace")
      .with_address("1 Navy Way")
      .with_website("https://grace.example")
      .with_phone(PhoneKind::Fax, "555-0003")
      .with_phone(PhoneKind::Work, "555-0002")
      .with_email("grace@example.com")
      .with_job_title("Rear Admiral")
      .with_department("Research")
      .with_organization("US Navy")
      .with_photo(Photo::uri("https://grace.example/me.jpg"));
    let out = encode(&p).unwrap();
    assert_eq!(
      keys(&out),
      vec![
        "BEGIN",
        "VERSION",
        "N",
        "FN",
        "PHOTO",
        "ORG",
        "TITLE",
        "EMAIL",
        "TEL",
        "TEL",
        "URL",
        "ADR",
        "X-SOCIALPROFILE",
        "NOTE",
        "END",
      ]
    );
    assert!(out.contains("PHOTO;VALUE=URI:https://grace.example/me.jpg\r\n"));
    assert!(out.contains("ORG:US Navy;Research\r\n"));
    assert!(out.contains("TEL;TYPE=FAX:555-0003\r\nTEL;TYPE=WORK:555-0002\r\n"));
    assert!(out.contains("URL:https://grace.example\r\n"));
    assert!(out.contains("ADR;TYPE=WORK:;;1 Navy Way;;;;\r\n"));
    assert!(out.contains("NOTE:Compiler pioneer\r\n"));
  }

  // ── Conditional emission ────────────────────────────────────────────────────

  #[test]
  fn empty_strings_emit_nothing() {
    let p = ContactProfile::new("Ada")
      .with_email("")
      .with_website("")
      .with_address("")
      .with_bio("")
      .with_job_title("")
      .with_organization("")
      .with_department("");
    let out = encode(&p).unwrap();
    assert_eq!(keys(&out), vec!["BEGIN", "VERSION", "N", "FN", "END"]);
  }

  #[test]
  fn department_without_org_keeps_separator() {
    let p = ContactProfile::new("Ada").with_department("R&D");
    let out = encode(&p).unwrap();
    assert!(out.contains("\r\nORG:;R&D\r\n"), "got:\n{out}");
  }

  #[test]
  fn title_alone_does_not_emit_org() {
    let p = ContactProfile::new("Ada").with_job_title("CTO");
    let out = encode(&p).unwrap();
    assert!(!out.contains("ORG:"), "got:\n{out}");
    assert!(out.contains("TITLE:CTO\r\n"));
  }

  #[test]
  fn email_and_phone_appear_exactly_once() {
    let p = ContactProfile::new("A")
      .with_email("a@b.com")
      .with_phone(PhoneKind::Cell, "555-0100");
    let out = encode(&p).unwrap();
    let ls = lines(&out);
    assert_eq!(
      ls.iter().filter(|l| **l == "EMAIL;TYPE=INTERNET:a@b.com").count(),
      1
    );
    assert_eq!(
      ls.iter().filter(|l| **l == "TEL;TYPE=CELL:555-0100").count(),
      1
    );
  }

  #[test]
  fn repeated_platforms_are_not_deduplicated() {
    let p = ContactProfile::new("A")
      .with_social("telegram", "@a")
      .with_social("whatsapp", "+1")
      .with_social("telegram", "@a2");
    let out = encode(&p).unwrap();
    assert!(out.contains(
      "X-SOCIALPROFILE;TYPE=telegram:@a\r\n\
       X-SOCIALPROFILE;TYPE=whatsapp:+1\r\n\
       X-SOCIALPROFILE;TYPE=telegram:@a2\r\n"
    ));
  }

  #[test]
  fn blank_platform_omits_type() {
    let out = encode(&ContactProfile::new("A").with_social("", "x")).unwrap();
    assert!(out.contains("\r\nX-SOCIALPROFILE:x\r\n"), "got:\n{out}");
  }

  // ── Photo ───────────────────────────────────────────────────────────────────

  #[test]
  fn base64_photo_is_inlined_with_type() {
    let png = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
    let p = ContactProfile::new("A")
      .with_photo(Photo::base64(format!("data:image/png;base64,{png}")));
    let out = encode(&p).unwrap();
    assert!(out.contains(&format!("\r\nPHOTO;ENCODING=b;TYPE=PNG:{png}\r\n")));
    assert_eq!(out.matches("PHOTO").count(), 1);
  }

  #[test]
  fn wrapped_base64_photo_stays_on_one_line() {
    let png = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
    let wrapped = format!("{}\n{}\r\n {}", &png[..40], &png[40..76], &png[76..]);
    let p = ContactProfile::new("A").with_photo(Photo::base64(wrapped));
    for escaping in [Escaping::None, Escaping::Rfc] {
      let opts = EncodeOptions {
        escaping,
        ..Default::default()
      };
      let out = encode_with(&p, &opts).unwrap();
      assert!(
        out.contains(&format!("\r\nPHOTO;ENCODING=b;TYPE=PNG:{png}\r\nEND:VCARD\r\n")),
        "got:\n{out}"
      );
    }
  }

  #[test]
  fn base64_photo_of_unknown_type_omits_type() {
    let p = ContactProfile::new("A").with_photo(Photo::base64("AAAA"));
    let out = encode(&p).unwrap();
    assert!(out.contains("\r\nPHOTO;ENCODING=b:AAAA\r\n"), "got:\n{out}");
  }

  // ── Validation gate ─────────────────────────────────────────────────────────

  #[test]
  fn missing_name_fails_without_output() {
    let err = encode(&ContactProfile::new("").with_email("a@b.com")).unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidProfile(bizcard_core::Error::MissingDisplayName)
    ));
  }

  #[test]
  fn empty_list_value_fails() {
    let err =
      encode(&ContactProfile::new("A").with_phone(PhoneKind::Cell, "")).unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidProfile(bizcard_core::Error::EmptyFieldValue { .. })
    ));
  }

  // ── Determinism ─────────────────────────────────────────────────────────────

  #[test]
  fn encoding_is_deterministic_and_pure() {
    let p = ada();
    let before = p.clone();
    assert_eq!(encode(&p).unwrap(), encode(&p).unwrap());
    assert_eq!(p, before);
  }

  #[test]
  fn id_is_not_serialized() {
    let mut p = ContactProfile::new("A");
    p.id = "secret-id-123".to_string();
    assert!(!encode(&p).unwrap().contains("secret-id-123"));
  }

  // ── Options ─────────────────────────────────────────────────────────────────

  #[test]
  fn values_are_verbatim_by_default() {
    let p = ContactProfile::new("A")
      .with_address("1 Main St, Springfield; IL")
      .with_bio("line one\nline two");
    let out = encode(&p).unwrap();
    assert!(out.contains("ADR;TYPE=WORK:;;1 Main St, Springfield; IL;;;;\r\n"));
    assert!(out.contains("NOTE:line one\nline two\r\n"));
  }

  #[test]
  fn rfc_escaping_on_request() {
    let p = ContactProfile::new("A")
      .with_organization("Smith, Jones & Co")
      .with_address("1 Main St, Springfield; IL")
      .with_bio("a\\b\nc")
      .with_social("odd;platform", "x");
    let opts = EncodeOptions {
      escaping: Escaping::Rfc,
      ..Default::default()
    };
    let out = encode_with(&p, &opts).unwrap();
    assert!(out.contains("ORG:Smith\\, Jones & Co\r\n"), "got:\n{out}");
    assert!(out.contains("ADR;TYPE=WORK:;;1 Main St, Springfield\\; IL;;;;\r\n"));
    assert!(out.contains("NOTE:a\\\\b\\nc\r\n"), "got:\n{out}");
    assert!(out.contains("X-SOCIALPROFILE;TYPE=\"odd;platform\":x\r\n"));
  }

  #[test]
  fn double_quotes_are_stripped_from_params() {
    let p = ContactProfile::new("A")
      .with_social("we\"ird", "x")
      .with_social("a\"b,c", "y");
    let opts = EncodeOptions {
      escaping: Escaping::Rfc,
      ..Default::default()
    };
    let out = encode_with(&p, &opts).unwrap();
    assert!(out.contains("\r\nX-SOCIALPROFILE;TYPE=weird:x\r\n"), "got:\n{out}");
    assert!(out.contains("\r\nX-SOCIALPROFILE;TYPE=\"ab,c\":y\r\n"), "got:\n{out}");
  }

  #[test]
  fn lf_line_endings() {
    let opts = EncodeOptions {
      line_ending: LineEnding::Lf,
      ..Default::default()
    };
    let out = encode_with(&ContactProfile::new("Jane"), &opts).unwrap();
    assert_eq!(out, "BEGIN:VCARD\nVERSION:3.0\nN:;Jane;;;\nFN:Jane\nEND:VCARD\n");
  }

  #[test]
  fn long_note_is_folded_when_enabled() {
    let p = ContactProfile::new("A").with_bio("é".repeat(100));
    let opts = EncodeOptions {
      fold: true,
      ..Default::default()
    };
    let out = encode_with(&p, &opts).unwrap();
    for physical_line in out.split("\r\n").filter(|l| !l.is_empty()) {
      assert!(
        physical_line.len() <= 75,
        "physical line too long ({} bytes): {:?}",
        physical_line.len(),
        physical_line
      );
    }
    assert!(out.contains("\r\n é"), "missing continuation in:\n{out}");

    let unfolded = encode(&p).unwrap();
    assert!(unfolded.contains(&format!("NOTE:{}\r\n", "é".repeat(100))));
  }

  #[test]
  fn fold_short_line_unchanged() {
    assert_eq!(fold_line("FN:Jane", "\r\n"), "FN:Jane\r\n");
  }

  #[test]
  fn fold_splits_at_75_octets() {
    let folded = fold_line(&"X".repeat(80), "\n");
    assert_eq!(folded, format!("{}\n {}\n", "X".repeat(75), "X".repeat(5)));
  }
}
