//! Layered CLI configuration: optional TOML file, then `BIZCARD_*`
//! environment variables. Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bizcard_vcard::{EncodeOptions, Escaping, LineEnding};
use serde::Deserialize;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "bizcard.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
  /// Directory that encoded `.vcf` files are written to.
  pub output_dir:  PathBuf,
  pub line_ending: LineEnding,
  pub escaping:    Escaping,
  pub fold:        bool,
}

impl CliConfig {
  /// Load from `path` (required when given) or from the default file
  /// (optional), then overlay the environment.
  pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
    let (file, required) = match path {
      Some(p) => (p.to_path_buf(), true),
      None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(required))
      .add_source(config::Environment::with_prefix("BIZCARD"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }

  pub fn encode_options(&self) -> EncodeOptions {
    EncodeOptions {
      line_ending: self.line_ending,
      escaping:    self.escaping,
      fold:        self.fold,
    }
  }
}
