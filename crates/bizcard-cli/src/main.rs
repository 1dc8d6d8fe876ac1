//! `bizcard` — turn stored contact profiles into shareable vCard files.
//!
//! # Usage
//!
//! ```text
//! bizcard encode profile.json              # writes Ada_Lovelace.vcf
//! bizcard encode profile.json --stdout     # QR payload on stdout
//! bizcard check profile.json
//! bizcard decode contacts.vcf
//! ```

mod settings;

use std::{
  io::{self, Read as _, Write as _},
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use bizcard_core::{ContactProfile, Photo, legacy::LegacyCard};
use bizcard_vcard::{EncodeOptions, Escaping, LineEnding};
use clap::{Args, Parser, Subcommand};
use settings::CliConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "bizcard", version, about = "vCard export for digital business cards")]
struct Cli {
  /// Path to a TOML config file (default: ./bizcard.toml if present).
  #[arg(short, long, global = true, value_name = "FILE", env = "BIZCARD_CONFIG")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Encode a profile as a vCard 3.0 file.
  Encode(EncodeArgs),
  /// Validate a profile and print its card fingerprint.
  Check(ProfileArgs),
  /// Read a .vcf file and print the contained profiles as JSON.
  Decode {
    /// The .vcf file, or `-` for stdin.
    path: PathBuf,
  },
}

#[derive(Args, Debug)]
struct ProfileArgs {
  /// Profile JSON file, or `-` for stdin.
  profile: PathBuf,

  /// Input is a flat card record from older clients.
  #[arg(long)]
  legacy: bool,

  /// Embed a local image as the inline photo, replacing any existing one.
  #[arg(long, value_name = "IMAGE")]
  photo_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EncodeArgs {
  #[command(flatten)]
  input: ProfileArgs,

  /// Output file (default: <output_dir>/<Display_Name>.vcf).
  #[arg(short, long, value_name = "FILE")]
  output: Option<PathBuf>,

  /// Write the card to stdout instead of a file.
  #[arg(long, conflicts_with = "output")]
  stdout: bool,

  /// Use LF line endings.
  #[arg(long)]
  lf: bool,

  /// Escape reserved characters per RFC 2426.
  #[arg(long)]
  escape: bool,

  /// Fold lines longer than 75 octets.
  #[arg(long)]
  fold: bool,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  // Logs go to stderr so `--stdout` output stays a clean payload.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(cli.config.as_deref())?;

  match cli.command {
    Command::Encode(args) => encode(&cfg, args),
    Command::Check(args) => check(&cfg, &args),
    Command::Decode { path } => decode(&path),
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

fn encode(cfg: &CliConfig, args: EncodeArgs) -> Result<()> {
  let profile = load_profile(&args.input)?;
  let opts = resolve_options(cfg, &args);

  let card = render(&profile, &opts)
    .with_context(|| format!("cannot encode profile {}", profile.id))?;
  let fingerprint = bizcard_vcard::fingerprint(&card);
  tracing::info!(id = %profile.id, bytes = card.len(), %fingerprint, "encoded card");

  if args.stdout {
    let mut stdout = io::stdout().lock();
    stdout.write_all(card.as_bytes()).context("writing card to stdout")?;
    stdout.flush().context("flushing stdout")?;
    return Ok(());
  }

  let path = args.output.unwrap_or_else(|| {
    cfg
      .output_dir
      .join(bizcard_vcard::download_filename(&profile))
  });
  std::fs::write(&path, &card)
    .with_context(|| format!("failed to write {}", path.display()))?;
  tracing::info!("wrote {} ({})", path.display(), bizcard_vcard::MEDIA_TYPE);

  Ok(())
}

/// Prints the fingerprint of the card `encode` writes under the same config.
fn check(cfg: &CliConfig, args: &ProfileArgs) -> Result<()> {
  let profile = load_profile(args)?;
  let card = render(&profile, &cfg.encode_options())
    .with_context(|| format!("profile {} is not valid", profile.id))?;

  println!("{}", bizcard_vcard::fingerprint(&card));
  tracing::info!(
    id = %profile.id,
    file = %bizcard_vcard::download_filename(&profile),
    "profile is valid"
  );
  Ok(())
}

fn decode(path: &Path) -> Result<()> {
  let raw = read_input(path)?;

  let mut profiles = Vec::new();
  for (index, result) in bizcard_vcard::decode_many(&raw).into_iter().enumerate() {
    match result {
      Ok(profile) => profiles.push(profile),
      Err(e) => tracing::warn!(index, error = %e, "skipping card"),
    }
  }
  if profiles.is_empty() {
    anyhow::bail!("no valid vCards in {}", path.display());
  }

  let json =
    serde_json::to_string_pretty(&profiles).context("serialising profiles")?;
  println!("{json}");
  Ok(())
}

// ─── Encoding helpers ─────────────────────────────────────────────────────────

/// Config options with the encode flags applied on top.
fn resolve_options(cfg: &CliConfig, args: &EncodeArgs) -> EncodeOptions {
  let mut opts = cfg.encode_options();
  if args.lf {
    opts.line_ending = LineEnding::Lf;
  }
  if args.escape {
    opts.escaping = Escaping::Rfc;
  }
  if args.fold {
    opts.fold = true;
  }
  opts
}

fn render(profile: &ContactProfile, opts: &EncodeOptions) -> Result<String> {
  Ok(bizcard_vcard::encode_with(profile, opts)?)
}

// ─── Input helpers ────────────────────────────────────────────────────────────

fn read_input(path: &Path) -> Result<String> {
  if path == Path::new("-") {
    let mut buf = String::new();
    io::stdin()
      .read_to_string(&mut buf)
      .context("reading stdin")?;
    return Ok(buf);
  }
  std::fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))
}

fn load_profile(args: &ProfileArgs) -> Result<ContactProfile> {
  let raw = read_input(&args.profile)?;

  let mut profile: ContactProfile = if args.legacy {
    serde_json::from_str::<LegacyCard>(&raw)
      .context("parsing legacy card JSON")?
      .into()
  } else {
    serde_json::from_str(&raw).context("parsing profile JSON")?
  };

  if let Some(image) = &args.photo_file {
    profile.photo = Some(photo_from_file(image)?);
  }

  tracing::debug!(id = %profile.id, "loaded profile");
  Ok(profile)
}

/// Read an image file into an inline `data:` URI photo.
fn photo_from_file(path: &Path) -> Result<Photo> {
  let bytes = std::fs::read(path)
    .with_context(|| format!("reading photo {}", path.display()))?;
  let mime = mime_for_extension(path);
  Ok(Photo::base64(format!(
    "data:{mime};base64,{}",
    STANDARD.encode(bytes)
  )))
}

fn mime_for_extension(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
    .unwrap_or_default();
  match ext.as_str() {
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "gif" => "image/gif",
    "webp" => "image/webp",
    _ => "application/octet-stream",
  }
}
