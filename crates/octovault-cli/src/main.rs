//! octovault: bundle files into one password-protected artifact, and back
//!
//! Commands:
//!   encrypt <FILES>...   - seal files into `<stem>.octovault`
//!   decrypt <ARTIFACT>   - recover every file from an artifact
//!   hash <ARTIFACT>      - print (or check with --expect) the SHA-256 content hash
//!   config show          - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use octovault_core::config::VaultConfig;
use octovault_core::{Artifact, ContentHash, EncryptionMode, FileEntry};
use octovault_crypto::KdfParams;
use octovault_pipeline::input::{confirm_password, password_strength};
use octovault_pipeline::proof::explorer_link;
use octovault_pipeline::{
    scan_recovered, DirectorySink, ImageNormalizer, PatternScanner, Pipeline, ProgressFn,
    Session,
};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "octovault",
    version,
    about = "Password-protected file bundles",
    long_about = "octovault: bundle files into one password-protected artifact and recover them"
)]
struct Cli {
    /// Path to octovault.toml configuration file
    #[arg(long, short = 'c', env = "OCTOVAULT_CONFIG", default_value = "octovault.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "OCTOVAULT_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides the config file
    #[arg(long, env = "OCTOVAULT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seal one or more files into a single artifact
    Encrypt {
        /// Files to include, in archive order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output directory (overrides config)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Artifact file stem (overrides config)
        #[arg(long)]
        name: Option<String>,
        /// Keep images byte-for-byte instead of downscaling them
        #[arg(long)]
        no_compression: bool,
        /// Packaging mode
        #[arg(long, value_enum, default_value = "standard")]
        mode: Mode,
        /// Record the artifact hash on the proof ledger
        #[arg(long)]
        log_proof: bool,
        /// Password (prompted when omitted)
        #[arg(long, env = "OCTOVAULT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Recover all files from an artifact
    Decrypt {
        /// Artifact file (.octovault)
        artifact: PathBuf,
        /// Output directory (overrides config)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Scan recovered text files for sensitive data
        #[arg(long)]
        scan: bool,
        /// Password (prompted when omitted)
        #[arg(long, env = "OCTOVAULT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Print the content hash of an artifact
    Hash {
        artifact: PathBuf,
        /// Fail unless the hash equals this published hex fingerprint
        #[arg(long)]
        expect: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Standard,
    Steganography,
}

impl From<Mode> for EncryptionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Standard => EncryptionMode::Standard,
            Mode::Steganography => EncryptionMode::Steganography,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format {
        Some(format) => format,
        None if config.log.format.eq_ignore_ascii_case("json") => LogFormat::Json,
        None => LogFormat::Text,
    };
    init_logging(&level, format);

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "octovault starting"
    );

    match cli.command {
        Commands::Encrypt {
            files,
            output,
            name,
            no_compression,
            mode,
            log_proof,
            password,
        } => {
            let opts = EncryptOpts {
                output,
                name,
                no_compression,
                mode,
                log_proof,
            };
            cmd_encrypt(&config, &files, opts, password).await
        }
        Commands::Decrypt {
            artifact,
            output,
            scan,
            password,
        } => cmd_decrypt(&config, &artifact, output.as_deref(), scan, password).await,
        Commands::Hash { artifact, expect } => cmd_hash(&artifact, expect.as_deref()),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

async fn load_config(path: &Path) -> Result<VaultConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
    } else {
        Ok(VaultConfig::default())
    }
}

fn build_pipeline(config: &VaultConfig, out_dir: &Path) -> Pipeline {
    Pipeline::new(Arc::new(DirectorySink::new(out_dir)))
        .with_kdf_params(KdfParams::from(&config.crypto))
        .with_normalizer(ImageNormalizer::from(&config.compression))
        .with_artifact_stem(config.output.artifact_stem.clone())
}

// ── Password input ────────────────────────────────────────────────────────────

/// Use the supplied password, or prompt for one (twice when `confirm` is set).
fn read_password(supplied: Option<String>, confirm: bool) -> Result<SecretString> {
    if let Some(password) = supplied {
        return Ok(SecretString::from(password));
    }

    let password =
        SecretString::from(rpassword::prompt_password("Password: ").context("reading password")?);
    if confirm {
        let again = SecretString::from(
            rpassword::prompt_password("Confirm password: ").context("reading password")?,
        );
        confirm_password(&password, &again)?;
    }
    Ok(password)
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_progress_bar(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn progress_callback(pb: &ProgressBar) -> ProgressFn {
    let pb = pb.clone();
    Box::new(move |done, total, msg| {
        pb.set_length(total);
        pb.set_position(done);
        pb.set_message(msg.to_string());
    })
}

// ── `octovault encrypt` ───────────────────────────────────────────────────────

struct EncryptOpts {
    output: Option<PathBuf>,
    name: Option<String>,
    no_compression: bool,
    mode: Mode,
    log_proof: bool,
}

async fn cmd_encrypt(
    config: &VaultConfig,
    paths: &[PathBuf],
    opts: EncryptOpts,
    password: Option<String>,
) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .with_context(|| format!("not a file: {}", path.display()))?
            .to_string_lossy()
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading: {}", path.display()))?;
        files.push(FileEntry::new(name, bytes));
    }

    let password = read_password(password, true)?;
    let strength = password_strength(password.expose_secret());
    println!("Password strength: {} ({}/5)", strength.label, strength.score);

    let mut settings = config.encryption_settings();
    settings.mode = opts.mode.into();
    if opts.no_compression {
        settings.smart_compression = false;
    }
    if opts.log_proof {
        settings.log_proof = true;
    }

    let out_dir = opts.output.unwrap_or_else(|| config.output.dir.clone());
    let mut pipeline = build_pipeline(config, &out_dir);
    if let Some(stem) = opts.name {
        pipeline = pipeline.with_artifact_stem(stem);
    }

    let session = Session::new();
    let run = session.begin()?;

    let pb = make_progress_bar("encrypt");
    let progress = progress_callback(&pb);
    let outcome = pipeline
        .encrypt(&files, &password, &settings, Some(&progress))
        .await
        .context("encryption failed")?;
    pb.finish_with_message("done".to_string());
    run.succeed();

    info!(hash = %outcome.hash, "encrypt complete");
    println!();
    println!("Encrypted {} file(s):", files.len());
    println!("  artifact: {}", out_dir.join(&outcome.artifact.file_name).display());
    println!("  bytes:    {}", fmt_bytes(outcome.artifact.bytes.len() as u64));
    println!("  hash:     {}", outcome.hash);
    if let Some(proof) = &outcome.proof {
        println!("  proof:    {}", explorer_link(&config.proof.explorer_url, &proof.tx_reference));
    }
    for warning in &outcome.warnings {
        println!("  warning:  proof not logged: {warning}");
    }

    Ok(())
}

// ── `octovault decrypt` ───────────────────────────────────────────────────────

async fn cmd_decrypt(
    config: &VaultConfig,
    artifact_path: &Path,
    output: Option<&Path>,
    scan: bool,
    password: Option<String>,
) -> Result<()> {
    let bytes = tokio::fs::read(artifact_path)
        .await
        .with_context(|| format!("reading: {}", artifact_path.display()))?;
    let artifact = Artifact {
        file_name: artifact_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        bytes,
    };

    let password = read_password(password, false)?;
    let out_dir = output.map(Path::to_path_buf).unwrap_or_else(|| config.output.dir.clone());
    let pipeline = build_pipeline(config, &out_dir);

    let session = Session::new();
    let run = session.begin()?;

    let pb = make_progress_bar("decrypt");
    let progress = progress_callback(&pb);
    let recovered = match pipeline.decrypt(&artifact, &password, Some(&progress)).await {
        Ok(files) => files,
        Err(e) if e.is_wrong_password() => {
            pb.abandon_with_message("failed".to_string());
            anyhow::bail!("Invalid password or corrupted file ({e})");
        }
        Err(e) => {
            pb.abandon_with_message("failed".to_string());
            return Err(e).with_context(|| format!("decrypting {}", artifact_path.display()));
        }
    };
    pb.finish_with_message("done".to_string());
    run.succeed();

    println!();
    println!("Recovered {} file(s) into {}:", recovered.len(), out_dir.display());
    for file in &recovered {
        println!("  {:<32} {:>10}  {}", file.name, fmt_bytes(file.bytes.len() as u64), file.media_kind);
    }

    if scan || config.scan.enabled {
        let scanner = PatternScanner::new().context("building pattern scanner")?;
        let reports = scan_recovered(&recovered, &scanner, config.scan.max_chars).await;

        println!();
        if reports.is_empty() {
            println!("Scan: no text files to scan");
        }
        for report in reports {
            let note = if report.truncated { " (first part only)" } else { "" };
            match report.result {
                Ok(items) if items.is_empty() => println!("Scan {}{note}: clean", report.name),
                Ok(items) => {
                    println!("Scan {}{note}: {} finding(s)", report.name, items.len());
                    for item in items {
                        println!("  {:<24} {}", item.kind, item.value);
                    }
                }
                Err(e) => println!("Scan {}{note}: failed: {e}", report.name),
            }
        }
    }

    Ok(())
}

// ── `octovault hash` ──────────────────────────────────────────────────────────

fn cmd_hash(artifact: &Path, expect: Option<&str>) -> Result<()> {
    let hash = octovault_crypto::hash_file(artifact)
        .with_context(|| format!("hashing: {}", artifact.display()))?;
    println!("{hash}  {}", artifact.display());

    if let Some(expected) = expect {
        check_hash(&hash, expected)?;
        println!("hash matches");
    }
    Ok(())
}

fn check_hash(actual: &ContentHash, expected: &str) -> Result<()> {
    let expected = ContentHash::from_hex(expected.trim())?;
    if *actual != expected {
        anyhow::bail!("hash mismatch: expected {expected}, got {actual}");
    }
    Ok(())
}

// ── `octovault config show` ───────────────────────────────────────────────────

fn cmd_config_show(config: &VaultConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
