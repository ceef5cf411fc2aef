//! seekcrypt: seal, open, and random-access read chunked AES-GCM files
//!
//! Commands:
//!   keygen <out>                        - write a fresh base64 key file
//!   salt                                - print a fresh salt for crypto.kdf_salt
//!   seal <plain> <sealed>               - encrypt a file chunk by chunk
//!   open <sealed> <plain>               - decrypt a whole file
//!   cat <sealed> [--offset N] [--length N] - decrypt a byte range to stdout
//!   info <sealed>                       - show physical/logical sizes
//!   hash <sealed>                       - BLAKE3 of the plaintext
//!   config show                         - display the active configuration

mod key_source;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use seekcrypt_core::SeekcryptConfig;
use seekcrypt_crypto::{
    generate_key, generate_salt, ChunkCodec, CipherKey, OffsetTranslator, PLAIN_CHUNK_SIZE,
};
use seekcrypt_storage::FileStore;
use seekcrypt_stream::{EncryptedStream, StreamInfo};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "seekcrypt",
    version,
    about = "Seekable chunked AES-256-GCM file encryption",
    long_about = "seekcrypt: seal files into independently authenticated 64 KiB chunks \
                  and read any byte range back without decrypting the whole file"
)]
struct Cli {
    /// Path to seekcrypt.toml configuration file
    #[arg(long, short = 'c', env = "SEEKCRYPT_CONFIG", default_value = "seekcrypt.toml")]
    config: PathBuf,

    /// Base64 key file (overrides crypto.key_file)
    #[arg(long, short = 'k', env = "SEEKCRYPT_KEY_FILE", global = true)]
    key_file: Option<PathBuf>,

    /// Passphrase for key derivation (prompted when needed and not set)
    #[arg(long, env = "SEEKCRYPT_PASSPHRASE", hide_env_values = true, global = true)]
    passphrase: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides log.level
    #[arg(long, env = "SEEKCRYPT_LOG", global = true)]
    log: Option<String>,

    /// Log format; overrides log.format
    #[arg(long, env = "SEEKCRYPT_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a random 256-bit key and write it base64-encoded
    Keygen {
        /// Destination key file
        out: PathBuf,
        /// Replace an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Print a random salt for passphrase-derived keys (crypto.kdf_salt)
    Salt,

    /// Encrypt a plaintext file into the sealed chunk format
    Seal {
        input: PathBuf,
        output: PathBuf,
    },

    /// Decrypt a sealed file completely
    Open {
        input: PathBuf,
        output: PathBuf,
    },

    /// Decrypt a byte range of a sealed file to stdout
    Cat {
        input: PathBuf,
        /// Logical (plaintext) offset to start at; clamps to end-of-file
        #[arg(long, short = 'o', default_value_t = 0)]
        offset: u64,
        /// Number of bytes to emit (default: through end-of-file)
        #[arg(long, short = 'n')]
        length: Option<u64>,
    },

    /// Show physical size, logical size, and chunk layout
    Info { input: PathBuf },

    /// BLAKE3 hash of the plaintext, computed through the stream
    Hash { input: PathBuf },

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

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SeekcryptConfig::load(&cli.config)?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format.clone() {
        Some(format) => format,
        None => LogFormat::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("log.format: {e}"))?,
    };
    init_logging(&level, &format);
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "seekcrypt starting"
    );

    let passphrase = cli.passphrase.clone().map(SecretString::from);
    let key = || {
        key_source::resolve_key(&config.crypto, cli.key_file.as_deref(), passphrase.as_ref())
    };
    let batch = config.stream.io_chunks.max(1) * PLAIN_CHUNK_SIZE;

    match &cli.command {
        Commands::Keygen { out, force } => cmd_keygen(out, *force),
        Commands::Salt => {
            println!("{}", key_source::encode_salt(&generate_salt()));
            Ok(())
        }
        Commands::Seal { input, output } => cmd_seal(&key()?, input, output, batch),
        Commands::Open { input, output } => cmd_open(&key()?, input, output, batch),
        Commands::Cat {
            input,
            offset,
            length,
        } => {
            let stdout = std::io::stdout();
            cmd_cat(&key()?, input, *offset, *length, batch, &mut stdout.lock())
        }
        Commands::Info { input } => cmd_info(input),
        Commands::Hash { input } => {
            let hash = cmd_hash(&key()?, input)?;
            println!("{}  {}", hash.to_hex(), input.display());
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries plaintext for `cat`, so logs always go to stderr
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

fn make_progress_bar(total: u64, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{prefix:.bold} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
        )
        .unwrap()
        .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

// ── `seekcrypt keygen` ────────────────────────────────────────────────────────

fn cmd_keygen(out: &Path, force: bool) -> Result<()> {
    key_source::write_key_file(out, &generate_key(), force)?;
    info!(path = %out.display(), "wrote key file");
    println!("wrote 256-bit key to {}", out.display());
    Ok(())
}

// ── `seekcrypt seal` ──────────────────────────────────────────────────────────

fn cmd_seal(key: &CipherKey, input: &Path, output: &Path, batch: usize) -> Result<()> {
    let mut source = std::fs::File::open(input)
        .with_context(|| format!("opening input: {}", input.display()))?;
    let total = source.metadata()?.len();

    let store = FileStore::create(output)
        .with_context(|| format!("creating output: {}", output.display()))?;
    let mut stream = EncryptedStream::open(store, ChunkCodec::new(key))?;

    let pb = make_progress_bar(total, "seal");
    let mut buf = Vec::with_capacity(batch);
    loop {
        buf.clear();
        (&mut source)
            .take(batch as u64)
            .read_to_end(&mut buf)
            .with_context(|| format!("reading input: {}", input.display()))?;
        if buf.is_empty() {
            break;
        }
        stream.write(&buf)?;
        pb.inc(buf.len() as u64);
    }

    let sealed = stream.info();
    stream.close()?;
    pb.finish_and_clear();

    info!(
        input = %input.display(),
        output = %output.display(),
        logical_size = sealed.logical_size,
        physical_size = sealed.physical_size,
        "sealed"
    );
    Ok(())
}

// ── `seekcrypt open` ──────────────────────────────────────────────────────────

/// Decrypts into `<output>.partial` and renames on success, so a corrupted
/// input never leaves a truncated plaintext behind under the final name.
fn cmd_open(key: &CipherKey, input: &Path, output: &Path, batch: usize) -> Result<()> {
    let store =
        FileStore::open(input).with_context(|| format!("opening input: {}", input.display()))?;
    let mut stream = EncryptedStream::open(store, ChunkCodec::new(key))?;
    let total = stream.size()?;

    let partial = partial_path(output);
    let result = (|| -> Result<()> {
        let file = std::fs::File::create(&partial)
            .with_context(|| format!("creating output: {}", partial.display()))?;
        let mut sink = std::io::BufWriter::new(file);
        let pb = make_progress_bar(total, "open");

        while !stream.at_end() {
            let plain = stream
                .read(batch)
                .with_context(|| format!("decrypting {} at offset {}", input.display(), stream.position()))?;
            if plain.is_empty() {
                break;
            }
            sink.write_all(&plain)?;
            pb.inc(plain.len() as u64);
        }
        sink.flush()?;
        pb.finish_and_clear();
        Ok(())
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }
    std::fs::rename(&partial, output)
        .with_context(|| format!("renaming {} to {}", partial.display(), output.display()))?;
    stream.close()?;

    info!(input = %input.display(), output = %output.display(), bytes = total, "opened");
    Ok(())
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

// ── `seekcrypt cat` ───────────────────────────────────────────────────────────

fn cmd_cat<W: Write>(
    key: &CipherKey,
    input: &Path,
    offset: u64,
    length: Option<u64>,
    batch: usize,
    out: &mut W,
) -> Result<()> {
    let store =
        FileStore::open(input).with_context(|| format!("opening input: {}", input.display()))?;
    let mut stream = EncryptedStream::open(store, ChunkCodec::new(key))?;

    let start = stream.seek(offset);
    let mut remaining = length.unwrap_or(u64::MAX).min(stream.bytes_available());
    debug!(offset = start, length = remaining, "cat range");

    while remaining > 0 {
        let want = remaining.min(batch as u64) as usize;
        let plain = stream.read(want)?;
        if plain.is_empty() {
            break;
        }
        out.write_all(&plain)?;
        remaining -= plain.len() as u64;
    }
    out.flush()?;
    Ok(())
}

// ── `seekcrypt info` ──────────────────────────────────────────────────────────

fn cmd_info(input: &Path) -> Result<()> {
    // Sizes come from the physical length alone; no key needed
    let mut store =
        FileStore::open(input).with_context(|| format!("opening input: {}", input.display()))?;
    let physical = seekcrypt_storage::RawByteStore::size(&mut store)?;
    let t = OffsetTranslator::for_physical_size(physical);
    let info = StreamInfo {
        physical_size: physical,
        logical_size: t.logical_size(),
        chunk_count: OffsetTranslator::chunk_count(physical),
        chunk_capacity: OffsetTranslator::chunk_capacity(physical),
    };

    println!("file:           {}", input.display());
    println!("{info}");
    Ok(())
}

// ── `seekcrypt hash` ──────────────────────────────────────────────────────────

fn cmd_hash(key: &CipherKey, input: &Path) -> Result<blake3::Hash> {
    let store =
        FileStore::open(input).with_context(|| format!("opening input: {}", input.display()))?;
    let mut stream = EncryptedStream::open(store, ChunkCodec::new(key))?;

    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut stream, &mut hasher)
        .with_context(|| format!("hashing plaintext of {}", input.display()))?;
    Ok(hasher.finalize())
}

// ── `seekcrypt config show` ───────────────────────────────────────────────────

fn cmd_config_show(config: &SeekcryptConfig, config_path: &Path) -> Result<()> {
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
