//! bankfs shell binary.
//!
//! Builds an in-memory filesystem over a banked chunk pool, seeds one file,
//! then reads shell commands from stdin or a script.
//!
//! Usage:
//!   # Interactive, default 2 GiB pool
//!   cargo run -p bankfs-cli
//!
//!   # Small pool, scripted
//!   cargo run -p bankfs-cli -- --total-size 1048576 --bank-size 65536 --script demo.txt
//!
//!   # Mirror debug logs to a file
//!   RUST_LOG=bankfs_kernel=debug cargo run -p bankfs-cli -- --log-file /tmp/bankfs.log

mod shell;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bankfs_kernel::{BankFs, StorageConfig, VfsOps};
use clap::Parser;
use tokio::io::BufReader;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// In-memory filesystem shell.
#[derive(Parser, Debug)]
#[command(name = "bankfs")]
#[command(about = "Shell over an in-memory filesystem backed by banked storage chunks")]
struct Args {
    /// TOML file with `total_size`, `bank_size` and `chunk_size`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total pool size in bytes (overrides the config file)
    #[arg(long)]
    total_size: Option<u64>,

    /// Bank size in bytes (overrides the config file)
    #[arg(long)]
    bank_size: Option<usize>,

    /// Chunk size in bytes (overrides the config file)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Name of the file created at startup
    #[arg(long, default_value = "hello")]
    name: String,

    /// Contents of the file created at startup
    #[arg(long, default_value = "Hello World!\n")]
    contents: String,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,
}

impl Args {
    fn storage_config(&self) -> Result<StorageConfig> {
        let mut config = match &self.config {
            Some(path) => StorageConfig::load(path)?,
            None => StorageConfig::default(),
        };
        if let Some(total) = self.total_size {
            config = config.with_total_size(total);
        }
        if let Some(bank) = self.bank_size {
            config = config.with_bank_size(bank);
        }
        if let Some(chunk) = self.chunk_size {
            config = config.with_chunk_size(chunk);
        }
        Ok(config)
    }
}

/// Stderr logging, plus a non-blocking file layer when `--log-file` is given.
/// The returned guard flushes the file on drop.
fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    let Some(path) = log_file else {
        registry.init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), PathBuf::from);
    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file {} has no file name", path.display()))?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    registry
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_file.as_ref())?;

    let config = args.storage_config()?;
    let fs = BankFs::from_config(&config).context("invalid storage geometry")?;
    tracing::info!(
        total_size = config.total_size,
        bank_size = config.bank_size,
        chunk_size = config.chunk_size,
        "storage pool ready"
    );

    let seed = format!("/{}", args.name);
    fs.write_all(&seed, args.contents.as_bytes())
        .await
        .with_context(|| format!("seeding {seed}"))?;
    tracing::debug!(path = %seed, bytes = args.contents.len(), "seeded");

    let mut stdout = std::io::stdout();
    match &args.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening script {}", path.display()))?;
            shell::run(&fs, BufReader::new(file), &mut stdout, false).await?;
        }
        None => {
            let prompt = std::io::stdin().is_terminal();
            shell::run(&fs, BufReader::new(tokio::io::stdin()), &mut stdout, prompt).await?;
        }
    }

    tracing::info!("bankfs shutting down");
    Ok(())
}
