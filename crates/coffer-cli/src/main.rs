mod cli;
mod config;
mod storage;

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use clap::Parser;
use coffer_core::{BlobStore, IndexStore};
use coffer_vault::Vault;
use color_eyre::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI surface to the vault core.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command {
        cli::Command::Put { name, file } => run_put(&name, &file, &config).await?,
        cli::Command::Get { name, output } => run_get(&name, output, &config).await?,
        cli::Command::Rm { name } => run_rm(&name, &config).await?,
        cli::Command::Ls => run_ls(&config).await?,
        cli::Command::Health => run_health().await?,
        cli::Command::Config(cli::ConfigCommand::Init) => init_config(&config)?,
        cli::Command::Version => print_version(),
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("coffer {}", env!("CARGO_PKG_VERSION"));
}

async fn run_put(name: &str, file: &Path, config: &config::Config) -> Result<()> {
    let payload = fs::read(file)?;
    let vault = storage::open_vault(config).await?;
    vault.put(name, &payload).await?;
    println!("Stored {name} ({} bytes)", payload.len());
    Ok(())
}

async fn run_get(name: &str, output: Option<PathBuf>, config: &config::Config) -> Result<()> {
    let vault = storage::open_vault(config).await?;
    let payload = vault.get(name).await?;
    match output {
        Some(path) => {
            fs::write(&path, &payload)?;
            println!("Wrote {} bytes to {}", payload.len(), path.display());
        }
        None => std::io::stdout().write_all(&payload)?,
    }
    Ok(())
}

async fn run_rm(name: &str, config: &config::Config) -> Result<()> {
    let vault = storage::open_vault(config).await?;
    vault.delete(name).await?;
    println!("Deleted {name}");
    Ok(())
}

async fn run_ls(config: &config::Config) -> Result<()> {
    let vault = storage::open_vault(config).await?;
    let mut names = vault.list().await;
    names.sort();
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Round-trips a probe payload through an ephemeral vault.
async fn run_health() -> Result<()> {
    let vault = Vault::ephemeral();
    probe_vault(&vault).await?;
    println!("Vault: ok");
    Ok(())
}

async fn probe_vault<B: BlobStore, I: IndexStore>(vault: &Vault<B, I>) -> Result<()> {
    let probe_name = "health/probe";
    let payload = b"ok";
    vault.put(probe_name, payload).await?;
    let round_trip = vault.get(probe_name).await?;
    vault.delete(probe_name).await?;

    if round_trip != payload {
        color_eyre::eyre::bail!("vault round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
