//! Command-line entry point: config path resolution and the `serve`
//! default command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use sa_domain::config::Config;

#[derive(Debug, Parser)]
#[command(name = "sa-gateway", version, about = "Conversational AI orchestration gateway")]
pub struct Cli {
    /// Path to a TOML config file. Defaults to `config.toml` in the
    /// current directory if present, otherwise built-in defaults are used.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP gateway (default if no subcommand is given).
    Serve,
    /// Print the resolved configuration and exit.
    ConfigShow,
    /// Print the gateway version and exit.
    Version,
}

/// Resolve and parse the config file named on the CLI, or `./config.toml`
/// if present, falling back to `Config::default()` otherwise. Returns the
/// path actually used (or `config.toml` if none existed).
pub fn load_config(cli: &Cli) -> anyhow::Result<(Config, PathBuf)> {
    let default_path = PathBuf::from("config.toml");
    let path = cli.config.clone().unwrap_or(default_path);

    if !path.exists() {
        return Ok((Config::default(), path));
    }

    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading config file {}", path.display()))?;
    let config: Config = toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))?;
    Ok((config, path))
}

pub fn show(config: &Config, path: &Path) {
    println!("# resolved from {}", path.display());
    println!("{}", toml::to_string_pretty(config).unwrap_or_default());
}
