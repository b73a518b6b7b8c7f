//! Clap derive structures for the `printfleet` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// printfleet -- one address for a whole fleet of Moonraker printers
#[derive(Debug, Parser)]
#[command(
    name = "printfleet",
    version,
    about = "Serve a fleet of Moonraker 3D printers behind one address",
    long_about = "Polls every configured printer for live status and proxies each \
        printer's control API, web UIs and camera streams under /printers/<id>/.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (default: platform config dir)
    #[arg(long, short = 'c', env = "PRINTFLEET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the gateway
    Serve(ServeArgs),

    /// Validate the configuration and exit
    Check,

    /// Print the configuration file path
    ConfigPath,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Local listener port (overrides `listen_port`)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Do not open the remote listener even if enabled in config
    #[arg(long)]
    pub no_remote: bool,
}
