mod cli;
mod error;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use printfleet_config::{Config, ConfigError, TomlConfigStore, config_path, load_config, load_or_init};
use printfleet_core::Gateway;
use printfleet_server::{AppState, build_router, serve};

use crate::cli::{Cli, Command, ServeArgs};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = match init_tracing(cli.global.verbose, cli.global.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => exit_with(err),
    };

    if let Err(err) = run(cli).await {
        exit_with(err);
    }
}

fn exit_with(err: CliError) -> ! {
    let code = err.exit_code();
    eprintln!("{:?}", miette::Report::new(err));
    std::process::exit(code);
}

fn init_tracing(verbosity: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>, CliError> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| CliError::LogFile {
                    path: path.display().to_string(),
                    source,
                })?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();
    Ok(guard)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let path = cli.global.config.clone().unwrap_or_else(config_path);
    match cli.command {
        Command::Serve(args) => run_gateway(&path, &args).await,
        Command::Check => {
            let config = load_config(&path).map_err(|e| config_error(&path, e))?;
            validate(&path, &config)?;
            println!(
                "configuration OK: {} printer(s), {} UI backend(s), remote access {}",
                config.printers.len(),
                config.ui_backends.len(),
                if config.remote.enabled { "enabled" } else { "disabled" },
            );
            Ok(())
        }
        Command::ConfigPath => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn config_error(path: &Path, source: ConfigError) -> CliError {
    CliError::Config {
        path: path.display().to_string(),
        source,
    }
}

fn validate(path: &Path, config: &Config) -> Result<(), CliError> {
    config.validate().map_err(|e| config_error(path, e))
}

async fn run_gateway(path: &Path, args: &ServeArgs) -> Result<(), CliError> {
    let stored = load_or_init(path).map_err(|e| config_error(path, e))?;
    let mut config = stored.clone();
    if let Some(port) = args.port {
        config.listen_port = port;
    }
    validate(path, &config)?;
    let settings = config.to_settings().map_err(|e| config_error(path, e))?;

    // Bind first so a busy port fails before any printer is contacted.
    let local = bind(&format!("0.0.0.0:{}", config.listen_port)).await?;
    let remote = if config.remote.enabled && !args.no_remote {
        Some(bind(&config.remote.listen).await?)
    } else {
        None
    };

    // The store writes back the file as loaded, never the CLI overrides.
    let store = Arc::new(TomlConfigStore::new(path, stored));
    let gateway = Gateway::new(settings, store)?;
    gateway.start(config.printers.clone()).await?;
    let app = build_router(AppState::new(gateway.clone())?);

    let cancel = CancellationToken::new();
    let mut servers = JoinSet::new();
    servers.spawn(serve(local, app.clone(), cancel.clone()));
    if let Some(remote) = remote {
        info!(addr = %config.remote.listen, "remote listener enabled");
        servers.spawn(serve(remote, app, cancel.clone()));
    }

    let mut failure = None;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "cannot listen for ctrl-c, shutting down");
            }
            info!("shutdown requested");
        }
        Some(joined) = servers.join_next() => failure = listener_exit(joined),
    }

    cancel.cancel();
    while let Some(joined) = servers.join_next().await {
        if let Some(e) = listener_exit(joined) {
            failure.get_or_insert(e);
        }
    }
    gateway.shutdown().await;

    match failure {
        Some(e) => Err(CliError::Server(e)),
        None => Ok(()),
    }
}

fn listener_exit(joined: Result<std::io::Result<()>, JoinError>) -> Option<std::io::Error> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            error!(error = %e, "listener failed");
            Some(e)
        }
        Err(e) => {
            error!(error = %e, "listener task panicked");
            None
        }
    }
}

async fn bind(addr: &str) -> Result<TcpListener, CliError> {
    TcpListener::bind(addr).await.map_err(|source| CliError::Bind {
        addr: addr.to_owned(),
        source,
    })
}
