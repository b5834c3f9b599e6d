//! Paddock CLI - sign in and call the racing fan API from a terminal

mod commands;
mod state_dir;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::{Commands, Context};
use paddock_core::{ClientConfig, login_message_key};
use paddock_http::ClientError;
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "paddock")]
#[command(about = "Command-line client for the Paddock API")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Backend base URL (overrides PADDOCK_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in milliseconds (overrides PADDOCK_TIMEOUT_MS)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Directory for remembered credentials
    #[arg(short = 'd', long, global = true, env = "PADDOCK_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = &self.api_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        Ok(config.normalized()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    paddock_core::logging::init_tracing(cli.log_level.filter())?;

    let config = cli.client_config()?;
    debug!("Using API at {}", config.api_base_url);

    let context = Context::new(&config, cli.state_dir.clone())?;
    let login_messages = cli.command.uses_login_messages();
    if let Err(e) = cli.command.execute(&context).await {
        report(&e, login_messages);
        std::process::exit(1);
    }

    Ok(())
}

/// Print a failure the way the web front-end would show it.
///
/// Translation keys are only printed for the login and signup forms.
fn report(e: &anyhow::Error, login_messages: bool) {
    error!("Command failed: {e:#}");

    let Some(client_error) = e.downcast_ref::<ClientError>() else {
        eprintln!("error: {e:#}");
        return;
    };

    let info = client_error.error_info();
    eprintln!("error: {client_error}");
    if let Some(code) = &info.code {
        eprintln!("  code:    {code}");
    }
    if let Some(message) = &info.message {
        eprintln!("  message: {message}");
    }
    if client_error.is_network() {
        eprintln!("  the server could not be reached");
    } else if login_messages {
        eprintln!("  key:     {}", login_message_key(info.code.as_deref()));
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn filter(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
