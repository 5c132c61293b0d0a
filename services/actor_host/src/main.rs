//! actor-host entry point

use actor_host::{default_registry, tcp_config, Host};
use actors::Scheduler;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use network::{into_future, Requester};
use runtime_config::{init_logging, RuntimeConfig};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Instantiate configured modules and serve them (default)
    Serve,
    /// Send one request to a served module and print the reply
    Call {
        /// Replier address
        #[arg(long)]
        connect: String,

        /// Wire format; defaults to transport.default_format
        #[arg(long)]
        format: Option<String>,

        /// Operation name
        operation: String,

        /// Arguments as a JSON array
        #[arg(default_value = "[]")]
        arguments: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = RuntimeConfig::load(args.config.as_deref())?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Call {
            connect,
            format,
            operation,
            arguments,
        } => call(config, &connect, format, &operation, &arguments).await,
    }
}

async fn serve(config: RuntimeConfig) -> Result<()> {
    init_logging(&config.logging)?;
    info!("Starting actor host");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let host = Host::build(&config, &default_registry())?;
    let bound = host.bind().await?;
    info!(
        modules = host.modules().names().len(),
        served = bound.len(),
        workers = host.scheduler().worker_count(),
        "Actor host ready"
    );

    tokio::select! {
        result = host.serve(bound) => {
            if let Err(e) = &result {
                error!("Actor host error: {:#}", e);
            }
            result
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to install Ctrl-C handler")?;
            info!("Shutdown signal received");
            Ok(())
        }
    }
}

async fn call(
    config: RuntimeConfig,
    connect: &str,
    format: Option<String>,
    operation: &str,
    arguments: &str,
) -> Result<()> {
    // Keep stdout for the reply
    let mut logging = config.logging.clone();
    logging.level = "warn".to_string();
    init_logging(&logging)?;

    let json = codec::require("json")?;
    let arguments = json
        .decode(arguments.as_bytes())
        .context("Arguments must be valid JSON")?;
    let Some(arguments) = arguments.as_list().cloned() else {
        bail!("Arguments must be a JSON array, not {}", arguments.type_name());
    };

    let format = format.unwrap_or_else(|| config.transport.default_format.clone());
    let codec = codec::require(&format)?;
    let requester = Requester::connect(connect, codec, tcp_config(&config))
        .await
        .with_context(|| format!("Failed to connect to {}", connect))?;

    let scheduler = Scheduler::new(1);
    let reply = requester.mailbox().send(&scheduler, operation, arguments);
    match into_future(&reply).await {
        Ok(value) => {
            let rendered = json.encode(&value)?;
            println!("{}", String::from_utf8_lossy(&rendered));
            Ok(())
        }
        Err(e) => bail!("{} failed: {}", operation, e),
    }
}
