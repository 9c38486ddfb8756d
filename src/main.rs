use anyhow::Result;
use clap::{Parser, Subcommand};
use devnest::{config::Config, dispatcher, gateway};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "devnest=info,tower_http=info";

#[derive(Parser)]
#[command(name = "devnest")]
#[command(about = "DevNest AI coding-assistant backend", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Bind address (overrides config and HOST)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// Path to a TOML config file (default: ./devnest.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the offline template response for a message
    Respond {
        /// Message to answer
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, config } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }

            let state = gateway::build_state(&config).await?;
            gateway::run_gateway(&config.gateway.host, config.gateway.port, state).await
        }
        Commands::Respond { message } => {
            println!("{}", dispatcher::dispatch(&message));
            Ok(())
        }
    }
}
