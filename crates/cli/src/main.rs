//! agentloop CLI: the main entry point.
//!
//! Commands:
//! - `run`    : Run a scenario in demo mode or as a JSON-in/JSON-out evaluation
//! - `tools`  : Print the tool schemas a scenario advertises
//! - `config` : Show the effective configuration

use clap::{Parser, Subcommand};

mod commands;

use commands::ScenarioName;

#[derive(Parser)]
#[command(
    name = "agentloop",
    about = "agentloop: tool-calling conversation loop",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario
    Run {
        /// Which scenario to run
        #[arg(value_enum)]
        scenario: ScenarioName,

        /// Read {"context":..., "messages":[...]} from stdin and write the final state as JSON
        #[arg(long)]
        eval: bool,

        /// Cap on tool rounds (overrides agent.max_rounds)
        #[arg(long)]
        max_rounds: Option<u32>,

        /// Run the tool invocations of a round concurrently
        #[arg(long)]
        concurrent: bool,
    },

    /// Print the tool schemas of a scenario as JSON
    Tools {
        #[arg(value_enum)]
        scenario: ScenarioName,
    },

    /// Show the effective configuration
    Config {
        /// Print the default configuration file instead
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before tracing so RUST_LOG can come from .env.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for transcripts and eval JSON.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
    }

    match cli.command {
        Commands::Run {
            scenario,
            eval,
            max_rounds,
            concurrent,
        } => {
            let options = commands::run::RunOptions {
                eval,
                max_rounds,
                concurrent,
            };
            commands::run::run(scenario, options).await?
        }
        Commands::Tools { scenario } => commands::tools::run(scenario)?,
        Commands::Config { default } => commands::config_cmd::run(default)?,
    }

    Ok(())
}
