mod commands;
mod logging;
mod registry;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "roundhouse",
    version,
    about = "Round-by-round export pipeline runner"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace). Overrides the config file.
    #[arg(long, global = true, env = "ROUNDHOUSE_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline until interrupted
    Run {
        /// Path to pipeline YAML file
        config: PathBuf,
        /// Override `data_dir` from the config
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Force the next round to process (overrides the checkpoint)
        #[arg(long)]
        next_round: Option<u64>,
    },
    /// Validate a pipeline file and resolve its plugins
    Check {
        /// Path to pipeline YAML file
        config: PathBuf,
    },
    /// List the plugins built into this binary
    Plugins,
    /// Print a starter pipeline config
    Init {
        #[arg(long, default_value = "synthetic")]
        source: String,
        /// Transform to include; repeat for a chain
        #[arg(long = "transform")]
        transforms: Vec<String>,
        #[arg(long, default_value = "noop")]
        sink: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_level = cli.log_level.as_deref();

    match cli.command {
        Commands::Run {
            config,
            data_dir,
            next_round,
        } => commands::run::execute(&config, data_dir, next_round, log_level).await,
        Commands::Check { config } => {
            logging::init(log_level.unwrap_or("warn"));
            commands::check::execute(&config)
        }
        Commands::Plugins => {
            logging::init(log_level.unwrap_or("warn"));
            commands::plugins::execute()
        }
        Commands::Init {
            source,
            transforms,
            sink,
        } => {
            logging::init(log_level.unwrap_or("warn"));
            commands::init::execute(&source, &transforms, &sink)
        }
    }
}
