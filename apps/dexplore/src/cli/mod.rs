//! # dexplore CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Start the reference HTTP exploration service
//! - `explore` - Run one exploration (scripted, automatic or interactive)
//! - `render` - Render a saved DE graph
//! - `convert` - Derive LD/SI graphs through the remote service
//! - `knowledge` - Show the built-in knowledge base

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use dexplore_core::DexploreError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// dexplore - Design Exploration
///
/// Record design decisions one step at a time and watch the
/// Design Exploration graph grow.
#[derive(Parser, Debug)]
#[command(name = "dexplore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Base URL of the exploration service (overrides config and DEXPLORE_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the reference HTTP exploration service
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one exploration
    Explore {
        /// System to explore
        #[arg(short, long)]
        system: String,

        /// Use the remote service instead of the built-in knowledge base
        #[arg(short, long)]
        remote: bool,

        /// Exploration id on the remote service
        #[arg(long, default_value = "cli")]
        id: String,

        /// JSON array of events to submit in order
        #[arg(long, conflicts_with = "auto")]
        script: Option<PathBuf>,

        /// Take every suggestion until the exploration completes
        #[arg(short, long)]
        auto: bool,

        /// Write the DE graph here as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a DE graph saved as JSON
    Render {
        /// Input graph file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Derive LD and SI graphs from a completed DE graph
    Convert {
        /// Input DE graph file
        #[arg(short, long)]
        input: PathBuf,

        /// Directory receiving de.json, ld.json and si.json
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Show the built-in knowledge base
    Knowledge,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments. CLI flags override `config`.
pub async fn execute(cli: Cli, mut config: Config) -> Result<(), DexploreError> {
    if let Some(url) = cli.url {
        config.service_url = url;
    }
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            cmd_serve(&config).await
        }
        Commands::Explore {
            system,
            remote,
            id,
            script,
            auto,
            output,
        } => {
            let source = match (script, auto) {
                (Some(path), _) => EventSource::Script(load_script(&path)?),
                (None, true) => EventSource::Auto,
                (None, false) => EventSource::Interactive,
            };
            let options = ExploreOptions {
                system,
                source,
                output,
                json_mode,
            };
            if remote {
                cmd_explore_remote(&config, &id, options).await
            } else {
                cmd_explore_local(options).await
            }
        }
        Commands::Render { input } => cmd_render(&input, json_mode),
        Commands::Convert { input, output_dir } => {
            cmd_convert(&config, &input, &output_dir, json_mode).await
        }
        Commands::Knowledge => cmd_knowledge(json_mode),
    }
}
