//! # dexplore - Design Exploration
//!
//! The main binary for interactive design exploration.
//!
//! This application provides:
//! - Reference HTTP exploration service (axum-based)
//! - CLI for scripted, automatic and interactive explorations
//! - Client for a remote exploration and conversion service
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    apps/dexplore (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │   HTTP API  │    │  Explorer        │    │
//! │  │  (clap)     │    │   (axum)    │    │  (in-flight gate)│    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         │                  │                    │               │
//! │         └──────────────────┼────────────────────┘               │
//! │                            ▼                                    │
//! │                    ┌───────────────┐                            │
//! │                    │ dexplore-core │                            │
//! │                    │ (THE LOGIC)   │                            │
//! │                    └───────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the reference service
//! dexplore serve --host 0.0.0.0 --port 8000
//!
//! # Explore locally, taking every suggestion
//! dexplore explore --system car_running --auto --output de.json
//!
//! # Derive LD/SI graphs through a remote service
//! dexplore convert --input de.json --output-dir out/
//! ```

use clap::Parser;
use dexplore::cli;
use dexplore::config::{Config, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format, cli.verbose);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so `--json-mode` output stays parseable.
fn init_tracing(format: LogFormat, verbose: bool) {
    let default_filter = if verbose {
        "dexplore=debug,tower_http=debug"
    } else {
        "dexplore=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Print the dexplore startup banner.
fn print_banner() {
    println!(
        r#"
  ┌┬┐┌─┐─┐ ┬┌─┐┬  ┌─┐┬─┐┌─┐
   ││├┤ ┌┴┬┘├─┘│  │ │├┬┘├┤
  ─┴┘└─┘┴ └─┴  ┴─┘└─┘┴└─└─┘

  Design Exploration v{}

  Situation • Problem • Intention • Decision
"#,
        env!("CARGO_PKG_VERSION")
    );
}
