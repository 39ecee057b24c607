//! Tracery CLI - Command-line interface for Tracery
//!
//! This is the main entry point for running the live transfer graph.
//! It wires a block source into the graph maintainer and either serves
//! the result to renderer clients or replays a capture offline.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "tracery")]
#[command(author = "Tracery Contributors")]
#[command(version)]
#[command(about = "Live bounded graph of on-chain value flow", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the live graph to renderer clients over WebSocket
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "9870")]
        port: u16,

        /// Headless mode: bind to 0.0.0.0 for remote access
        #[arg(long)]
        headless: bool,

        /// Capture file to replay as the block source
        #[arg(short, long)]
        replay: PathBuf,

        /// Initial live-vertex capacity (adjustable by clients at runtime)
        #[arg(short, long, default_value = "300")]
        capacity: usize,

        /// Delay between block polls, in milliseconds
        #[arg(long, default_value = "3000")]
        interval_ms: u64,

        /// Render area width
        #[arg(long, default_value = "960")]
        width: f64,

        /// Render area height
        #[arg(long, default_value = "600")]
        height: f64,
    },

    /// Replay a capture file offline and print the resulting graph
    Replay {
        /// Capture file (one JSON block per line)
        file: PathBuf,

        /// Live-vertex capacity
        #[arg(short, long, default_value = "300")]
        capacity: usize,

        /// Output the final live sets as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Serve {
            port,
            headless,
            replay,
            capacity,
            interval_ms,
            width,
            height,
        } => commands::serve(port, headless, &replay, capacity, interval_ms, width, height).await,
        Commands::Replay {
            file,
            capacity,
            json,
        } => commands::replay(&file, capacity, json).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
