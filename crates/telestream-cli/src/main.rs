//! CLI for telestream — a live synthetic telemetry feed.

mod commands;

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use commands::parse_duration;

#[derive(Parser)]
#[command(name = "telestream")]
#[command(about = "telestream — synthetic system telemetry over server-sent events")]
#[command(version = telestream_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the telemetry feed over HTTP (GET /stream/telemetry)
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Time between samples (e.g. "700ms", "1s")
        #[arg(long, default_value = "700ms", value_parser = parse_duration)]
        interval: Duration,

        /// Samples a client may fall behind before it is disconnected
        #[arg(long, default_value = "16")]
        buffer: usize,

        /// Seed the sample generator for a reproducible feed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print samples to stdout as JSON lines (pipe-friendly)
    Sample {
        /// Number of samples to print (0 = until Ctrl+C)
        #[arg(long, default_value = "10")]
        count: usize,

        /// Time between samples (e.g. "700ms", "1s")
        #[arg(long, default_value = "700ms", value_parser = parse_duration)]
        interval: Duration,

        /// Seed the sample generator for a reproducible feed
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            host,
            port,
            interval,
            buffer,
            seed,
        } => commands::serve::run(&host, port, interval, buffer, seed),
        Commands::Sample {
            count,
            interval,
            seed,
        } => commands::sample::run(count, interval, seed),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
