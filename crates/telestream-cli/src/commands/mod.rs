pub mod sample;
pub mod serve;

use std::error::Error;
use std::time::Duration;

use telestream_core::{SampleGenerator, StreamConfig, TelemetryStream};

pub type CommandResult = Result<(), Box<dyn Error>>;

/// Build a stopped stream from CLI options. Validation happens at `start()`.
pub fn build_stream(interval: Duration, buffer: usize, seed: Option<u64>) -> TelemetryStream {
    let config = StreamConfig::default()
        .with_tick_interval(interval)
        .with_subscriber_buffer(buffer);
    let generator = match seed {
        Some(seed) => SampleGenerator::seeded(seed),
        None => SampleGenerator::new(),
    };
    TelemetryStream::with_generator(config, generator)
}

/// Parse a duration such as `700ms`, `2s`, `5m` or `1h`. Bare numbers are seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    let (numeric, multiplier) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1u64)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1000)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60_000)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3_600_000)
    } else {
        (s, 1000)
    };

    let value: u64 = numeric
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration: {s}"))?;

    value
        .checked_mul(multiplier)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration out of range: {s}"))
}

/// Resolve on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
