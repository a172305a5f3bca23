use std::future::Future;
use std::io::Write;
use std::time::Duration;

use telestream_core::{DEFAULT_SUBSCRIBER_BUFFER, Subscription};

use super::CommandResult;

pub fn run(count: usize, interval: Duration, seed: Option<u64>) -> CommandResult {
    let stream = super::build_stream(interval, DEFAULT_SUBSCRIBER_BUFFER, seed);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        stream.start()?;
        let mut subscription = stream.subscribe()?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let written =
            write_samples(&mut subscription, count, &mut out, super::shutdown_signal()).await;

        drop(subscription);
        stream.stop().await;
        log::debug!("wrote {} samples", written?);
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Write one JSON line per sample until `count` lines are out (0 = no limit),
/// the subscription ends, the writer fails (broken pipe) or `shutdown` fires.
async fn write_samples<W, F>(
    subscription: &mut Subscription,
    count: usize,
    out: &mut W,
    shutdown: F,
) -> Result<usize, serde_json::Error>
where
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut written = 0usize;

    while count == 0 || written < count {
        let sample = tokio::select! {
            _ = &mut shutdown => break,
            next = subscription.recv() => match next {
                Some(sample) => sample,
                None => break,
            },
        };

        let line = serde_json::to_string(&sample)?;
        if writeln!(out, "{line}").is_err() || out.flush().is_err() {
            break; // Broken pipe
        }
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use telestream_core::{SampleGenerator, StreamConfig, TelemetrySample, TelemetryStream};

    fn started_stream() -> TelemetryStream {
        let config = StreamConfig::default().with_tick_interval(Duration::from_millis(100));
        let stream = TelemetryStream::with_generator(config, SampleGenerator::seeded(5));
        stream.start().unwrap();
        stream
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_requested_count() {
        let stream = started_stream();
        let mut sub = stream.subscribe().unwrap();
        let mut out = Vec::new();

        let written = write_samples(&mut sub, 3, &mut out, std::future::pending())
            .await
            .unwrap();
        assert_eq!(written, 3);

        let text = String::from_utf8(out).unwrap();
        let samples: Vec<TelemetrySample> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| s.cpu_load >= 1.0 && s.mem_load >= 5.0));
        stream.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_stream_stops() {
        let stream = started_stream();
        let mut sub = stream.subscribe().unwrap();
        let mut out = Vec::new();

        let stopper = stream.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            stopper.stop().await;
        });

        let written = write_samples(&mut sub, 0, &mut out, std::future::pending())
            .await
            .unwrap();
        assert_eq!(written, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_shutdown() {
        let stream = started_stream();
        let mut sub = stream.subscribe().unwrap();
        let mut out = Vec::new();

        let shutdown = tokio::time::sleep(Duration::from_millis(350));
        let written = write_samples(&mut sub, 0, &mut out, shutdown).await.unwrap();
        assert_eq!(written, 3);
        stream.stop().await;
    }

    /// Accepts writes but fails every flush, like a closed pipe behind a buffer.
    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_flush_fails() {
        let stream = started_stream();
        let mut sub = stream.subscribe().unwrap();
        let mut out = FailingFlush(Vec::new());

        let written = write_samples(&mut sub, 0, &mut out, std::future::pending())
            .await
            .unwrap();
        assert_eq!(written, 0);
        assert_eq!(out.0.iter().filter(|&&b| b == b'\n').count(), 1);
        stream.stop().await;
    }
}
