use std::time::Duration;

use telestream_server::TELEMETRY_PATH;

use super::CommandResult;

pub fn run(
    host: &str,
    port: u16,
    interval: Duration,
    buffer: usize,
    seed: Option<u64>,
) -> CommandResult {
    let stream = super::build_stream(interval, buffer, seed);
    stream.config().validate()?;

    let base = format!("http://{host}:{port}");

    println!("📡 Telestream Server v{}", telestream_core::VERSION);
    println!("   {base}");
    println!(
        "   one sample every {}ms, {} buffered per client",
        interval.as_millis(),
        buffer
    );
    println!();
    println!("   Endpoints:");
    println!("     GET /                   API index");
    println!("     GET {TELEMETRY_PATH}   Live samples (text/event-stream)");
    println!("     GET /health             Stream health check");
    println!();
    println!("   Example:");
    println!("     curl -N {base}{TELEMETRY_PATH}");
    println!();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        stream.start()?;
        telestream_server::run_server(stream, host, port, super::shutdown_signal()).await?;
        log::info!("server stopped");
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
