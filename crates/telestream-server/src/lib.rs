//! HTTP telemetry server — live samples over server-sent events.
//!
//! Every client of `GET /stream/telemetry` becomes one subscriber of a shared
//! [`TelemetryStream`]. Each tick arrives as an SSE event whose data is the
//! sample as flat JSON. A client that disconnects is unsubscribed; stopping
//! the stream ends every open response.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse, Json, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::net::TcpListener;

use telestream_core::{Subscription, TelemetryStream};

/// Path of the SSE endpoint.
pub const TELEMETRY_PATH: &str = "/stream/telemetry";

/// Shared server state.
struct AppState {
    stream: TelemetryStream,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    running: bool,
    subscribers: usize,
    ticks: u64,
    interval_ms: u64,
}

async fn handle_telemetry(State(state): State<Arc<AppState>>) -> Response {
    match state.stream.subscribe() {
        Ok(subscription) => {
            log::debug!("SSE client attached as subscriber {}", subscription.id());
            Sse::new(sample_events(subscription))
                .keep_alive(KeepAlive::default())
                .into_response()
        }
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

/// One SSE event per sample. The subscription is dropped, and so removed from
/// the stream, when the response body is dropped on disconnect.
fn sample_events(subscription: Subscription) -> impl Stream<Item = Result<Event, axum::Error>> {
    subscription.map(|sample| Event::default().json_data(sample))
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stream = &state.stream;
    let running = stream.is_running();
    Json(HealthResponse {
        status: if running {
            "streaming".to_string()
        } else {
            "stopped".to_string()
        },
        running,
        subscribers: stream.subscriber_count(),
        ticks: stream.ticks(),
        interval_ms: stream.config().tick_interval.as_millis() as u64,
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Telestream Server",
        "version": telestream_core::VERSION,
        "interval_ms": state.stream.config().tick_interval.as_millis() as u64,
        "endpoints": {
            "/": "This API index",
            TELEMETRY_PATH: {
                "method": "GET",
                "media_type": "text/event-stream",
                "description": "Live telemetry samples, one event per tick",
                "fields": ["timestamp", "cpuLoad", "memLoad", "netUp", "netDown"],
            },
            "/health": "Stream health check",
        },
    }))
}

/// Build the axum router.
pub fn build_router(stream: TelemetryStream) -> Router {
    let state = Arc::new(AppState { stream });

    Router::new()
        .route("/", get(handle_index))
        .route(TELEMETRY_PATH, get(handle_telemetry))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Bind `host:port` and serve until `shutdown` resolves.
pub async fn run_server<F>(
    stream: TelemetryStream,
    host: &str,
    port: u16,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, stream, shutdown).await
}

/// Serve on an already bound listener.
///
/// When `shutdown` resolves the stream is stopped first, which completes every
/// open SSE response, and then in-flight connections are drained.
pub async fn serve<F>(
    listener: TcpListener,
    stream: TelemetryStream,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    log::info!("serving telemetry on http://{}", listener.local_addr()?);
    let app = build_router(stream.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            log::info!("shutdown requested, closing telemetry subscriptions");
            stream.stop().await;
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use telestream_core::{SampleGenerator, StreamConfig};

    fn state(interval_ms: u64) -> Arc<AppState> {
        let config = StreamConfig::default().with_tick_interval(Duration::from_millis(interval_ms));
        Arc::new(AppState {
            stream: TelemetryStream::with_generator(config, SampleGenerator::seeded(1)),
        })
    }

    #[tokio::test]
    async fn test_health_reports_stopped() {
        let state = state(700);
        let Json(health) = handle_health(State(state)).await;
        assert_eq!(health.status, "stopped");
        assert!(!health.running);
        assert_eq!(health.subscribers, 0);
        assert_eq!(health.interval_ms, 700);
    }

    #[tokio::test]
    async fn test_health_reports_subscribers() {
        let state = state(100);
        state.stream.start().unwrap();
        let _sub = state.stream.subscribe().unwrap();

        let Json(health) = handle_health(State(state.clone())).await;
        assert_eq!(health.status, "streaming");
        assert!(health.running);
        assert_eq!(health.subscribers, 1);
        state.stream.stop().await;
    }

    #[tokio::test]
    async fn test_telemetry_unavailable_when_stopped() {
        let response = handle_telemetry(State(state(100))).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_telemetry_registers_subscriber() {
        let state = state(100);
        state.stream.start().unwrap();

        let response = handle_telemetry(State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");
        assert_eq!(state.stream.subscriber_count(), 1);

        drop(response);
        assert_eq!(state.stream.subscriber_count(), 0);
        state.stream.stop().await;
    }

    #[tokio::test]
    async fn test_index_lists_endpoints() {
        let Json(index) = handle_index(State(state(700))).await;
        assert_eq!(index["interval_ms"], 700);
        let endpoints = index["endpoints"].as_object().unwrap();
        assert!(endpoints.contains_key(TELEMETRY_PATH));
        assert!(endpoints.contains_key("/health"));
    }
}
