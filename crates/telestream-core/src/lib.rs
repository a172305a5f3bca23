//! # telestream-core
//!
//! A periodic feed of synthetic system-telemetry samples, broadcast to any
//! number of subscribers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use telestream_core::{StreamConfig, TelemetryStream};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), telestream_core::StreamError> {
//! let stream = TelemetryStream::new(StreamConfig::default());
//! stream.start()?;
//!
//! let mut subscription = stream.subscribe()?;
//! if let Some(sample) = subscription.recv().await {
//!     println!("cpu {:.1}% mem {:.1}%", sample.cpu_load, sample.mem_load);
//! }
//!
//! stream.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Timer → Generator → Fan-out → Subscriber buffers
//!
//! - [`SampleGenerator`] draws one [`TelemetrySample`] per tick from an owned,
//!   optionally seeded, pseudo-random source.
//! - [`TelemetryStream`] owns the timer and the subscriber set. Each tick is
//!   delivered to every subscriber without waiting on any of them; a
//!   subscriber that cannot keep up is dropped, never the tick.

pub mod config;
pub mod error;
pub mod generator;
pub mod sample;
pub mod stream;

pub use config::{
    DEFAULT_SUBSCRIBER_BUFFER, DEFAULT_TICK_INTERVAL, MAX_TICK_INTERVAL, StreamConfig,
};
pub use error::StreamError;
pub use generator::SampleGenerator;
pub use sample::{TelemetrySample, round2, unix_ms_now};
pub use stream::{SubscriberId, Subscription, TelemetryStream};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
