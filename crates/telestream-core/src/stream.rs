//! Periodic broadcast of telemetry samples to many subscribers.
//!
//! Architecture:
//! 1. One producer task per running stream, driven by a `tokio::time` interval
//! 2. Each tick draws exactly one sample from the owned [`SampleGenerator`]
//! 3. The sample is copied into every subscriber's bounded channel with `try_send`
//! 4. A subscriber whose channel is full or closed is dropped, the tick never waits
//! 5. `stop()` cancels the producer and closes every subscription
//!
//! Generator, subscriber set and lifecycle state share one lock, so a tick
//! never observes a half-applied subscribe, unsubscribe or stop.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::generator::SampleGenerator;
use crate::sample::TelemetrySample;

/// Opaque identifier of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct State {
    generator: SampleGenerator,
    subscribers: HashMap<SubscriberId, mpsc::Sender<TelemetrySample>>,
    run: Option<Running>,
}

struct Shared {
    config: StreamConfig,
    state: Mutex<State>,
    next_id: AtomicU64,
    ticks: AtomicU64,
}

impl Shared {
    /// One tick: draw a sample and fan it out. Skipped if `cancel` fired,
    /// which `stop()` does under the same lock.
    fn tick(&self, cancel: &CancellationToken) {
        let mut state = self.state.lock();
        if cancel.is_cancelled() {
            return;
        }

        let sample = state.generator.next_sample();
        self.ticks.fetch_add(1, Ordering::Relaxed);

        state.subscribers.retain(|id, tx| match tx.try_send(sample) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::debug!("subscriber {id} fell behind, dropping it");
                false
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!("subscriber {id} went away");
                false
            }
        });
    }

    fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.state.lock().subscribers.remove(&id).is_some();
        if removed {
            log::debug!("subscriber {id} unsubscribed");
        }
        removed
    }
}

/// A periodic telemetry feed shared by any number of subscribers.
///
/// Cloning yields another handle to the same stream.
///
/// ```no_run
/// use telestream_core::{StreamConfig, TelemetryStream};
///
/// # async fn demo() -> Result<(), telestream_core::StreamError> {
/// let stream = TelemetryStream::new(StreamConfig::default());
/// stream.start()?;
///
/// let mut subscription = stream.subscribe()?;
/// while let Some(sample) = subscription.recv().await {
///     println!("cpu {:.1}%", sample.cpu_load);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TelemetryStream {
    shared: Arc<Shared>,
}

impl TelemetryStream {
    /// Create a stopped stream with an OS-seeded generator.
    pub fn new(config: StreamConfig) -> Self {
        Self::with_generator(config, SampleGenerator::new())
    }

    /// Create a stopped stream that draws from `generator`.
    pub fn with_generator(config: StreamConfig, generator: SampleGenerator) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(State {
                    generator,
                    subscribers: HashMap::new(),
                    run: None,
                }),
                next_id: AtomicU64::new(0),
                ticks: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.shared.config
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().run.is_some()
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.state.lock().subscribers.len()
    }

    /// Samples produced since this stream was created, across restarts.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    /// Arm the tick timer. No-op when already running.
    ///
    /// Fails with [`StreamError::Configuration`] for an invalid config and
    /// [`StreamError::NoRuntime`] outside a Tokio runtime.
    pub fn start(&self) -> Result<()> {
        self.shared.config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StreamError::NoRuntime)?;

        let mut state = self.shared.state.lock();
        if state.run.is_some() {
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let task = runtime.spawn(produce(
            Arc::downgrade(&self.shared),
            self.shared.config.tick_interval,
            cancel.clone(),
        ));
        state.run = Some(Running { cancel, task });
        drop(state);

        log::info!(
            "telemetry stream started (interval {}ms)",
            self.shared.config.tick_interval.as_millis()
        );
        Ok(())
    }

    /// Stop the timer and close every subscription. No-op when already stopped.
    ///
    /// Subscribers receive any samples still buffered, then `None`.
    pub async fn stop(&self) {
        let running = {
            let mut state = self.shared.state.lock();
            let Some(running) = state.run.take() else {
                return;
            };
            running.cancel.cancel();
            state.subscribers.clear();
            running
        };

        if let Err(err) = running.task.await {
            if err.is_panic() {
                log::warn!("telemetry producer task panicked: {err}");
            }
        }
        log::info!("telemetry stream stopped");
    }

    /// Register a subscriber. Its sequence starts at the next tick; nothing
    /// produced earlier is replayed.
    ///
    /// Fails with [`StreamError::Stopped`] unless the stream is running.
    pub fn subscribe(&self) -> Result<Subscription> {
        let mut state = self.shared.state.lock();
        if state.run.is_none() {
            return Err(StreamError::Stopped);
        }

        let id = SubscriberId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.shared.config.subscriber_buffer);
        state.subscribers.insert(id, tx);
        drop(state);

        log::debug!("subscriber {id} attached");
        Ok(Subscription {
            id,
            receiver: rx,
            shared: Arc::downgrade(&self.shared),
        })
    }

    /// Remove a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.shared.remove(id)
    }
}

async fn produce(shared: Weak<Shared>, period: Duration, cancel: CancellationToken) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        // Every handle is gone; nobody can subscribe or stop us.
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.tick(&cancel);
    }
}

/// One subscriber's view of a [`TelemetryStream`].
///
/// Yields samples until the subscriber is removed or the stream stops.
/// Dropping the handle unsubscribes it.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<TelemetrySample>,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next sample. `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<TelemetrySample> {
        self.receiver.recv().await
    }

    /// Detach from the stream. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Stream for Subscription {
    type Item = TelemetrySample;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
