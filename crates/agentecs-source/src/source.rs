//! The tick-loop source: the authoritative driver of simulated time.

use crate::generator::WorldGenerator;
use crate::subscription::{fan_out, SubscriberMap, Subscription};
use agentecs_core::{VizConfig, VizError};
use agentecs_history::InMemoryHistoryStore;
use agentecs_protocol::{ClientCommand, ServerEvent};
use agentecs_snapshot::WorldSnapshot;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Cooperative driver that advances simulated time, records history, and
/// fans events out to every live subscriber.
///
/// A `TickLoopSource` is always used behind an `Arc`: [`connect`](Self::connect)
/// spawns a background task that needs to outlive the call that started it.
pub struct TickLoopSource {
    config: VizConfig,
    world: Mutex<Box<dyn WorldGenerator>>,
    history: InMemoryHistoryStore,
    subscribers: SubscriberMap,
    current_tick: AtomicU64,
    paused: AtomicBool,
    connected: AtomicBool,
    tick_interval: Mutex<Duration>,
    stop: Mutex<Option<CancellationToken>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl TickLoopSource {
    /// Create a source around the given world generator. The driver is not
    /// running until [`connect`](Self::connect) is called.
    #[must_use]
    pub fn new(config: VizConfig, world: Box<dyn WorldGenerator>) -> Self {
        let history = InMemoryHistoryStore::new(config.max_ticks, config.checkpoint_interval);
        let tick_interval = config.tick_interval;
        Self {
            config,
            world: Mutex::new(world),
            history,
            subscribers: Arc::new(DashMap::new()),
            current_tick: AtomicU64::new(0),
            paused: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            tick_interval: Mutex::new(tick_interval),
            stop: Mutex::new(None),
            driver: Mutex::new(None),
        }
    }

    /// Initialize state and launch the background driver.
    ///
    /// Safe to call again after [`disconnect`](Self::disconnect): state is
    /// reinitialized from scratch, exactly as on first connect.
    pub fn connect(self: &Arc<Self>) {
        self.history.clear();
        self.current_tick.store(0, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        *self.tick_interval.lock() = self.config.tick_interval;

        let initial = self.world.lock().advance(0, now_seconds());
        self.history.record_tick(initial);
        self.connected.store(true, Ordering::SeqCst);

        let stop = CancellationToken::new();
        *self.stop.lock() = Some(stop.clone());

        let source = Arc::clone(self);
        let handle = tokio::spawn(async move { source.run(stop).await });
        *self.driver.lock() = Some(handle);

        debug!("tick-loop source connected");
    }

    /// Signal the driver to stop, wait for it to exit, and drop every
    /// subscriber queue.
    pub async fn disconnect(&self) {
        if let Some(stop) = self.stop.lock().take() {
            stop.cancel();
        }
        let handle = self.driver.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.subscribers.clear();
        self.connected.store(false, Ordering::SeqCst);
        debug!("tick-loop source disconnected");
    }

    /// Whether the driver is currently running.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Whether the driver is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// The current tick.
    #[must_use]
    pub fn get_current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::SeqCst)
    }

    /// The oldest and newest ticks currently retained.
    #[must_use]
    pub fn get_tick_range(&self) -> Option<(u64, u64)> {
        self.history.get_tick_range()
    }

    /// The live snapshot, or a specific historical one.
    ///
    /// `tick == None` or `tick == Some(current)` returns the live snapshot.
    /// Any other retained tick is reconstructed from history. An
    /// unretained tick yields an empty snapshot at that tick rather than
    /// failing — this method never errors. Callers that need to distinguish
    /// "unknown tick" from "empty by design" (e.g. the `seek` command) should
    /// use [`historical_snapshot`](Self::historical_snapshot) instead.
    #[must_use]
    pub fn get_snapshot(&self, tick: Option<u64>) -> WorldSnapshot {
        let current = self.get_current_tick();
        let target = tick.unwrap_or(current);
        self.history
            .get_snapshot(target)
            .unwrap_or_else(|| WorldSnapshot::new(target, now_seconds()))
    }

    /// The historical snapshot at `tick`, or `None` if it is not retained.
    #[must_use]
    pub fn historical_snapshot(&self, tick: u64) -> Option<WorldSnapshot> {
        self.history.get_snapshot(tick)
    }

    /// Read access to the embedded history store, e.g. for error/span range
    /// queries or the entity lifecycle report.
    #[must_use]
    pub fn history(&self) -> &InMemoryHistoryStore {
        &self.history
    }

    /// The world generator's opaque visualization configuration, if any, for
    /// inclusion in the `metadata` handshake event.
    #[must_use]
    pub fn visualization_config(&self) -> Option<serde_json::Value> {
        self.world.lock().visualization_config()
    }

    /// Register a fresh, independent subscriber stream.
    ///
    /// Each call returns a new stream backed by its own bounded queue;
    /// dropping the returned [`Subscription`] releases the queue.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription::new(Arc::clone(&self.subscribers), self.config.queue_capacity)
    }

    /// Dispatch a playback-control command. `seek` is not handled here: the
    /// session multiplexer resolves it directly against history and replies
    /// on the requesting connection only.
    pub fn send_command(&self, command: &ClientCommand) -> Result<(), VizError> {
        match command {
            ClientCommand::Pause => {
                self.paused.store(true, Ordering::SeqCst);
                Ok(())
            }
            ClientCommand::Resume => {
                self.paused.store(false, Ordering::SeqCst);
                Ok(())
            }
            ClientCommand::Step => {
                if self.is_paused() {
                    self.execute_tick();
                } else {
                    trace!("ignoring step command: source is not paused");
                }
                Ok(())
            }
            ClientCommand::SetSpeed { ticks_per_second } => {
                if !ticks_per_second.is_finite() || *ticks_per_second <= 0.0 {
                    return Err(VizError::InvalidCommand(format!(
                        "ticks_per_second must be a positive number, got {ticks_per_second}"
                    )));
                }
                *self.tick_interval.lock() = Duration::from_secs_f64(1.0 / ticks_per_second);
                Ok(())
            }
            ClientCommand::Seek { .. } => Err(VizError::InvalidCommand(
                "seek is resolved by the session multiplexer, not send_command".to_string(),
            )),
        }
    }

    /// Advance the world by exactly one tick: build a snapshot, record it,
    /// and fan it out along with any ancillary telemetry.
    fn execute_tick(&self) {
        let tick = self.current_tick.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp = now_seconds();

        let snapshot = self.world.lock().advance(tick, timestamp);
        let (errors, spans) = self.world.lock().ancillary_events(tick);

        self.history.record_tick(snapshot.clone());
        fan_out(&self.subscribers, &ServerEvent::Snapshot { tick, snapshot });

        for error in errors {
            self.history.record_error(error.clone());
            fan_out(&self.subscribers, &ServerEvent::ErrorEvent { error });
        }
        for span in spans {
            self.history.record_span(span.clone());
            fan_out(&self.subscribers, &ServerEvent::SpanEvent { span });
        }
    }

    /// The cooperative driver loop: advance-or-skip, then wait for the tick
    /// interval or the stop signal, whichever comes first.
    async fn run(self: Arc<Self>, stop: CancellationToken) {
        loop {
            if !self.is_paused() {
                self.execute_tick();
            }

            let interval = *self.tick_interval.lock();
            tokio::select! {
                biased;
                () = stop.cancelled() => {
                    trace!("driver loop received stop signal");
                    break;
                }
                () = tokio::time::sleep(interval) => {}
            }
        }
    }
}

fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}
