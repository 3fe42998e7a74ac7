//! Background staleness sweeper
//!
//! Drives `Engine::sweep_now` on a tokio interval until the handle is
//! stopped.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::engine::Engine;
use crate::observability::Event;

/// Shortest period a sweeper runs at; `tokio::time::interval` rejects zero.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Periodic staleness sweep over a shared engine.
#[derive(Debug, Clone)]
pub struct StalenessSweeper {
    engine: Arc<Engine>,
    period: Duration,
}

/// Running sweeper; dropping it leaves the task running until the runtime
/// shuts down.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: broadcast::Sender<()>,
    join: JoinHandle<u64>,
}

impl StalenessSweeper {
    /// A zero period is raised to `MIN_PERIOD`.
    pub fn new(engine: Arc<Engine>, period: Duration) -> Self {
        Self {
            engine,
            period: period.max(MIN_PERIOD),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn on the current runtime.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> SweeperHandle {
        self.spawn_on(&Handle::current())
    }

    /// Spawn on `handle`.
    ///
    /// The first pass runs one full period after spawning. Each pass reads
    /// the engine clock, so a manual clock decides what is due.
    pub fn spawn_on(self, handle: &Handle) -> SweeperHandle {
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut shutdown_rx = shutdown_tx.subscribe();
        let period = self.period;
        let engine = self.engine;

        let join = handle.spawn(async move {
            info!(
                event = Event::SweeperStarted.as_str(),
                period_ms = period.as_millis() as u64,
                "staleness sweeper started"
            );

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() yields immediately on the first tick
            ticker.tick().await;

            let mut passes = 0u64;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        engine.sweep_now();
                        passes += 1;
                    }

                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            info!(event = Event::SweeperStopped.as_str(), passes, "staleness sweeper stopped");
            passes
        });

        SweeperHandle { shutdown_tx, join }
    }
}

impl SweeperHandle {
    /// Signal shutdown and wait for the loop to exit.
    ///
    /// Returns the number of passes the sweeper completed. A pass in flight
    /// finishes before the loop observes the signal.
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown_tx.send(());
        self.join.await.unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
