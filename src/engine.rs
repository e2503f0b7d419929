//! Engine root structure and cooperative run loop.
//!
//! One `Engine` instance owns the shared historical store and the armed
//! flag for the process lifetime. Its run loop multiplexes inbound poll
//! triggers, internal timer ticks, and completed-cycle joins; each cycle
//! runs as its own task, so cycles whose round trip outlasts the poll
//! interval overlap and interleave their folds last-writer-wins.

use crate::poll::cycle::run_cycle;
use crate::storage::HistoryStore;
use crate::transport::Transport;
use crate::types::{CycleBatch, PollRequest};
use log::{debug, error, info};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::interval;

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to the durable history document
    pub history_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("./var/data/commute_history.json"),
        }
    }
}

/// Polling-and-aggregation engine.
///
/// Starts idle; the first trigger arms the recurring timer and every
/// trigger, first or not, runs one cycle immediately with its supplied
/// configuration.
pub struct Engine<T: Transport> {
    transport: Arc<T>,
    store: Arc<RwLock<HistoryStore>>,
    history_path: PathBuf,
    /// Configuration used by timer ticks; replaced on every trigger
    current: Option<PollRequest>,
    armed: bool,
}

impl<T: Transport> Engine<T> {
    /// Load the historical store and construct an idle engine.
    ///
    /// Malformed durable state is fatal here, before any polling starts.
    pub fn new(transport: T, config: EngineConfig) -> Result<Self, String> {
        let store = HistoryStore::load(&config.history_path)?;
        Ok(Engine {
            transport: Arc::new(transport),
            store: Arc::new(RwLock::new(store)),
            history_path: config.history_path,
            current: None,
            armed: false,
        })
    }

    /// Snapshot of the historical store.
    pub fn history(&self) -> HistoryStore {
        self.store.read().clone()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Idle → Armed transition. Returns whether this call armed the engine;
    /// repeated calls are no-ops.
    fn arm(&mut self) -> bool {
        if self.armed {
            return false;
        }
        self.armed = true;
        true
    }

    /// Event loop: consume triggers, run cycles, emit batches.
    ///
    /// Returns when the trigger channel closes and in-flight cycles have
    /// drained, or with `Err` on the first fatal cycle error (persistence
    /// write failure).
    pub async fn run(
        mut self,
        mut triggers: mpsc::Receiver<PollRequest>,
        batches: mpsc::Sender<CycleBatch>,
    ) -> Result<(), String> {
        let (tick_tx, mut ticks) = mpsc::channel::<()>(1);
        let mut cycles: JoinSet<Result<(), String>> = JoinSet::new();

        loop {
            tokio::select! {
                trigger = triggers.recv() => match trigger {
                    Some(request) => {
                        info!("Poll trigger received for instance {}", request.instance_id);
                        self.spawn_cycle(&request, &mut cycles, &batches);
                        if self.arm() {
                            info!("Arming recurring poll timer at {} ms", request.poll_frequency);
                            spawn_timer(request.poll_frequency, tick_tx.clone());
                        } else {
                            debug!("Poll timer already armed");
                        }
                        self.current = Some(request);
                    }
                    None => break,
                },
                Some(()) = ticks.recv() => {
                    if let Some(request) = self.current.clone() {
                        self.spawn_cycle(&request, &mut cycles, &batches);
                    }
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    finish_cycle(joined)?;
                }
            }
        }

        // Host hung up: stop the timer and drain in-flight cycles
        drop(ticks);
        while let Some(joined) = cycles.join_next().await {
            finish_cycle(joined)?;
        }
        Ok(())
    }

    fn spawn_cycle(
        &self,
        request: &PollRequest,
        cycles: &mut JoinSet<Result<(), String>>,
        batches: &mpsc::Sender<CycleBatch>,
    ) {
        cycles.spawn(run_cycle(
            Arc::clone(&self.transport),
            request.clone(),
            Arc::clone(&self.store),
            self.history_path.clone(),
            batches.clone(),
        ));
    }
}

/// Recurring tick source for the armed engine. Exits once the engine run
/// loop drops its tick receiver.
fn spawn_timer(frequency_ms: u64, tick_tx: mpsc::Sender<()>) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(frequency_ms.max(1)));
        // The arming trigger already ran a cycle; skip the immediate tick
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if tick_tx.send(()).await.is_err() {
                break;
            }
        }
    });
}

fn finish_cycle(joined: Result<Result<(), String>, JoinError>) -> Result<(), String> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("Poll cycle failed: {}", e);
            Err(e)
        }
        Err(e) => Err(format!("Poll cycle task failed to join: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportOutcome;

    struct NullTransport;

    impl Transport for NullTransport {
        async fn fetch(&self, _url: &str) -> TransportOutcome {
            TransportOutcome::Failure("unreachable".to_string())
        }
    }

    fn test_engine() -> Engine<NullTransport> {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            history_path: dir.path().join("history.json"),
        };
        Engine::new(NullTransport, config).unwrap()
    }

    #[test]
    fn engine_starts_idle_with_empty_store() {
        let engine = test_engine();
        assert!(!engine.is_armed());
        assert!(engine.history().is_empty());
    }

    #[test]
    fn arming_is_idempotent() {
        let mut engine = test_engine();
        assert!(engine.arm());
        assert!(engine.is_armed());
        // Second trigger must not start a second recurring timer
        assert!(!engine.arm());
        assert!(engine.is_armed());
    }
}
