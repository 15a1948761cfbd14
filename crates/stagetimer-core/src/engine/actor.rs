//! Actor-style concurrency wrapper around the reducer.
//!
//! A single spawned processing loop owns the only mutable [`TimerState`] and
//! is the sole writer. Commands arrive through an unbounded, order-preserving
//! queue, so `submit` never blocks and the reducer's purity is sufficient for
//! correctness. Commands submitted before the loop has been scheduled buffer
//! in the channel and flush in arrival order.

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::model::TimerState;

use super::reducer::reduce;
use super::{TimerCommand, TimerEvent};

/// Per-subscriber event buffer; on overflow the oldest buffered event for
/// that subscriber is dropped, never the newest.
pub const DEFAULT_EVENT_BUFFER: usize = 8;

/// Serializes commands through a single processing loop and republishes the
/// resulting state and events.
pub struct TimerEngine {
    commands: mpsc::UnboundedSender<TimerCommand>,
    state_rx: watch::Receiver<TimerState>,
    events_tx: broadcast::Sender<TimerEvent>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TimerEngine {
    /// Spawn the processing loop on the current tokio runtime.
    pub fn spawn(initial_state: TimerState) -> Self {
        Self::with_event_buffer(initial_state, DEFAULT_EVENT_BUFFER)
    }

    pub fn with_event_buffer(initial_state: TimerState, event_buffer: usize) -> Self {
        let (commands, mut command_rx) = mpsc::unbounded_channel::<TimerCommand>();
        let (state_tx, state_rx) = watch::channel(initial_state);
        let (events_tx, _) = broadcast::channel(event_buffer.max(1));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let loop_events = events_tx.clone();
        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe_command = command_rx.recv() => {
                        let Some(command) = maybe_command else { break };
                        let reduction = {
                            let current = state_tx.borrow();
                            reduce(&current, &command)
                        };
                        state_tx.send_if_modified(|slot| {
                            if *slot == reduction.state {
                                false
                            } else {
                                *slot = reduction.state;
                                true
                            }
                        });
                        for event in reduction.events {
                            // No receivers is fine; events are best-effort.
                            let _ = loop_events.send(event);
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!("timer engine loop stopped");
        });

        Self {
            commands,
            state_rx,
            events_tx,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueue a command for processing. Never blocks; ordering from a single
    /// caller is preserved. Silently dropped once the engine has shut down.
    pub fn submit(&self, command: TimerCommand) {
        if *self.shutdown_tx.borrow() {
            return;
        }
        let _ = self.commands.send(command);
    }

    /// Latest published state snapshot.
    pub fn current_state(&self) -> TimerState {
        self.state_rx.borrow().clone()
    }

    /// State stream. The receiver exposes the current state immediately via
    /// `borrow`; `changed` resolves on subsequent updates. Slow subscribers
    /// only ever observe the most recent state.
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state_rx.clone()
    }

    /// Event stream. Not replayed; a new listener only sees future events.
    pub fn events(&self) -> broadcast::Receiver<TimerEvent> {
        self.events_tx.subscribe()
    }

    /// Stop the processing loop. The command being processed (if any) runs to
    /// completion; everything submitted afterwards is dropped.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
