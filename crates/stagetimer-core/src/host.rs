//! Hosting loop: wires the engine to persistence, ticking, and countdown
//! wake-ups.
//!
//! The host owns the ambient tasks around the pure engine: it persists every
//! published state, runs the per-second ticker only while the timer is
//! running, and keeps the countdown scheduler armed for the upcoming segment
//! boundary. All collaborators (store, clock, platform alarm) are injected.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::engine::{TimerCommand, TimerEngine, TimerEvent};
use crate::error::{CoreError, Result};
use crate::model::{RunStatus, Segment, SegmentDurations, TimerState};
use crate::scheduler::{AlarmCapability, CountdownScheduler, WakeAlarm};
use crate::storage::{Config, TimerStore};
use crate::time::MonotonicClock;

/// Countdown feedback pulse for haptic/UI collaborators: the boundary is
/// `seconds_left` away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownPulse {
    pub seconds_left: u32,
    pub boundary_at_ms: i64,
}

/// The hosting loop around a [`TimerEngine`].
pub struct TimerHost {
    engine: Arc<TimerEngine>,
    store: Arc<dyn TimerStore>,
    clock: Arc<dyn MonotonicClock>,
    scheduler: Arc<CountdownScheduler>,
    countdown_tx: broadcast::Sender<CountdownPulse>,
    shutdown_tx: watch::Sender<bool>,
    observer: Mutex<Option<JoinHandle<()>>>,
}

impl TimerHost {
    /// Build the host: recover persisted state, spawn the engine and the
    /// observer loop, and resubmit `Start` for an interrupted session.
    pub async fn spawn(
        store: Arc<dyn TimerStore>,
        clock: Arc<dyn MonotonicClock>,
        platform_alarm: Option<Arc<dyn WakeAlarm>>,
        config: Config,
    ) -> Self {
        let last = store.load_last_state();
        // An interrupted session is re-derived from a fresh Start rather
        // than trusting a possibly-stale snapshot verbatim.
        let initial = match &last {
            Some(state) if matches!(state.status(), RunStatus::Running | RunStatus::Paused) => {
                TimerState::idle(state.durations())
            }
            Some(state) => state.clone(),
            None => TimerState::idle(SegmentDurations::zero()),
        };
        let engine = Arc::new(TimerEngine::spawn(initial));

        let (wake_tx, wake_rx) = mpsc::unbounded_channel::<i64>();
        let scheduler = Arc::new(CountdownScheduler::new(
            Arc::clone(&clock),
            platform_alarm,
            move |boundary_at_ms| {
                let _ = wake_tx.send(boundary_at_ms);
            },
        ));

        let (countdown_tx, _) = broadcast::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let observer = Observer {
            engine: Arc::clone(&engine),
            store: Arc::clone(&store),
            clock: Arc::clone(&clock),
            scheduler: Arc::clone(&scheduler),
            countdown_tx: countdown_tx.clone(),
            lead_secs: config.countdown.lead_secs,
            grace_ms: config.countdown.grace_ms,
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            ticker: None,
            scheduled_boundary_ms: None,
            countdown_started_boundary_ms: None,
            armed_segment: None,
        };
        let states = engine.subscribe();
        let events = engine.events();
        let worker = tokio::spawn(observer.run(states, events, wake_rx, shutdown_rx));

        let host = Self {
            engine,
            store,
            clock,
            scheduler,
            countdown_tx,
            shutdown_tx,
            observer: Mutex::new(Some(worker)),
        };
        host.recover(last);
        host
    }

    fn recover(&self, last: Option<TimerState>) {
        let Some(state) = last else { return };
        if !matches!(state.status(), RunStatus::Running | RunStatus::Paused) {
            return;
        }
        let Some(meta) = state.active_preset() else {
            return;
        };
        match self
            .store
            .load_presets()
            .into_iter()
            .find(|p| p.id() == meta.id)
        {
            Some(preset) => {
                info!(preset = %meta.id, "recovering interrupted session");
                self.engine.submit(TimerCommand::Start {
                    preset,
                    now_ms: self.clock.now_ms(),
                });
            }
            None => {
                warn!(preset = %meta.id, "persisted session references an unknown preset; staying idle");
            }
        }
    }

    /// Resolve a preset and start it.
    pub fn start(&self, preset_id: &str) -> Result<()> {
        let preset = self
            .store
            .load_presets()
            .into_iter()
            .find(|p| p.id() == preset_id)
            .ok_or_else(|| CoreError::UnknownPreset(preset_id.to_string()))?;
        self.engine.submit(TimerCommand::Start {
            preset,
            now_ms: self.clock.now_ms(),
        });
        Ok(())
    }

    pub fn pause(&self) {
        self.engine.submit(TimerCommand::Pause {
            now_ms: self.clock.now_ms(),
        });
    }

    pub fn resume(&self) {
        self.engine.submit(TimerCommand::Resume {
            now_ms: self.clock.now_ms(),
        });
    }

    pub fn skip(&self) {
        self.engine.submit(TimerCommand::SkipSegment {
            now_ms: self.clock.now_ms(),
        });
    }

    pub fn stop(&self) {
        self.engine.submit(TimerCommand::Stop);
    }

    pub fn current_state(&self) -> TimerState {
        self.engine.current_state()
    }

    /// State stream; replays the current state via `borrow`.
    pub fn states(&self) -> watch::Receiver<TimerState> {
        self.engine.subscribe()
    }

    /// Transition event stream; future events only.
    pub fn events(&self) -> broadcast::Receiver<TimerEvent> {
        self.engine.events()
    }

    /// Countdown pulses emitted when a boundary enters the lead window.
    pub fn countdowns(&self) -> broadcast::Receiver<CountdownPulse> {
        self.countdown_tx.subscribe()
    }

    /// Whether precise wake-ups are platform-backed or degraded.
    pub fn alarm_capability(&self) -> watch::Receiver<AlarmCapability> {
        self.scheduler.capability()
    }

    /// Redelivery entry point for platform alarms that outlived the process.
    pub fn notify_platform_alarm_fired(&self, boundary_at_ms: i64) {
        self.scheduler.notify_platform_fired(boundary_at_ms);
    }

    /// Tear down the observer, scheduler, and engine.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self.observer.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.scheduler.cancel();
        self.engine.shutdown().await;
    }
}

struct Observer {
    engine: Arc<TimerEngine>,
    store: Arc<dyn TimerStore>,
    clock: Arc<dyn MonotonicClock>,
    scheduler: Arc<CountdownScheduler>,
    countdown_tx: broadcast::Sender<CountdownPulse>,
    lead_secs: u32,
    grace_ms: i64,
    tick_interval: Duration,
    ticker: Option<JoinHandle<()>>,
    /// Boundary (monotonic ms) the scheduler is currently armed for.
    scheduled_boundary_ms: Option<i64>,
    /// Boundary whose countdown pulse has already been emitted.
    countdown_started_boundary_ms: Option<i64>,
    /// Segment whose boundary the current arm refers to.
    armed_segment: Option<Segment>,
}

impl Observer {
    async fn run(
        mut self,
        mut states: watch::Receiver<TimerState>,
        mut events: broadcast::Receiver<TimerEvent>,
        mut wake_rx: mpsc::UnboundedReceiver<i64>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        // Replay the current state before waiting for changes.
        let current = states.borrow_and_update().clone();
        self.on_state(&current);

        loop {
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = states.borrow_and_update().clone();
                    self.on_state(&state);
                }
                event = events.recv() => {
                    match event {
                        Ok(event) => self.on_event(&event),
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            debug!(missed, "observer lagged behind engine events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                wake = wake_rx.recv() => {
                    let Some(boundary_at_ms) = wake else { break };
                    self.on_wake(boundary_at_ms);
                }
                _ = shutdown_rx.changed() => break,
            }
        }

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        self.scheduler.cancel();
        debug!("timer host observer stopped");
    }

    fn on_state(&mut self, state: &TimerState) {
        if let Err(err) = self.store.save_state(Some(state)) {
            warn!(%err, "failed to persist timer state");
        }

        let running = state.status() == RunStatus::Running;
        let ticker_alive = self.ticker.as_ref().is_some_and(|t| !t.is_finished());
        if running && !ticker_alive {
            self.ticker = Some(spawn_ticker(
                Arc::clone(&self.engine),
                Arc::clone(&self.clock),
                self.tick_interval,
            ));
        } else if !running {
            if let Some(ticker) = self.ticker.take() {
                ticker.abort();
            }
        }

        self.schedule_or_run_countdown(state);
    }

    fn on_event(&mut self, event: &TimerEvent) {
        match event {
            TimerEvent::BoundaryReached { .. }
            | TimerEvent::Completed
            | TimerEvent::Paused { .. }
            | TimerEvent::Stopped => self.reset_countdown(),
            TimerEvent::Resumed { .. } | TimerEvent::SkipRejected => {}
        }
    }

    /// Countdown scheduling tied to the upcoming boundary: inside the lead
    /// window the pulse starts immediately, farther out the scheduler is
    /// armed for `boundary - lead`, and anything else clears the arming.
    fn schedule_or_run_countdown(&mut self, state: &TimerState) {
        let (RunStatus::Running, Some(started_at)) =
            (state.status(), state.started_at_monotonic_ms())
        else {
            self.reset_countdown();
            return;
        };

        let boundary_sec = state.durations().cumulative_boundary_for(state.segment());
        let boundary_at_ms = started_at + i64::from(boundary_sec) * 1000;
        let trigger_at_ms = boundary_at_ms - i64::from(self.lead_secs) * 1000;
        let now = self.clock.now_ms();

        if state.remaining_in_segment_sec() > self.lead_secs {
            if trigger_at_ms <= now {
                self.armed_segment = Some(state.segment());
                self.start_countdown(boundary_at_ms);
            } else if self.scheduled_boundary_ms != Some(boundary_at_ms) {
                debug!(trigger_at_ms, boundary_at_ms, "arming countdown wake-up");
                self.armed_segment = Some(state.segment());
                self.scheduler.arm(trigger_at_ms, boundary_at_ms);
                self.scheduled_boundary_ms = Some(boundary_at_ms);
                self.countdown_started_boundary_ms = None;
            }
        } else if state.remaining_in_segment_sec() >= 1 {
            self.armed_segment = Some(state.segment());
            self.start_countdown(boundary_at_ms);
        } else {
            self.reset_countdown();
        }
    }

    fn on_wake(&mut self, boundary_at_ms: i64) {
        debug!(boundary_at_ms, "countdown wake fired");
        let now = self.clock.now_ms();
        if now >= boundary_at_ms {
            // Slept through the boundary; force elapsed time up to date
            // instead of waiting for the next periodic tick.
            if let Some(segment) = self.armed_segment {
                self.engine
                    .submit(TimerCommand::SegmentBoundary { segment, at_ms: now });
            }
        }
        self.start_countdown(boundary_at_ms);
    }

    fn start_countdown(&mut self, boundary_at_ms: i64) {
        if self.countdown_started_boundary_ms == Some(boundary_at_ms) {
            return;
        }
        let now = self.clock.now_ms();
        let Some(seconds_left) = self.countdown_seconds(boundary_at_ms, now) else {
            self.reset_countdown();
            return;
        };
        debug!(seconds_left, boundary_at_ms, "starting countdown feedback");
        self.scheduler.cancel();
        let _ = self.countdown_tx.send(CountdownPulse {
            seconds_left,
            boundary_at_ms,
        });
        self.countdown_started_boundary_ms = Some(boundary_at_ms);
        self.scheduled_boundary_ms = None;
    }

    fn countdown_seconds(&self, boundary_at_ms: i64, now_ms: i64) -> Option<u32> {
        let millis_left = boundary_at_ms - now_ms;
        if millis_left <= -self.grace_ms {
            debug!(
                delta_ms = millis_left,
                "boundary already passed; skipping countdown"
            );
            return None;
        }
        let remaining = millis_left.max(0);
        Some((((remaining + 999) / 1000) as u32).clamp(1, self.lead_secs.max(1)))
    }

    fn reset_countdown(&mut self) {
        self.scheduler.cancel();
        self.scheduled_boundary_ms = None;
        self.countdown_started_boundary_ms = None;
        self.armed_segment = None;
    }
}

fn spawn_ticker(
    engine: Arc<TimerEngine>,
    clock: Arc<dyn MonotonicClock>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick resolves immediately; the engine state is
        // already current at spawn time, so skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            engine.submit(TimerCommand::Tick {
                now_ms: clock.now_ms(),
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::model::Preset;
    use crate::time::ManualClock;
    use std::sync::Mutex as StdMutex;
    use tokio::time::timeout;

    #[derive(Default)]
    struct MemoryStore {
        presets: StdMutex<Vec<Preset>>,
        default_id: StdMutex<Option<String>>,
        state: StdMutex<Option<TimerState>>,
    }

    impl MemoryStore {
        fn with_presets(presets: Vec<Preset>) -> Self {
            Self {
                presets: StdMutex::new(presets),
                ..Self::default()
            }
        }
    }

    impl TimerStore for MemoryStore {
        fn load_presets(&self) -> Vec<Preset> {
            self.presets.lock().unwrap().clone()
        }

        fn save_presets(&self, presets: &[Preset]) -> Result<(), StorageError> {
            *self.presets.lock().unwrap() = presets.to_vec();
            Ok(())
        }

        fn save_preset(&self, preset: &Preset) -> Result<(), StorageError> {
            let mut presets = self.presets.lock().unwrap();
            match presets.iter_mut().find(|p| p.id() == preset.id()) {
                Some(slot) => *slot = preset.clone(),
                None => presets.push(preset.clone()),
            }
            Ok(())
        }

        fn delete_preset(&self, preset_id: &str) -> Result<(), StorageError> {
            self.presets.lock().unwrap().retain(|p| p.id() != preset_id);
            Ok(())
        }

        fn default_preset_id(&self) -> Option<String> {
            self.default_id.lock().unwrap().clone()
        }

        fn set_default_preset_id(&self, preset_id: Option<&str>) -> Result<(), StorageError> {
            *self.default_id.lock().unwrap() = preset_id.map(str::to_owned);
            Ok(())
        }

        fn load_last_state(&self) -> Option<TimerState> {
            self.state.lock().unwrap().clone()
        }

        fn save_state(&self, state: Option<&TimerState>) -> Result<(), StorageError> {
            *self.state.lock().unwrap() = state.cloned();
            Ok(())
        }

        fn clear_all(&self) -> Result<(), StorageError> {
            self.presets.lock().unwrap().clear();
            *self.default_id.lock().unwrap() = None;
            *self.state.lock().unwrap() = None;
            Ok(())
        }
    }

    fn test_preset() -> Preset {
        Preset::new("talk", "Talk", 60, 600, 60, true, false).unwrap()
    }

    async fn wait_for<F>(mut states: watch::Receiver<TimerState>, predicate: F) -> TimerState
    where
        F: Fn(&TimerState) -> bool,
    {
        timeout(Duration::from_secs(5), async move {
            loop {
                {
                    let state = states.borrow_and_update();
                    if predicate(&state) {
                        return state.clone();
                    }
                }
                states.changed().await.expect("state channel closed");
            }
        })
        .await
        .expect("timed out waiting for state")
    }

    #[tokio::test]
    async fn start_resolves_a_preset_and_runs() {
        let store = Arc::new(MemoryStore::with_presets(vec![test_preset()]));
        let clock = Arc::new(ManualClock::new(0));
        let host = TimerHost::spawn(store, clock, None, Config::default()).await;

        host.start("talk").unwrap();
        let state = wait_for(host.states(), |s| s.status() == RunStatus::Running).await;
        assert_eq!(state.segment(), Segment::Intro);
        assert_eq!(state.remaining_in_segment_sec(), 60);
        host.shutdown().await;
    }

    #[tokio::test]
    async fn starting_an_unknown_preset_errors() {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::new(0));
        let host = TimerHost::spawn(store, clock, None, Config::default()).await;

        assert!(matches!(
            host.start("missing"),
            Err(CoreError::UnknownPreset(_))
        ));
        host.shutdown().await;
    }

    #[tokio::test]
    async fn published_states_are_persisted() {
        let store = Arc::new(MemoryStore::with_presets(vec![test_preset()]));
        let clock = Arc::new(ManualClock::new(0));
        let host =
            TimerHost::spawn(Arc::clone(&store) as Arc<dyn TimerStore>, clock, None, Config::default())
                .await;

        host.start("talk").unwrap();
        wait_for(host.states(), |s| s.status() == RunStatus::Running).await;

        timeout(Duration::from_secs(5), async {
            loop {
                if store
                    .load_last_state()
                    .is_some_and(|s| s.status() == RunStatus::Running)
                {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("state never persisted");
        host.shutdown().await;
    }

    #[tokio::test]
    async fn interrupted_session_recovers_with_a_fresh_start() {
        let preset = test_preset();
        let interrupted = TimerState::new(
            RunStatus::Paused,
            Segment::Main,
            500,
            160,
            preset.durations(),
            None,
            Some(preset.to_meta()),
        )
        .unwrap();
        let store = Arc::new(MemoryStore::with_presets(vec![preset]));
        store.save_state(Some(&interrupted)).unwrap();

        let clock = Arc::new(ManualClock::new(1_000_000));
        let host = TimerHost::spawn(store, clock, None, Config::default()).await;

        // Recovery resubmits Start: the session is running again, re-derived
        // from a fresh anchor rather than the stale snapshot.
        let state = wait_for(host.states(), |s| s.status() == RunStatus::Running).await;
        assert_eq!(state.elapsed_total_sec(), 0);
        assert_eq!(state.started_at_monotonic_ms(), Some(1_000_000));
        host.shutdown().await;
    }

    #[tokio::test]
    async fn countdown_pulse_fires_inside_the_lead_window() {
        // Intro shorter than the lead window: the pulse is immediate.
        let preset = Preset::new("short", "Short", 5, 600, 60, true, false).unwrap();
        let store = Arc::new(MemoryStore::with_presets(vec![preset]));
        let clock = Arc::new(ManualClock::new(0));
        let host = TimerHost::spawn(store, clock, None, Config::default()).await;

        let mut pulses = host.countdowns();
        host.start("short").unwrap();

        let pulse = timeout(Duration::from_secs(5), pulses.recv())
            .await
            .expect("timed out")
            .expect("countdown channel closed");
        assert_eq!(pulse.seconds_left, 5);
        assert_eq!(pulse.boundary_at_ms, 5_000);
        host.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_advances_the_running_timer() {
        let store = Arc::new(MemoryStore::with_presets(vec![test_preset()]));
        let clock = Arc::new(ManualClock::new(0));
        let host = TimerHost::spawn(
            store,
            Arc::clone(&clock) as Arc<dyn MonotonicClock>,
            None,
            Config::default(),
        )
        .await;

        host.start("talk").unwrap();
        wait_for(host.states(), |s| s.status() == RunStatus::Running).await;

        clock.advance(2_000);
        let state = wait_for(host.states(), |s| s.elapsed_total_sec() >= 2).await;
        assert_eq!(state.segment(), Segment::Intro);
        host.shutdown().await;
    }

    #[tokio::test]
    async fn stop_returns_to_idle_and_persists_it() {
        let store = Arc::new(MemoryStore::with_presets(vec![test_preset()]));
        let clock = Arc::new(ManualClock::new(0));
        let host = TimerHost::spawn(
            Arc::clone(&store) as Arc<dyn TimerStore>,
            clock,
            None,
            Config::default(),
        )
        .await;

        host.start("talk").unwrap();
        wait_for(host.states(), |s| s.status() == RunStatus::Running).await;
        host.stop();
        wait_for(host.states(), |s| s.status() == RunStatus::Idle).await;

        timeout(Duration::from_secs(5), async {
            loop {
                if store
                    .load_last_state()
                    .is_some_and(|s| s.status() == RunStatus::Idle)
                {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("idle state never persisted");
        host.shutdown().await;
    }
}
