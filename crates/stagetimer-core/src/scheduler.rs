//! Countdown wake-up scheduling.
//!
//! Guarantees a wake-up no earlier than the configured lead window before the
//! next segment boundary, preferring a platform alarm that survives process
//! death and falling back to an in-process timer when that privilege is
//! unavailable or denied.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AlarmError;
use crate::time::MonotonicClock;

/// Platform precise-and-wake-while-idle alarm primitive.
///
/// Implementations address the alarm by a durable identity so a fire can be
/// redelivered to a fresh process instance, which then re-enters through
/// [`CountdownScheduler::notify_platform_fired`].
pub trait WakeAlarm: Send + Sync {
    /// Schedule a single wake-up at `trigger_at_ms` carrying `boundary_at_ms`.
    fn schedule(&self, trigger_at_ms: i64, boundary_at_ms: i64) -> Result<(), AlarmError>;

    /// Clear any pending wake-up; idempotent.
    fn cancel(&self);
}

/// Whether precise wake-ups are backed by the platform alarm or by the
/// best-effort in-process fallback. Consumers can prompt for the missing
/// privilege when this reads `Degraded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmCapability {
    Exact,
    Degraded,
}

struct Armed {
    boundary_at_ms: i64,
    fallback: Option<JoinHandle<()>>,
    platform: bool,
}

type FireCallback = Arc<dyn Fn(i64) + Send + Sync>;

/// Schedules exactly one wake-up at a time and fires a callback with the
/// boundary it was armed for.
pub struct CountdownScheduler {
    clock: Arc<dyn MonotonicClock>,
    platform: Option<Arc<dyn WakeAlarm>>,
    on_fire: FireCallback,
    capability_tx: watch::Sender<AlarmCapability>,
    armed: Arc<Mutex<Option<Armed>>>,
}

fn lock(slot: &Mutex<Option<Armed>>) -> MutexGuard<'_, Option<Armed>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CountdownScheduler {
    pub fn new(
        clock: Arc<dyn MonotonicClock>,
        platform: Option<Arc<dyn WakeAlarm>>,
        on_fire: impl Fn(i64) + Send + Sync + 'static,
    ) -> Self {
        let initial = if platform.is_some() {
            AlarmCapability::Exact
        } else {
            AlarmCapability::Degraded
        };
        let (capability_tx, _) = watch::channel(initial);
        Self {
            clock,
            platform,
            on_fire: Arc::new(on_fire),
            capability_tx,
            armed: Arc::new(Mutex::new(None)),
        }
    }

    /// Current wake-up capability; updated whenever arming succeeds or
    /// degrades.
    pub fn capability(&self) -> watch::Receiver<AlarmCapability> {
        self.capability_tx.subscribe()
    }

    /// Schedule exactly one wake-up. A trigger already in the past fires the
    /// callback synchronously instead of scheduling. Re-arming for the
    /// boundary already armed is a no-op.
    pub fn arm(&self, trigger_at_ms: i64, boundary_at_ms: i64) {
        let mut armed = lock(&self.armed);
        if armed
            .as_ref()
            .is_some_and(|a| a.boundary_at_ms == boundary_at_ms)
        {
            return;
        }
        clear(&mut armed, self.platform.as_deref());

        let now = self.clock.now_ms();
        if trigger_at_ms <= now {
            drop(armed);
            (self.on_fire)(boundary_at_ms);
            return;
        }

        if let Some(platform) = &self.platform {
            match platform.schedule(trigger_at_ms, boundary_at_ms) {
                Ok(()) => {
                    self.capability_tx.send_replace(AlarmCapability::Exact);
                    *armed = Some(Armed {
                        boundary_at_ms,
                        fallback: None,
                        platform: true,
                    });
                    debug!(trigger_at_ms, boundary_at_ms, "armed platform wake alarm");
                    return;
                }
                Err(err) => {
                    warn!(%err, "platform wake alarm unavailable; using in-process fallback");
                }
            }
        }

        self.capability_tx.send_replace(AlarmCapability::Degraded);
        let delay = Duration::from_millis((trigger_at_ms - now) as u64);
        let on_fire = Arc::clone(&self.on_fire);
        let slot = Arc::clone(&self.armed);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut armed = lock(&slot);
                match armed.as_ref() {
                    Some(a) if a.boundary_at_ms == boundary_at_ms => *armed = None,
                    // Re-armed or cancelled while sleeping.
                    _ => return,
                }
            }
            on_fire(boundary_at_ms);
        });
        *armed = Some(Armed {
            boundary_at_ms,
            fallback: Some(handle),
            platform: false,
        });
        debug!(
            trigger_at_ms,
            boundary_at_ms, "armed in-process fallback timer"
        );
    }

    /// Clear any pending wake-up; idempotent.
    pub fn cancel(&self) {
        let mut armed = lock(&self.armed);
        clear(&mut armed, self.platform.as_deref());
    }

    /// Entry point for a platform alarm delivery, possibly arriving in a
    /// fresh process where no in-memory arming exists.
    pub fn notify_platform_fired(&self, boundary_at_ms: i64) {
        {
            let mut armed = lock(&self.armed);
            *armed = None;
        }
        (self.on_fire)(boundary_at_ms);
    }
}

fn clear(armed: &mut Option<Armed>, platform: Option<&dyn WakeAlarm>) {
    if let Some(previous) = armed.take() {
        if let Some(handle) = previous.fallback {
            handle.abort();
        }
        if previous.platform {
            if let Some(platform) = platform {
                platform.cancel();
            }
        }
    }
}
