//! Restartable, pausable countdown used to auto-dismiss overlay entries.
//!
//! The countdown itself is a tokio task that only wakes the owner up: when
//! it elapses it calls the expiry hook with the arming generation, and the
//! owner then calls [`DecayTimer::confirm`] from its own context. Only a
//! confirmation for the current generation of a running timer counts as the
//! timer firing, so a stale wake-up can never fire a timer twice or fire one
//! that was reset in the meantime.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{Instant, sleep_until};

/// Per priority step added on top of the base decay time.
pub const PRIORITY_BONUS: Duration = Duration::from_millis(750);
/// Added for notifications the user cannot dismiss.
pub const NON_DISMISSIBLE_BONUS: Duration = Duration::from_millis(1000);

/// Called from the timer task with the generation that elapsed.
pub type ExpiryHook = Arc<dyn Fn(u64) + Send + Sync>;

/// Decay time of one entry. A zero base disables decay.
pub fn decay_duration(base: Duration, priority: i32, dismissible: bool) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let steps = u32::try_from(priority.max(0)).unwrap_or(0);
    let mut total = base.saturating_add(PRIORITY_BONUS.saturating_mul(steps));
    if !dismissible {
        total = total.saturating_add(NON_DISMISSIBLE_BONUS);
    }
    total
}

#[derive(Debug)]
enum Phase {
    Idle,
    Running { deadline: Instant, task: AbortHandle },
    Paused,
    Fired,
}

pub struct DecayTimer {
    duration: Duration,
    remaining: Duration,
    phase: Phase,
    generation: u64,
    on_expired: ExpiryHook,
}

impl fmt::Debug for DecayTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecayTimer")
            .field("duration", &self.duration)
            .field("remaining", &self.remaining())
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl DecayTimer {
    pub fn new(on_expired: ExpiryHook) -> Self {
        Self {
            duration: Duration::ZERO,
            remaining: Duration::ZERO,
            phase: Phase::Idle,
            generation: 0,
            on_expired,
        }
    }

    pub const fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub const fn has_fired(&self) -> bool {
        matches!(self.phase, Phase::Fired)
    }

    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Time left before firing, measured now for a running timer.
    pub fn remaining(&self) -> Duration {
        match &self.phase {
            Phase::Running { deadline, .. } => deadline.saturating_duration_since(Instant::now()),
            Phase::Idle | Phase::Paused | Phase::Fired => self.remaining,
        }
    }

    /// Configures the countdown. With `restart`, the remaining time goes
    /// back to `duration` even while running; otherwise a running countdown
    /// keeps its current deadline.
    pub fn set(&mut self, duration: Duration, restart: bool) {
        self.duration = duration;
        match self.phase {
            Phase::Running { .. } if restart => {
                self.remaining = duration;
                self.disarm();
                self.phase = Phase::Paused;
                self.resume();
            }
            Phase::Running { .. } => {}
            Phase::Paused if !restart => {}
            Phase::Idle | Phase::Paused | Phase::Fired => {
                self.remaining = duration;
                self.phase = Phase::Paused;
            }
        }
    }

    /// Starts or continues counting down. No effect while running, after
    /// firing, or when nothing remains.
    pub fn resume(&mut self) {
        if !matches!(self.phase, Phase::Paused) || self.remaining.is_zero() {
            return;
        }
        self.generation += 1;
        let generation = self.generation;
        let deadline = Instant::now() + self.remaining;
        let hook = Arc::clone(&self.on_expired);
        let task = tokio::spawn(async move {
            sleep_until(deadline).await;
            hook(generation);
        })
        .abort_handle();
        self.phase = Phase::Running { deadline, task };
    }

    /// Stops counting without losing the remaining time.
    pub fn pause(&mut self) {
        if let Phase::Running { deadline, .. } = &self.phase {
            self.remaining = deadline.saturating_duration_since(Instant::now());
            self.disarm();
            self.phase = Phase::Paused;
        }
    }

    /// Stops the timer and forgets the remaining time.
    pub fn clear(&mut self) {
        self.disarm();
        self.remaining = Duration::ZERO;
        self.phase = Phase::Idle;
    }

    /// Accepts an expiry reported by the hook. Returns `true` exactly once per
    /// arming, and only for the generation that is currently running.
    pub fn confirm(&mut self, generation: u64) -> bool {
        if !self.is_running() || generation != self.generation {
            return false;
        }
        self.disarm();
        self.remaining = Duration::ZERO;
        self.phase = Phase::Fired;
        true
    }

    fn disarm(&mut self) {
        if let Phase::Running { task, .. } = &self.phase {
            task.abort();
        }
    }
}

impl Drop for DecayTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
