use std::time::Duration;

/// Longest time an external "disallow" signal can block admission without a
/// matching "allow".
pub const MAX_SUPPRESS_DURATION: Duration = Duration::from_secs(10 * 60);

/// Temporary admission block started by an external signal.
///
/// Timestamps are milliseconds on the engine clock. A clock reading of zero
/// means the clock is unavailable; admission is then always permitted.
#[derive(Clone, Copy, Debug)]
pub struct SuppressionWindow {
    started_at: Option<u64>,
    max: Duration,
}

impl Default for SuppressionWindow {
    fn default() -> Self {
        Self::new(MAX_SUPPRESS_DURATION)
    }
}

impl SuppressionWindow {
    pub const fn new(max: Duration) -> Self {
        Self {
            started_at: None,
            max,
        }
    }

    pub const fn begin(&mut self, now_ms: u64) {
        self.started_at = Some(now_ms);
    }

    pub const fn clear(&mut self) {
        self.started_at = None;
    }

    pub const fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// Whether admission is allowed at `now_ms`. An expired window is
    /// cleared as a side effect.
    pub fn permits(&mut self, now_ms: u64) -> bool {
        let Some(started_at) = self.started_at else {
            return true;
        };
        if now_ms == 0 {
            return true;
        }
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        if now_ms.saturating_sub(started_at) < max_ms {
            return false;
        }
        self.started_at = None;
        true
    }
}
