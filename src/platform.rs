//! Interfaces the engine consumes from its host.
//!
//! Producers (`Feed`, `SignalSource`, `SettingsSource`) are handed an
//! [`EngineHandle`] on subscription and deliver everything through it; they
//! never call into the engine directly. The engine calls back into the feed
//! and drives the [`Surface`] from its control context only.

use std::fmt::{self, Display};

use tokio::time::Instant;

use crate::config::OverlaySettings;
use crate::error::{FeedError, SurfaceError};
use crate::notification::{Color, NotificationKey};
use crate::overlay::{Command, EngineHandle};

pub use crate::notification::AssetSource;

pub trait Feed: Send + Sync {
    fn subscribe(&self, engine: EngineHandle);
    fn unsubscribe(&self);

    /// Removes the notification from the system.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`] when the feed cannot be reached.
    fn dismiss(&self, key: &NotificationKey) -> Result<(), FeedError>;

    /// Fires the notification's content intent.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`] when the feed cannot be reached.
    fn click(&self, key: &NotificationKey) -> Result<(), FeedError>;

    /// Fires the intent of action button `action`.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`] when the feed cannot be reached.
    fn send_action(&self, key: &NotificationKey, action: usize) -> Result<(), FeedError>;
}

/// Source of the "suppress" and "allow" signals.
pub trait SignalSource: Send + Sync {
    fn subscribe(&self, engine: EngineHandle);
    fn unsubscribe(&self);
}

/// Persisted overlay settings and their change notifications.
pub trait SettingsSource: Send + Sync {
    fn snapshot(&self) -> OverlaySettings;
    fn subscribe(&self, engine: EngineHandle);
    fn unsubscribe(&self);
}

/// Monotonic milliseconds. Zero means the clock is unavailable.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Counts from 1 at construction, on the tokio clock.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        elapsed.saturating_add(1)
    }
}

/// Identifies one slot of the overlay container.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SlotId(pub u64);

impl Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

impl Extent {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// What one entry slot displays.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryView {
    pub key: NotificationKey,
    pub title: Option<String>,
    pub message: Option<String>,
    pub message_lines: Vec<String>,
    pub info: Option<String>,
    pub actions: Vec<String>,
    pub has_icon: bool,
    pub brand_color: Color,
    pub number: u32,
    pub dismissible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SlotContent {
    Entry(EntryView),
    /// Empty space keeping the layout steady while a removal animates.
    Placeholder { height: f32 },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Gravity {
    Top,
    Bottom,
}

/// How the overlay is attached to the display.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LayoutParams {
    pub gravity: Gravity,
    pub full_width: bool,
    pub focusable: bool,
    pub watch_outside_touch: bool,
}

impl LayoutParams {
    pub const fn overlay(show_at_top: bool) -> Self {
        Self {
            gravity: if show_at_top { Gravity::Top } else { Gravity::Bottom },
            full_width: true,
            focusable: false,
            watch_outside_touch: true,
        }
    }
}

/// What a translation applies to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranslateTarget {
    Slot(SlotId),
    Overlay,
}

/// Completion callback of an exit animation. Dropping it without calling
/// [`AnimationDone::finish`] leaves the overlay attached.
#[derive(Debug)]
pub struct AnimationDone {
    token: u64,
    engine: EngineHandle,
}

impl AnimationDone {
    pub(crate) const fn new(token: u64, engine: EngineHandle) -> Self {
        Self { token, engine }
    }

    pub const fn token(&self) -> u64 {
        self.token
    }

    pub fn finish(self) {
        if let Err(err) = self.engine.send(Command::ExitAnimationFinished { token: self.token }) {
            tracing::debug!(token = self.token, error = %err, "exit animation finished after shutdown");
        }
    }
}

/// The overlay window.
pub trait Surface: Send {
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] when the display refuses the window.
    fn attach(&mut self, params: &LayoutParams) -> Result<(), SurfaceError>;
    fn detach(&mut self);

    fn insert(&mut self, position: usize, slot: SlotId, content: &SlotContent);
    fn update(&mut self, slot: SlotId, content: &SlotContent);
    fn remove(&mut self, slot: SlotId);
    fn clear(&mut self);

    fn measure(&self, slot: SlotId) -> Extent;
    fn overlay_extent(&self) -> Extent;
    fn translate(&mut self, target: TranslateTarget, offset: f32);

    fn play_exit_animation(&mut self, done: AnimationDone);
    fn cancel_exit_animation(&mut self);

    fn is_screen_on(&self) -> bool {
        true
    }
}

/// Allocates a fresh surface on every engine start.
pub type SurfaceFactory = Box<dyn FnMut() -> Box<dyn Surface> + Send>;

#[cfg(test)]
mod tests {
    use super::{Clock, Gravity, LayoutParams, MonotonicClock, SlotId};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn monotonic_clock_never_reads_zero() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.now_ms(), 1);
        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(clock.now_ms(), 251);
    }

    #[test]
    fn layout_follows_position() {
        assert_eq!(LayoutParams::overlay(false).gravity, Gravity::Bottom);
        assert!(LayoutParams::overlay(true).watch_outside_touch);
        assert_eq!(SlotId(4).to_string(), "slot-4");
    }
}
