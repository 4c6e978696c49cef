use std::time::Duration;

use tracing::warn;

use crate::decay::{DecayTimer, decay_duration};
use crate::gesture::{
    Direction, GestureOutcome, GestureResolver, SwipeSubject, TouchEvent, TouchPhase,
};
use crate::notification::{ListenerId, NotificationEntity, NotificationKey};
use crate::platform::{SlotContent, SlotId};

/// What a touch on an entry asks the engine to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum EntryOutcome {
    Idle,
    Moved(f32),
    /// Drag abandoned; the entry goes back to rest.
    Settled,
    Swiped(Direction),
}

/// One notification bound to one slot, with its decay timer and
/// horizontal swipe resolver.
#[derive(Debug)]
pub(crate) struct OverlayEntry {
    slot: SlotId,
    entity: NotificationEntity,
    timer: DecayTimer,
    swipe: GestureResolver,
    listener: ListenerId,
}

impl OverlayEntry {
    pub(crate) const fn new(
        slot: SlotId,
        entity: NotificationEntity,
        timer: DecayTimer,
        swipe: GestureResolver,
        listener: ListenerId,
    ) -> Self {
        Self {
            slot,
            entity,
            timer,
            swipe,
            listener,
        }
    }

    pub(crate) const fn slot(&self) -> SlotId {
        self.slot
    }

    pub(crate) const fn key(&self) -> &NotificationKey {
        self.entity.key()
    }

    pub(crate) const fn entity(&self) -> &NotificationEntity {
        &self.entity
    }

    pub(crate) const fn entity_mut(&mut self) -> &mut NotificationEntity {
        &mut self.entity
    }

    pub(crate) fn decay_remaining(&self) -> Duration {
        self.timer.remaining()
    }

    pub(crate) const fn is_decaying(&self) -> bool {
        self.timer.is_running()
    }

    /// Restarts the countdown for the current content. A zero base
    /// disables decay.
    pub(crate) fn reset_decay(&mut self, base: Duration) {
        let duration = decay_duration(base, self.entity.priority(), self.entity.is_dismissible());
        if duration.is_zero() {
            self.timer.clear();
            return;
        }
        self.timer.set(duration, true);
        self.timer.resume();
    }

    pub(crate) fn confirm_decay(&mut self, generation: u64) -> bool {
        self.timer.confirm(generation)
    }

    /// Feeds one touch sample. The countdown is held while the finger is
    /// down and starts over on release.
    pub(crate) fn on_touch(&mut self, event: &TouchEvent, width: f32, base: Duration) -> EntryOutcome {
        if matches!(event.phase, TouchPhase::Down | TouchPhase::Move) {
            self.timer.pause();
        }
        let subject = SwipeSubject {
            dismissible: self.entity.is_dismissible(),
            extent: width,
        };
        match self.swipe.handle(event, &subject) {
            Some(GestureOutcome::Moved { translation }) => EntryOutcome::Moved(translation),
            Some(GestureOutcome::Dismissed {
                direction,
                translation,
            }) => {
                if translation.abs() <= f32::EPSILON {
                    warn!(key = %self.key(), "swipe direction undetectable; assuming left");
                }
                EntryOutcome::Swiped(direction)
            }
            Some(GestureOutcome::Cancelled) => {
                self.reset_decay(base);
                EntryOutcome::Settled
            }
            None => {
                if matches!(event.phase, TouchPhase::Up | TouchPhase::Cancel) {
                    self.reset_decay(base);
                }
                EntryOutcome::Idle
            }
        }
    }

    /// Ends the current gesture unresolved and starts the countdown over.
    /// Returns whether the entry had been dragged off its rest position.
    pub(crate) fn abandon_touch(&mut self, base: Duration) -> bool {
        let dragging = self.swipe.is_dragging();
        self.swipe.reset();
        self.reset_decay(base);
        dragging
    }

    pub(crate) fn content(&self) -> SlotContent {
        SlotContent::Entry(self.entity.view())
    }

    /// Stops the timer and cancels the entity's background work.
    pub(crate) fn release(mut self) {
        self.timer.clear();
        self.swipe.reset();
        self.entity.unregister_listener(self.listener);
        self.entity.recycle();
    }
}

#[cfg(test)]
mod tests {
    use super::{EntryOutcome, OverlayEntry};
    use crate::decay::DecayTimer;
    use crate::gesture::{Axis, Direction, GestureConfig, GestureResolver, TouchEvent, TouchPhase};
    use crate::notification::{IdentityScheme, NotificationEntity, RawNotification};
    use crate::platform::SlotId;
    use std::sync::Arc;
    use std::time::Duration;

    const BASE: Duration = Duration::from_millis(2000);

    fn entry(raw: RawNotification) -> OverlayEntry {
        OverlayEntry::new(
            SlotId(1),
            NotificationEntity::new_instance(IdentityScheme::SourceKey, raw),
            DecayTimer::new(Arc::new(|_| {})),
            GestureResolver::new(Axis::Horizontal, GestureConfig::default()),
            0,
        )
    }

    fn touch(phase: TouchPhase, x: f32, ms: u64) -> TouchEvent {
        TouchEvent::new(phase, x, 0.0, Duration::from_millis(ms))
    }

    #[tokio::test(start_paused = true)]
    async fn decay_includes_priority_and_sticky_bonus() {
        let mut raw = RawNotification::new("com.example", 1);
        raw.priority = 1;
        raw.ongoing = true;
        let mut entry = entry(raw);
        entry.reset_decay(BASE);
        assert!(entry.is_decaying());
        assert_eq!(entry.decay_remaining(), Duration::from_millis(3750));

        entry.reset_decay(Duration::ZERO);
        assert!(!entry.is_decaying());
    }

    #[tokio::test(start_paused = true)]
    async fn touch_holds_decay_until_release() {
        let mut entry = entry(RawNotification::new("com.example", 1));
        entry.reset_decay(BASE);
        tokio::time::advance(Duration::from_millis(500)).await;

        assert_eq!(entry.on_touch(&touch(TouchPhase::Down, 10.0, 0), 400.0, BASE), EntryOutcome::Idle);
        assert!(!entry.is_decaying());
        assert_eq!(entry.decay_remaining(), Duration::from_millis(1500));

        assert_eq!(entry.on_touch(&touch(TouchPhase::Up, 10.0, 50), 400.0, BASE), EntryOutcome::Idle);
        assert!(entry.is_decaying());
        assert_eq!(entry.decay_remaining(), BASE);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_touch_restarts_decay() {
        let mut entry = entry(RawNotification::new("com.example", 1));
        entry.reset_decay(BASE);
        entry.on_touch(&touch(TouchPhase::Down, 0.0, 0), 400.0, BASE);
        entry.on_touch(&touch(TouchPhase::Move, 30.0, 10), 400.0, BASE);
        tokio::time::advance(Duration::from_millis(800)).await;
        assert!(!entry.is_decaying());

        assert!(entry.abandon_touch(BASE));
        assert!(entry.is_decaying());
        assert_eq!(entry.decay_remaining(), BASE);
        assert!(!entry.abandon_touch(BASE));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_swipe_reports_direction() {
        let mut entry = entry(RawNotification::new("com.example", 1));
        entry.on_touch(&touch(TouchPhase::Down, 0.0, 0), 400.0, BASE);
        assert_eq!(
            entry.on_touch(&touch(TouchPhase::Move, 30.0, 10), 400.0, BASE),
            EntryOutcome::Moved(0.0)
        );
        entry.on_touch(&touch(TouchPhase::Move, 90.0, 20), 400.0, BASE);
        assert_eq!(
            entry.on_touch(&touch(TouchPhase::Up, 140.0, 30), 400.0, BASE),
            EntryOutcome::Swiped(Direction::Positive)
        );
    }
}
