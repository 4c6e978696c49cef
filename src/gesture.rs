//! Drag-to-dismiss resolution for a single draggable surface.
//!
//! A [`GestureResolver`] consumes raw touch samples and reports at most one
//! terminal outcome per gesture: the surface was swiped away
//! ([`GestureOutcome::Dismissed`]) or the drag was abandoned and the surface
//! should settle back ([`GestureOutcome::Cancelled`]).

use std::collections::VecDeque;
use std::time::Duration;

/// Fling speed, in density-independent pixels per second, above which a
/// release counts as a swipe regardless of distance.
pub const SWIPE_ESCAPE_VELOCITY: f32 = 100.0;
/// Fraction of the child's extent that a slow drag has to cover.
pub const DISMISS_FRACTION: f32 = 0.4;
const VELOCITY_WINDOW: Duration = Duration::from_millis(100);
const MAX_SAMPLES: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    /// Distance a pointer has to travel along the axis before a drag starts.
    pub touch_slop: f32,
    pub density_scale: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_slop: 16.0,
            density_scale: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Sign of the net translation at release.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Right or down.
    Positive,
    /// Left or up. Also the tie-break for a zero translation.
    Negative,
}

impl Direction {
    pub fn of(translation: f32) -> Self {
        if translation > 0.0 {
            Self::Positive
        } else {
            Self::Negative
        }
    }
}

/// Which way the surface may follow the finger.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Travel {
    #[default]
    Both,
    PositiveOnly,
    NegativeOnly,
}

impl Travel {
    fn clamp(self, translation: f32) -> f32 {
        match self {
            Self::Both => translation,
            Self::PositiveOnly => translation.max(0.0),
            Self::NegativeOnly => translation.min(0.0),
        }
    }

    /// Whether a fling at `velocity` heads the way the surface may travel.
    fn allows(self, velocity: f32) -> bool {
        match self {
            Self::Both => true,
            Self::PositiveOnly => velocity > 0.0,
            Self::NegativeOnly => velocity < 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub x: f32,
    pub y: f32,
    /// Event time on the producer's clock; only differences matter.
    pub time: Duration,
}

impl TouchEvent {
    pub const fn new(phase: TouchPhase, x: f32, y: f32, time: Duration) -> Self {
        Self { phase, x, y, time }
    }
}

/// What the resolver needs to know about the thing being dragged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwipeSubject {
    /// Consulted at release; a `false` vetoes any dismissal.
    pub dismissible: bool,
    /// Size of the child along the resolver's axis.
    pub extent: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureOutcome {
    /// The surface should be translated by this amount.
    Moved { translation: f32 },
    Dismissed { direction: Direction, translation: f32 },
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    Idle,
    Pressed { x: f32, y: f32 },
    Dragging { anchor: f32, translation: f32 },
}

#[derive(Debug)]
pub struct GestureResolver {
    axis: Axis,
    travel: Travel,
    config: GestureConfig,
    state: State,
    tracker: VelocityTracker,
}

impl GestureResolver {
    pub fn new(axis: Axis, config: GestureConfig) -> Self {
        Self {
            axis,
            travel: Travel::Both,
            config,
            state: State::Idle,
            tracker: VelocityTracker::default(),
        }
    }

    #[must_use]
    pub const fn with_travel(mut self, travel: Travel) -> Self {
        self.travel = travel;
        self
    }

    pub const fn set_travel(&mut self, travel: Travel) {
        self.travel = travel;
    }

    pub const fn is_dragging(&self) -> bool {
        matches!(self.state, State::Dragging { .. })
    }

    /// Drops any gesture in progress without reporting an outcome.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.tracker.clear();
    }

    fn along(&self, x: f32, y: f32) -> f32 {
        match self.axis {
            Axis::Horizontal => x,
            Axis::Vertical => y,
        }
    }

    fn escape_velocity(&self) -> f32 {
        SWIPE_ESCAPE_VELOCITY * self.config.density_scale
    }

    pub fn handle(&mut self, event: &TouchEvent, subject: &SwipeSubject) -> Option<GestureOutcome> {
        match event.phase {
            TouchPhase::Down => {
                self.tracker.clear();
                self.tracker.add(event);
                self.state = State::Pressed {
                    x: event.x,
                    y: event.y,
                };
                None
            }
            TouchPhase::Move => {
                self.tracker.add(event);
                let position = self.along(event.x, event.y);
                match self.state {
                    State::Idle => None,
                    State::Pressed { x, y } => {
                        let delta = position - self.along(x, y);
                        if delta.abs() <= self.config.touch_slop {
                            return None;
                        }
                        // Translation is measured from where the drag began,
                        // not from the initial press.
                        self.state = State::Dragging {
                            anchor: position,
                            translation: 0.0,
                        };
                        Some(GestureOutcome::Moved { translation: 0.0 })
                    }
                    State::Dragging { anchor, .. } => {
                        let translation = self.travel.clamp(position - anchor);
                        self.state = State::Dragging {
                            anchor,
                            translation,
                        };
                        Some(GestureOutcome::Moved { translation })
                    }
                }
            }
            TouchPhase::Up => {
                self.tracker.add(event);
                let state = std::mem::replace(&mut self.state, State::Idle);
                let State::Dragging { anchor, .. } = state else {
                    self.tracker.clear();
                    return None;
                };
                let translation = self.travel.clamp(self.along(event.x, event.y) - anchor);
                let (velocity, cross) = self.tracker.velocity(self.axis);
                self.tracker.clear();

                // A restricted surface pinned at rest has nowhere to fling to.
                let pinned = self.travel != Travel::Both && translation.abs() <= f32::EPSILON;
                let fast = velocity.abs() > self.escape_velocity()
                    && velocity.abs() > cross.abs()
                    && (velocity > 0.0) == (translation > 0.0)
                    && self.travel.allows(velocity)
                    && !pinned;
                let far = translation.abs() > DISMISS_FRACTION * subject.extent;

                if subject.dismissible && (fast || far) {
                    Some(GestureOutcome::Dismissed {
                        direction: Direction::of(translation),
                        translation,
                    })
                } else {
                    Some(GestureOutcome::Cancelled)
                }
            }
            TouchPhase::Cancel => {
                let state = std::mem::replace(&mut self.state, State::Idle);
                self.tracker.clear();
                matches!(state, State::Dragging { .. }).then_some(GestureOutcome::Cancelled)
            }
        }
    }
}

/// Estimates pointer velocity from the samples of the last
/// [`VELOCITY_WINDOW`].
#[derive(Debug, Default)]
struct VelocityTracker {
    samples: VecDeque<(Duration, f32, f32)>,
}

impl VelocityTracker {
    fn clear(&mut self) {
        self.samples.clear();
    }

    fn add(&mut self, event: &TouchEvent) {
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back((event.time, event.x, event.y));
    }

    /// Returns `(along, across)` in pixels per second.
    fn velocity(&self, axis: Axis) -> (f32, f32) {
        let Some(&(last_time, last_x, last_y)) = self.samples.back() else {
            return (0.0, 0.0);
        };
        let Some(&(first_time, first_x, first_y)) = self
            .samples
            .iter()
            .find(|(time, _, _)| last_time.saturating_sub(*time) <= VELOCITY_WINDOW)
        else {
            return (0.0, 0.0);
        };
        let elapsed = last_time.saturating_sub(first_time).as_secs_f32();
        if elapsed <= f32::EPSILON {
            return (0.0, 0.0);
        }
        let vx = (last_x - first_x) / elapsed;
        let vy = (last_y - first_y) / elapsed;
        match axis {
            Axis::Horizontal => (vx, vy),
            Axis::Vertical => (vy, vx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Axis, Direction, GestureConfig, GestureOutcome, GestureResolver, SwipeSubject, TouchEvent,
        TouchPhase, Travel,
    };
    use std::time::Duration;

    const SUBJECT: SwipeSubject = SwipeSubject {
        dismissible: true,
        extent: 400.0,
    };

    fn at(phase: TouchPhase, x: f32, ms: u64) -> TouchEvent {
        TouchEvent::new(phase, x, 10.0, Duration::from_millis(ms))
    }

    /// Feeds a horizontal drag and returns the outcome of the final event.
    fn drag(resolver: &mut GestureResolver, points: &[(f32, u64)], subject: &SwipeSubject) -> Option<GestureOutcome> {
        let (first, rest) = points.split_first()?;
        resolver.handle(&at(TouchPhase::Down, first.0, first.1), subject);
        let (last, moves) = rest.split_last()?;
        for (x, ms) in moves {
            resolver.handle(&at(TouchPhase::Move, *x, *ms), subject);
        }
        resolver.handle(&at(TouchPhase::Up, last.0, last.1), subject)
    }

    fn resolver() -> GestureResolver {
        GestureResolver::new(Axis::Horizontal, GestureConfig::default())
    }

    #[test]
    fn slow_long_drag_dismisses_toward_translation() {
        let mut resolver = resolver();
        let outcome = drag(
            &mut resolver,
            &[(0.0, 0), (20.0, 500), (120.0, 1000), (200.0, 1500), (200.0, 2000)],
            &SUBJECT,
        );
        assert_eq!(
            outcome,
            Some(GestureOutcome::Dismissed {
                direction: Direction::Positive,
                translation: 180.0,
            })
        );
    }

    #[test]
    fn short_fling_dismisses() {
        let mut resolver = resolver();
        let outcome = drag(&mut resolver, &[(300.0, 0), (270.0, 10), (240.0, 20), (220.0, 30)], &SUBJECT);
        assert!(matches!(
            outcome,
            Some(GestureOutcome::Dismissed {
                direction: Direction::Negative,
                ..
            })
        ));
    }

    #[test]
    fn short_slow_drag_is_cancelled() {
        let mut resolver = resolver();
        let outcome = drag(&mut resolver, &[(0.0, 0), (20.0, 400), (60.0, 800), (60.0, 1200)], &SUBJECT);
        assert_eq!(outcome, Some(GestureOutcome::Cancelled));
        assert!(!resolver.is_dragging());
    }

    #[test]
    fn non_dismissible_subject_vetoes() {
        let mut resolver = resolver();
        let subject = SwipeSubject {
            dismissible: false,
            ..SUBJECT
        };
        let outcome = drag(&mut resolver, &[(0.0, 0), (20.0, 100), (390.0, 200), (390.0, 300)], &subject);
        assert_eq!(outcome, Some(GestureOutcome::Cancelled));
    }

    #[test]
    fn fling_against_translation_is_not_fast() {
        let mut resolver = resolver();
        // Dragged right, then flicked back left before release.
        let outcome = drag(
            &mut resolver,
            &[(0.0, 0), (20.0, 300), (120.0, 600), (110.0, 1000), (80.0, 1010)],
            &SUBJECT,
        );
        assert_eq!(outcome, Some(GestureOutcome::Cancelled));
    }

    #[test]
    fn tap_below_slop_reports_nothing() {
        let mut resolver = resolver();
        assert_eq!(resolver.handle(&at(TouchPhase::Down, 50.0, 0), &SUBJECT), None);
        assert_eq!(resolver.handle(&at(TouchPhase::Move, 55.0, 10), &SUBJECT), None);
        assert_eq!(resolver.handle(&at(TouchPhase::Up, 55.0, 20), &SUBJECT), None);
    }

    #[test]
    fn zero_translation_fling_falls_back_to_negative() {
        let mut resolver = resolver();
        let outcome = drag(&mut resolver, &[(120.0, 0), (100.0, 10), (100.0, 20)], &SUBJECT);
        assert_eq!(
            outcome,
            Some(GestureOutcome::Dismissed {
                direction: Direction::Negative,
                translation: 0.0,
            })
        );
    }

    #[test]
    fn cancel_mid_drag_reports_once() {
        let mut resolver = resolver();
        resolver.handle(&at(TouchPhase::Down, 0.0, 0), &SUBJECT);
        assert_eq!(
            resolver.handle(&at(TouchPhase::Move, 30.0, 10), &SUBJECT),
            Some(GestureOutcome::Moved { translation: 0.0 })
        );
        assert_eq!(
            resolver.handle(&at(TouchPhase::Move, 50.0, 20), &SUBJECT),
            Some(GestureOutcome::Moved { translation: 20.0 })
        );
        assert_eq!(
            resolver.handle(&at(TouchPhase::Cancel, 50.0, 30), &SUBJECT),
            Some(GestureOutcome::Cancelled)
        );
        assert_eq!(resolver.handle(&at(TouchPhase::Cancel, 50.0, 40), &SUBJECT), None);
    }

    #[test]
    fn vertical_travel_is_clamped() {
        let mut resolver =
            GestureResolver::new(Axis::Vertical, GestureConfig::default()).with_travel(Travel::NegativeOnly);
        let subject = SwipeSubject {
            dismissible: true,
            extent: 200.0,
        };
        let ev = |phase, y: f32, ms: u64| TouchEvent::new(phase, 0.0, y, Duration::from_millis(ms));
        resolver.handle(&ev(TouchPhase::Down, 100.0, 0), &subject);
        resolver.handle(&ev(TouchPhase::Move, 130.0, 200), &subject);
        assert_eq!(
            resolver.handle(&ev(TouchPhase::Move, 250.0, 400), &subject),
            Some(GestureOutcome::Moved { translation: 0.0 })
        );
        assert_eq!(
            resolver.handle(&ev(TouchPhase::Up, 250.0, 800), &subject),
            Some(GestureOutcome::Cancelled)
        );
    }

    #[test]
    fn fling_against_allowed_travel_is_cancelled() {
        let mut resolver =
            GestureResolver::new(Axis::Vertical, GestureConfig::default()).with_travel(Travel::PositiveOnly);
        let subject = SwipeSubject {
            dismissible: true,
            extent: 96.0,
        };
        let ev = |phase, y: f32, ms: u64| TouchEvent::new(phase, 0.0, y, Duration::from_millis(ms));
        resolver.handle(&ev(TouchPhase::Down, 0.0, 0), &subject);
        resolver.handle(&ev(TouchPhase::Move, -30.0, 10), &subject);
        resolver.handle(&ev(TouchPhase::Move, -90.0, 20), &subject);
        assert_eq!(
            resolver.handle(&ev(TouchPhase::Up, -140.0, 30), &subject),
            Some(GestureOutcome::Cancelled)
        );

        resolver.handle(&ev(TouchPhase::Down, 0.0, 100), &subject);
        resolver.handle(&ev(TouchPhase::Move, 30.0, 110), &subject);
        resolver.handle(&ev(TouchPhase::Move, 90.0, 120), &subject);
        assert_eq!(
            resolver.handle(&ev(TouchPhase::Up, 140.0, 130), &subject),
            Some(GestureOutcome::Dismissed {
                direction: Direction::Positive,
                translation: 110.0,
            })
        );
    }
}
