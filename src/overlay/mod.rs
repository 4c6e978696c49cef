//! The overlay engine.
//!
//! One [`Engine`] owns every piece of mutable overlay state and is driven by
//! a single control loop draining its command queue. Feed events, signals,
//! setting changes, touches, timer expiries, asset results and animation
//! completions all arrive as [`Command`]s through an [`EngineHandle`].

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::Result;
use crate::config::{Config, OverlaySettings, invalid};
use crate::decay::DecayTimer;
use crate::error::Error;
use crate::gesture::{
    Axis, Direction, GestureOutcome, GestureResolver, SwipeSubject, TouchEvent, TouchPhase, Travel,
};
use crate::lifecycle::Lifecycle;
use crate::notification::{
    AssetSource, AssetUpdate, BrandColorCache, DataEvent, IdentityScheme, LoadContext,
    NotificationEntity, NotificationKey, RawNotification,
};
use crate::platform::{
    AnimationDone, Clock, Feed, LayoutParams, SettingsSource, SignalSource, SlotContent, SlotId,
    Surface, SurfaceFactory, TranslateTarget,
};
use crate::suppression::SuppressionWindow;
use crate::types::{SettingChange, SettingKey, SwipeAction};

mod command;
mod entry;
mod layout;

pub use command::{Command, EngineHandle, FeedEvent, TouchTarget};

use entry::{EntryOutcome, OverlayEntry};
use layout::{Layout, SlotKind};

/// How long a removed entry's placeholder keeps its height.
pub const LAYOUT_ANIMATION_TIME: Duration = Duration::from_millis(300);

/// Host services the engine is built from.
pub struct Collaborators {
    pub feed: Arc<dyn Feed>,
    pub signals: Arc<dyn SignalSource>,
    pub settings: Arc<dyn SettingsSource>,
    pub surfaces: SurfaceFactory,
    pub assets: Arc<dyn AssetSource>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Break,
}

/// Observable engine state, for hosts and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineState {
    pub started: bool,
    pub shown: bool,
    pub attached: bool,
    pub suppressed: bool,
    pub slots: Vec<SlotState>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SlotState {
    Entry {
        slot: SlotId,
        key: NotificationKey,
        read: bool,
        decaying: bool,
        decay_remaining: Duration,
    },
    Placeholder {
        slot: SlotId,
        height: f32,
    },
}

impl EngineState {
    pub fn entry_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, SlotState::Entry { .. }))
            .count()
    }

    pub fn entry_slot(&self, key: &NotificationKey) -> Option<SlotId> {
        self.slots.iter().find_map(|slot| match slot {
            SlotState::Entry { slot, key: entry, .. } if entry == key => Some(*slot),
            _ => None,
        })
    }
}

const fn overlay_travel(show_at_top: bool) -> Travel {
    if show_at_top {
        Travel::NegativeOnly
    } else {
        Travel::PositiveOnly
    }
}

/// State that only exists while the engine is started.
struct Session {
    surface: Box<dyn Surface>,
    settings: OverlaySettings,
    visibility: Lifecycle,
    attached: bool,
    pending_exit: Option<u64>,
    layout: Layout<OverlayEntry>,
    /// Views of entries already released but still drawn by the exit
    /// animation.
    leaving: Vec<SlotId>,
    overlay_swipe: GestureResolver,
    interactive_after: Option<Instant>,
}

impl Session {
    fn new(surface: Box<dyn Surface>, settings: OverlaySettings) -> Self {
        let overlay_swipe = GestureResolver::new(Axis::Vertical, settings.gesture)
            .with_travel(overlay_travel(settings.show_at_top));
        Self {
            surface,
            settings,
            visibility: Lifecycle::new(),
            attached: false,
            pending_exit: None,
            layout: Layout::default(),
            leaving: Vec::new(),
            overlay_swipe,
            interactive_after: None,
        }
    }

    fn show(&mut self) {
        if self.pending_exit.take().is_some() {
            // Still attached and animating out: bring it back instead.
            self.surface.cancel_exit_animation();
            for slot in self.leaving.drain(..) {
                self.surface.remove(slot);
            }
            if self.visibility.activate() {
                debug!("overlay exit cancelled");
            }
            return;
        }
        if !self.visibility.activate() {
            return;
        }
        debug_assert!(!self.attached, "overlay surface attached twice");
        match self.surface.attach(&LayoutParams::overlay(self.settings.show_at_top)) {
            Ok(()) => {
                self.attached = true;
                debug!("overlay shown");
            }
            Err(err) => {
                error!(error = %err, "failed to attach overlay");
                let _ = self.visibility.deactivate();
                self.finish_hide();
            }
        }
    }

    fn hide(&mut self, immediately: bool, done: AnimationDone) {
        if !self.visibility.deactivate() {
            if immediately && self.pending_exit.is_some() {
                self.surface.cancel_exit_animation();
                self.finish_hide();
            }
            return;
        }
        if immediately || !self.attached {
            self.finish_hide();
            return;
        }
        debug!(token = done.token(), "overlay hiding");
        self.pending_exit = Some(done.token());
        self.surface.play_exit_animation(done);
    }

    /// Detaches and drops every entry and all pending per-entry work.
    fn finish_hide(&mut self) {
        self.pending_exit = None;
        if self.attached {
            self.surface.detach();
            self.attached = false;
        }
        self.surface.clear();
        self.leaving.clear();
        for entry in self.layout.clear() {
            entry.release();
        }
        self.overlay_swipe.reset();
        self.interactive_after = None;
        debug!("overlay hidden");
    }

    fn prevent_instant_interactivity(&mut self) {
        self.interactive_after = Some(Instant::now() + self.settings.touch_sensitivity_delay);
    }

    fn is_interactive(&self) -> bool {
        self.interactive_after.is_none_or(|after| Instant::now() >= after)
    }

    /// Lets go of a gesture that started before the sensitivity delay.
    fn abandon_touch(&mut self, target: TouchTarget) {
        match target {
            TouchTarget::Entry(slot) => {
                let base = self.settings.decay_time;
                let moved = self
                    .layout
                    .entry_mut(slot)
                    .is_some_and(|entry| entry.abandon_touch(base));
                if moved {
                    self.surface.translate(TranslateTarget::Slot(slot), 0.0);
                }
            }
            TouchTarget::Overlay => {
                if self.overlay_swipe.is_dragging() {
                    self.surface.translate(TranslateTarget::Overlay, 0.0);
                }
                self.overlay_swipe.reset();
            }
        }
    }

    fn refresh(&mut self, slot: SlotId) {
        if let Some(entry) = self.layout.entry_mut(slot) {
            let content = entry.content();
            self.surface.update(slot, &content);
        }
    }
}

pub struct Engine {
    feed: Arc<dyn Feed>,
    signals: Arc<dyn SignalSource>,
    settings: Arc<dyn SettingsSource>,
    surfaces: SurfaceFactory,
    clock: Arc<dyn Clock>,
    scheme: IdentityScheme,
    load_ctx: LoadContext,
    handle: EngineHandle,
    rx: Receiver<Command>,
    lifecycle: Lifecycle,
    suppression: SuppressionWindow,
    session: Option<Session>,
    next_slot: u64,
    next_exit_token: u64,
}

impl Engine {
    pub fn new(config: &Config, parts: Collaborators) -> (Self, EngineHandle) {
        let (handle, rx) = EngineHandle::channel(config.identity);
        let sink_handle = handle.clone();
        let load_ctx = LoadContext {
            own_package: config.own_package.clone(),
            emoticons: config.overlay.emoticons,
            assets: parts.assets,
            brand_colors: BrandColorCache::new(config.brand_color_cache_size),
            sink: Arc::new(move |update| {
                if let Err(err) = sink_handle.send(Command::Asset(update)) {
                    trace!(error = %err, "asset result after shutdown");
                }
            }),
        };
        let engine = Self {
            feed: parts.feed,
            signals: parts.signals,
            settings: parts.settings,
            surfaces: parts.surfaces,
            clock: parts.clock,
            scheme: config.identity,
            load_ctx,
            handle: handle.clone(),
            rx,
            lifecycle: Lifecycle::new(),
            suppression: SuppressionWindow::default(),
            session: None,
            next_slot: 0,
            next_exit_token: 0,
        };
        (engine, handle)
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Drains the command queue until [`Command::Shutdown`].
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; the engine is stopped before returning.
    pub async fn run(mut self) -> Result<()> {
        while let Ok(command) = self.rx.recv().await {
            match self.handle_command(command) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Break) => return Ok(()),
                Err(err) => {
                    self.stop();
                    return Err(err);
                }
            }
        }
        self.stop();
        Ok(())
    }

    /// Handles every command queued so far, including ones queued while
    /// handling. Returns how many were handled.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error.
    pub fn process_pending(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Ok(command) = self.rx.try_recv() {
            handled += 1;
            if self.handle_command(command)? == Flow::Break {
                break;
            }
        }
        Ok(handled)
    }

    /// Applies one command.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid swipe-action settings, which the control
    /// loop treats as fatal.
    pub fn handle_command(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
            Command::Shutdown => {
                self.stop();
                return Ok(Flow::Break);
            }
            Command::Feed(event) => self.on_feed_event(event),
            Command::Suppress => self.on_suppress(),
            Command::Allow => {
                self.suppression.clear();
                debug!("overlay allowed");
            }
            Command::Setting(change) => self.on_setting_changed(&change)?,
            Command::Hide { immediately } => self.hide(immediately),
            Command::Touch { target, event } => self.on_touch(target, &event),
            Command::OutsideTouch => self.on_outside_touch(),
            Command::Click { slot } => self.on_click(slot, None),
            Command::ActionClick { slot, action } => self.on_click(slot, Some(action)),
            Command::DecayElapsed { slot, generation } => self.on_decay_elapsed(slot, generation),
            Command::Asset(update) => self.on_asset(update),
            Command::EntityChanged { slot, event } => self.on_entity_changed(slot, event),
            Command::ExitAnimationFinished { token } => self.on_exit_finished(token),
            Command::PlaceholderElapsed { slot } => self.on_placeholder_elapsed(slot),
        }
        Ok(Flow::Continue)
    }

    pub fn state(&self) -> EngineState {
        let Some(session) = &self.session else {
            return EngineState {
                started: self.lifecycle.is_active(),
                shown: false,
                attached: false,
                suppressed: self.suppression.is_active(),
                slots: Vec::new(),
            };
        };
        let slots = session
            .layout
            .slots()
            .iter()
            .map(|slot| match &slot.kind {
                SlotKind::Entry(entry) => SlotState::Entry {
                    slot: slot.id,
                    key: entry.key().clone(),
                    read: entry.entity().is_read(),
                    decaying: entry.is_decaying(),
                    decay_remaining: entry.decay_remaining(),
                },
                SlotKind::Placeholder { height, .. } => SlotState::Placeholder {
                    slot: slot.id,
                    height: *height,
                },
            })
            .collect();
        EngineState {
            started: self.lifecycle.is_active(),
            shown: session.visibility.is_active(),
            attached: session.attached,
            suppressed: self.suppression.is_active(),
            slots,
        }
    }

    fn start(&mut self) {
        if !self.lifecycle.activate() {
            trace!("overlay engine already started");
            return;
        }
        let settings = self.settings.snapshot();
        self.load_ctx.emoticons = settings.emoticons;
        let enabled = settings.enabled;
        self.session = Some(Session::new((self.surfaces)(), settings));

        self.signals.subscribe(self.handle.clone());
        self.settings.subscribe(self.handle.clone());
        self.feed.subscribe(self.handle.clone());
        info!(enabled, "overlay engine started");
    }

    fn stop(&mut self) {
        if !self.lifecycle.deactivate() {
            trace!("overlay engine already stopped");
            return;
        }
        self.feed.unsubscribe();
        self.settings.unsubscribe();
        self.signals.unsubscribe();
        if let Some(mut session) = self.session.take() {
            if session.pending_exit.is_some() {
                session.surface.cancel_exit_animation();
            }
            session.finish_hide();
        }
        info!("overlay engine stopped");
    }

    fn next_slot_id(&mut self) -> SlotId {
        self.next_slot += 1;
        SlotId(self.next_slot)
    }

    fn hide(&mut self, immediately: bool) {
        self.next_exit_token += 1;
        let done = AnimationDone::new(self.next_exit_token, self.handle.clone());
        if let Some(session) = self.session.as_mut() {
            session.hide(immediately, done);
        }
    }

    fn can_be_shown(&mut self) -> bool {
        let enabled = self.session.as_ref().is_some_and(|session| session.settings.enabled);
        enabled && self.suppression.permits(self.clock.now_ms())
    }

    fn on_feed_event(&mut self, event: FeedEvent) {
        let Some(session) = self.session.as_ref() else {
            trace!("feed event while stopped");
            return;
        };
        if !session.surface.is_screen_on() {
            trace!("screen is off; feed event ignored");
            return;
        }
        match event {
            FeedEvent::Posted(raw) | FeedEvent::Changed(raw) => {
                if !self.can_be_shown() {
                    debug!(
                        package = %raw.package,
                        id = raw.id,
                        suppressed = self.suppression.is_active(),
                        "overlay admission denied"
                    );
                    return;
                }
                self.post(raw);
            }
            FeedEvent::Removed(key) => self.on_feed_removed(&key),
            FeedEvent::Batch => trace!("batch feed update not reflected in the overlay"),
        }
    }

    fn post(&mut self, raw: RawNotification) {
        let key = self.scheme.key_for(&raw);
        let slot = self.session.as_ref().and_then(|session| {
            session
                .layout
                .find_entry(|entry| entry.entity().is_identified_by(&key))
        });
        if let Some(slot) = slot {
            self.refresh_entry(slot, raw);
        } else {
            self.insert_entry(raw);
        }
    }

    fn refresh_entry(&mut self, slot: SlotId, raw: RawNotification) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let base = session.settings.decay_time;
        if let Some(entry) = session.layout.entry_mut(slot) {
            entry.entity_mut().update(raw, &self.load_ctx);
            entry.reset_decay(base);
            debug!(key = %entry.key(), %slot, "overlay entry refreshed");
        }
        session.refresh(slot);
        session.prevent_instant_interactivity();
    }

    fn insert_entry(&mut self, raw: RawNotification) {
        let slot = self.next_slot_id();
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let mut entity = NotificationEntity::new_instance(self.scheme, raw);
        let listener_handle = self.handle.clone();
        let listener = entity.register_listener(move |_, event| {
            if let Err(err) = listener_handle.send(Command::EntityChanged { slot, event }) {
                trace!(error = %err, "entity change after shutdown");
            }
        });
        entity.load(&self.load_ctx);

        let timer_handle = self.handle.clone();
        let timer = DecayTimer::new(Arc::new(move |generation| {
            if let Err(err) = timer_handle.send(Command::DecayElapsed { slot, generation }) {
                trace!(error = %err, "decay after shutdown");
            }
        }));
        let swipe = GestureResolver::new(Axis::Horizontal, session.settings.gesture);
        let mut entry = OverlayEntry::new(slot, entity, timer, swipe, listener);
        entry.reset_decay(session.settings.decay_time);

        let content = entry.content();
        debug!(key = %entry.key(), %slot, "overlay entry added");
        let position = session.layout.push_entry(slot, entry);
        session.prevent_instant_interactivity();
        session.surface.insert(position, slot, &content);
        session.show();
    }

    fn on_feed_removed(&mut self, key: &NotificationKey) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(slot) = session
            .layout
            .find_entry(|entry| entry.entity().is_identified_by(key))
        else {
            trace!(%key, "removed notification not on screen");
            return;
        };
        if session.layout.entry_count() > 1 {
            self.replace_with_placeholder(slot);
        } else {
            debug!(%key, "last overlay entry stays until it decays or is swiped");
        }
    }

    /// Removal requested by the entry itself (decay or swipe). The last
    /// entry takes the whole overlay with it; it leaves the layout at once
    /// so a cancelled exit cannot bring it back.
    fn remove_locally(&mut self, slot: SlotId) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.layout.entry_count() > 1 {
            self.replace_with_placeholder(slot);
            return;
        }
        if let Some(entry) = session.layout.remove_entry(slot) {
            debug!(key = %entry.key(), %slot, "last overlay entry removed");
            entry.release();
            session.leaving.push(slot);
        }
        self.hide(false);
    }

    fn replace_with_placeholder(&mut self, slot: SlotId) {
        let placeholder = self.next_slot_id();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let height = session.surface.measure(slot).height;
        let handle = self.handle.clone();
        let expiry = tokio::spawn(async move {
            tokio::time::sleep(LAYOUT_ANIMATION_TIME).await;
            if let Err(err) = handle.send(Command::PlaceholderElapsed { slot: placeholder }) {
                trace!(error = %err, "placeholder expiry after shutdown");
            }
        })
        .abort_handle();

        let Some((position, entry)) =
            session.layout.replace_with_placeholder(slot, placeholder, height, expiry)
        else {
            return;
        };
        debug!(key = %entry.key(), %slot, %placeholder, "overlay entry removed");
        entry.release();
        session.surface.remove(slot);
        session
            .surface
            .insert(position, placeholder, &SlotContent::Placeholder { height });
        session.prevent_instant_interactivity();
    }

    fn on_placeholder_elapsed(&mut self, slot: SlotId) {
        if let Some(session) = self.session.as_mut() {
            if session.layout.remove_placeholder(slot) {
                session.surface.remove(slot);
            }
        }
    }

    fn on_suppress(&mut self) {
        self.suppression.begin(self.clock.now_ms());
        debug!("overlay suppressed");
        self.hide(false);
    }

    fn on_setting_changed(&mut self, change: &SettingChange) -> Result<()> {
        let Ok(key) = SettingKey::from_str(&change.key) else {
            trace!(key = %change.key, "ignoring unrelated setting");
            return Ok(());
        };
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let value = &change.value;
        let ignore = |message: String| {
            warn!(%key, %message, "ignoring invalid setting value");
        };
        match key {
            SettingKey::Enabled => match value.as_bool() {
                Ok(enabled) => {
                    session.settings.enabled = enabled;
                    if !enabled {
                        self.hide(false);
                    }
                }
                Err(message) => ignore(message),
            },
            SettingKey::DecayTime => match value.as_duration() {
                Ok(decay) => session.settings.decay_time = decay,
                Err(message) => ignore(message),
            },
            SettingKey::SwipeRightAction | SettingKey::SwipeLeftAction => {
                let action: SwipeAction = value
                    .as_swipe_action()
                    .map_err(|message| Error::from(invalid(key.field(), message)))?;
                if key == SettingKey::SwipeRightAction {
                    session.settings.swipe_right_action = action;
                } else {
                    session.settings.swipe_left_action = action;
                }
            }
            SettingKey::HideOnTouchOutside => match value.as_bool() {
                Ok(hide) => session.settings.hide_on_touch_outside = hide,
                Err(message) => ignore(message),
            },
            SettingKey::ShowAtTop => match value.as_bool() {
                Ok(top) => {
                    session.settings.show_at_top = top;
                    session.overlay_swipe.set_travel(overlay_travel(top));
                }
                Err(message) => ignore(message),
            },
            SettingKey::Emoticons => match value.as_bool() {
                Ok(enabled) => {
                    session.settings.emoticons = enabled;
                    self.load_ctx.emoticons = enabled;
                    let mut changed = Vec::new();
                    for entry in session.layout.entries_mut() {
                        if entry.entity_mut().set_emoticons_enabled(enabled) {
                            changed.push(entry.slot());
                        }
                    }
                    for slot in changed {
                        session.refresh(slot);
                    }
                }
                Err(message) => ignore(message),
            },
        }
        debug!(%key, "setting applied");
        Ok(())
    }

    fn on_touch(&mut self, target: TouchTarget, event: &TouchEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_interactive() {
            // A release still ends whatever the press started.
            if matches!(event.phase, TouchPhase::Up | TouchPhase::Cancel) {
                session.abandon_touch(target);
            }
            trace!("touch ignored during sensitivity delay");
            return;
        }
        match target {
            TouchTarget::Entry(slot) => {
                let width = session.surface.measure(slot).width;
                let base = session.settings.decay_time;
                let Some(entry) = session.layout.entry_mut(slot) else {
                    return;
                };
                match entry.on_touch(event, width, base) {
                    EntryOutcome::Idle => {}
                    EntryOutcome::Moved(offset) => {
                        session.surface.translate(TranslateTarget::Slot(slot), offset);
                    }
                    EntryOutcome::Settled => {
                        session.surface.translate(TranslateTarget::Slot(slot), 0.0);
                    }
                    EntryOutcome::Swiped(direction) => self.on_entry_swiped(slot, direction),
                }
            }
            TouchTarget::Overlay => {
                let subject = SwipeSubject {
                    dismissible: true,
                    extent: session.surface.overlay_extent().height,
                };
                match session.overlay_swipe.handle(event, &subject) {
                    Some(GestureOutcome::Moved { translation }) => {
                        session.surface.translate(TranslateTarget::Overlay, translation);
                    }
                    Some(GestureOutcome::Cancelled) => {
                        session.surface.translate(TranslateTarget::Overlay, 0.0);
                    }
                    Some(GestureOutcome::Dismissed { .. }) => {
                        debug!("overlay swiped away");
                        self.hide(false);
                    }
                    None => {}
                }
            }
        }
    }

    fn on_entry_swiped(&mut self, slot: SlotId, direction: Direction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let action = session.settings.action_for(direction);
        let base = session.settings.decay_time;
        let Some(entry) = session.layout.entry_mut(slot) else {
            return;
        };
        debug!(key = %entry.key(), ?direction, %action, "overlay entry swiped");
        match action {
            SwipeAction::Dismiss => {
                entry.entity().dismiss(self.feed.as_ref());
                self.remove_locally(slot);
            }
            SwipeAction::Hide => {
                entry.entity_mut().mark_as_read();
                self.remove_locally(slot);
            }
            SwipeAction::Snooze => {
                warn!(key = %entry.key(), "swipe to snooze is not supported");
                entry.reset_decay(base);
                session.surface.translate(TranslateTarget::Slot(slot), 0.0);
            }
        }
    }

    fn on_outside_touch(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.is_interactive() && session.settings.hide_on_touch_outside {
            debug!("touch outside overlay");
            self.hide(false);
        }
    }

    fn on_click(&mut self, slot: SlotId, action: Option<usize>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_interactive() {
            trace!("click ignored during sensitivity delay");
            return;
        }
        let Some(entry) = session.layout.entry_mut(slot) else {
            return;
        };
        let feed = self.feed.as_ref();
        match action {
            None => {
                entry.entity().click(feed);
            }
            Some(action) => {
                if entry.entity().send_action(feed, action) {
                    entry.entity().dismiss(feed);
                }
            }
        }
    }

    fn on_decay_elapsed(&mut self, slot: SlotId, generation: u64) {
        let Some(entry) = self
            .session
            .as_mut()
            .and_then(|session| session.layout.entry_mut(slot))
        else {
            trace!(%slot, "decay for a removed entry");
            return;
        };
        if !entry.confirm_decay(generation) {
            trace!(%slot, generation, "stale decay wake-up");
            return;
        }
        entry.entity_mut().mark_as_read();
        debug!(key = %entry.key(), %slot, "overlay entry decayed");
        self.remove_locally(slot);
    }

    fn on_asset(&mut self, update: AssetUpdate) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(slot) = session
            .layout
            .find_entry(|entry| entry.entity().is_identified_by(&update.key))
        else {
            trace!(key = %update.key, "asset for an entry no longer shown");
            return;
        };
        if let Some(entry) = session.layout.entry_mut(slot) {
            entry.entity_mut().apply_asset(update);
        }
    }

    fn on_entity_changed(&mut self, slot: SlotId, event: DataEvent) {
        if event == DataEvent::ReadChanged {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.refresh(slot);
        }
    }

    fn on_exit_finished(&mut self, token: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.pending_exit == Some(token) {
            session.finish_hide();
        } else {
            trace!(token, "stale exit animation");
        }
    }
}
