//! Notification entities: identity, derived text and asynchronously loaded
//! visuals.

use std::fmt;
use std::sync::Arc;

use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::platform::{EntryView, Feed};

mod identity;
mod loader;
mod palette;
mod text;

pub use identity::{IdentityScheme, NotificationKey, RawAction, RawNotification};
pub use loader::{AssetPayload, AssetSink, AssetSource, AssetUpdate, BrandColorCache, LoadContext};
pub use palette::{Bitmap, Color, vibrant};
pub use text::{NotificationText, TextFields, add_smileys};

/// Scoped change events emitted to entity listeners.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataEvent {
    IconChanged,
    ReadChanged,
    BrandColorChanged,
}

pub type ListenerId = u64;
type Listener = Box<dyn Fn(&NotificationKey, DataEvent) + Send + Sync>;

pub struct NotificationEntity {
    key: NotificationKey,
    raw: Arc<RawNotification>,
    text: NotificationText,
    actions: Vec<String>,
    icon: Option<Arc<Bitmap>>,
    brand_color: Color,
    read: bool,
    mine: bool,
    number: u32,
    loaded_at: Option<Instant>,
    emoticons: bool,
    token: u64,
    jobs: Vec<AbortHandle>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: ListenerId,
}

impl fmt::Debug for NotificationEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationEntity")
            .field("key", &self.key)
            .field("read", &self.read)
            .field("loaded", &self.is_loaded())
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl NotificationEntity {
    /// Pure mapping from a feed snapshot; nothing is loaded yet.
    pub fn new_instance(scheme: IdentityScheme, raw: RawNotification) -> Self {
        Self {
            key: scheme.key_for(&raw),
            raw: Arc::new(raw),
            text: NotificationText::default(),
            actions: Vec::new(),
            icon: None,
            brand_color: Color::WHITE,
            read: false,
            mine: false,
            number: 0,
            loaded_at: None,
            emoticons: false,
            token: 0,
            jobs: Vec::new(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Derives text and starts the icon and brand-color jobs. Runs once per
    /// instance; later calls are ignored.
    pub fn load(&mut self, ctx: &LoadContext) {
        if self.is_loaded() {
            debug!(key = %self.key, "notification already loaded");
            return;
        }
        self.loaded_at = Some(Instant::now());
        self.mine = self.raw.package == ctx.own_package;
        self.actions = self.raw.actions.iter().map(|action| action.title.clone()).collect();
        self.number = self.raw.number;
        self.emoticons = ctx.emoticons;
        self.text = NotificationText::extract(&self.raw, self.emoticons);

        self.token = loader::next_token();
        self.jobs = loader::spawn_jobs(&self.raw, &self.key, self.token, ctx);
        trace!(key = %self.key, token = self.token, "notification loading");
    }

    /// Replaces the content with a newer snapshot of the same notification
    /// and loads it again. Read state, listeners and current visuals carry
    /// over until the new jobs report.
    pub fn update(&mut self, raw: RawNotification, ctx: &LoadContext) {
        debug_assert_eq!(self.key.package, raw.package);
        self.recycle();
        self.raw = Arc::new(raw);
        self.loaded_at = None;
        self.load(ctx);
    }

    pub const fn key(&self) -> &NotificationKey {
        &self.key
    }

    /// Identity comparison; content is not looked at.
    pub fn has_identical_ids(&self, other: &Self) -> bool {
        self.is_identified_by(&other.key)
    }

    pub fn is_identified_by(&self, key: &NotificationKey) -> bool {
        self.key == *key
    }

    pub const fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub const fn loaded_at(&self) -> Option<Instant> {
        self.loaded_at
    }

    pub fn raw(&self) -> &RawNotification {
        &self.raw
    }

    pub const fn text(&self) -> &TextFields {
        self.text.fields()
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn icon(&self) -> Option<&Bitmap> {
        self.icon.as_deref()
    }

    pub const fn brand_color(&self) -> Color {
        self.brand_color
    }

    pub fn priority(&self) -> i32 {
        self.raw.priority
    }

    pub fn is_dismissible(&self) -> bool {
        !self.raw.ongoing && !self.raw.no_clear
    }

    pub const fn is_mine(&self) -> bool {
        self.mine
    }

    pub const fn number(&self) -> u32 {
        self.number
    }

    pub const fn is_read(&self) -> bool {
        self.read
    }

    pub fn mark_as_read(&mut self) {
        self.set_read(true);
    }

    /// Emits [`DataEvent::ReadChanged`] only when the state flips.
    pub fn set_read(&mut self, read: bool) {
        if self.read == read {
            return;
        }
        self.read = read;
        self.notify(DataEvent::ReadChanged);
    }

    /// Re-derives message text from the extracted originals. Returns whether
    /// the displayed text changed.
    pub fn set_emoticons_enabled(&mut self, enabled: bool) -> bool {
        self.emoticons = enabled;
        self.text.set_emoticons_enabled(enabled)
    }

    /// Applies a finished job result. Results from an earlier load or after
    /// [`recycle`](Self::recycle) are discarded.
    pub fn apply_asset(&mut self, update: AssetUpdate) -> bool {
        if update.key != self.key || update.token != self.token {
            trace!(key = %self.key, token = update.token, "stale asset result dropped");
            return false;
        }
        match update.payload {
            AssetPayload::Icon(icon) => {
                self.icon = Some(icon);
                self.notify(DataEvent::IconChanged);
            }
            AssetPayload::BrandColor(color) => {
                self.brand_color = color;
                self.notify(DataEvent::BrandColorChanged);
            }
        }
        true
    }

    /// Asks the feed to dismiss this notification. Feed failures are logged
    /// and reported as `false`.
    pub fn dismiss(&self, feed: &dyn Feed) -> bool {
        match feed.dismiss(&self.key) {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to dismiss notification");
                false
            }
        }
    }

    pub fn click(&self, feed: &dyn Feed) -> bool {
        match feed.click(&self.key) {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to open notification");
                false
            }
        }
    }

    pub fn send_action(&self, feed: &dyn Feed, action: usize) -> bool {
        match feed.send_action(&self.key, action) {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %self.key, action, error = %err, "failed to send notification action");
                false
            }
        }
    }

    /// Cancels in-flight jobs and invalidates their results. Safe to call
    /// repeatedly.
    pub fn recycle(&mut self) {
        for job in self.jobs.drain(..) {
            job.abort();
        }
        self.token = loader::next_token();
    }

    pub fn register_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&NotificationKey, DataEvent) + Send + Sync + 'static,
    {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unregister_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    fn notify(&self, event: DataEvent) {
        for (_, listener) in &self.listeners {
            listener(&self.key, event);
        }
    }

    pub fn view(&self) -> EntryView {
        let text = self.text.fields();
        EntryView {
            key: self.key.clone(),
            title: text.title.clone(),
            message: text.message.clone(),
            message_lines: text.message_lines.clone(),
            info: text.info.clone(),
            actions: self.actions.clone(),
            has_icon: self.icon.is_some(),
            brand_color: self.brand_color,
            number: self.number,
            dismissible: self.is_dismissible(),
        }
    }
}

impl Drop for NotificationEntity {
    fn drop(&mut self) {
        for job in &self.jobs {
            job.abort();
        }
    }
}
