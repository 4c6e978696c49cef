//! Host stand-ins for the driver: everything is reported through tracing.

use std::time::Duration;

use headsup::config::OverlaySettings;
use headsup::error::{AssetError, FeedError, SurfaceError};
use headsup::notification::{Bitmap, NotificationKey, RawNotification};
use headsup::overlay::EngineHandle;
use headsup::platform::{
    AnimationDone, AssetSource, Extent, Feed, LayoutParams, SettingsSource, SignalSource,
    SlotContent, SlotId, Surface, TranslateTarget,
};
use tokio::task::AbortHandle;
use tracing::{debug, info};

const WIDTH: f32 = 360.0;
const ENTRY_HEIGHT: f32 = 64.0;
const LINE_HEIGHT: f32 = 18.0;
const EXIT_ANIMATION: Duration = Duration::from_millis(200);

fn height_of(content: &SlotContent) -> f32 {
    match content {
        SlotContent::Entry(view) => {
            #[allow(clippy::cast_precision_loss)]
            let lines = view.message_lines.len() as f32;
            lines.mul_add(LINE_HEIGHT, ENTRY_HEIGHT)
        }
        SlotContent::Placeholder { height } => *height,
    }
}

/// Surface factice : journalise ce qu'une vraie fenêtre dessinerait.
#[derive(Debug, Default)]
pub struct LogSurface {
    attached: bool,
    slots: Vec<(SlotId, f32)>,
    exit: Option<AbortHandle>,
}

impl Surface for LogSurface {
    fn attach(&mut self, params: &LayoutParams) -> Result<(), SurfaceError> {
        if self.attached {
            return Err(SurfaceError::Attach("already attached".to_string()));
        }
        self.attached = true;
        info!(gravity = ?params.gravity, "overlay attached");
        Ok(())
    }

    fn detach(&mut self) {
        self.attached = false;
        info!("overlay detached");
    }

    fn insert(&mut self, position: usize, slot: SlotId, content: &SlotContent) {
        let position = position.min(self.slots.len());
        self.slots.insert(position, (slot, height_of(content)));
        match content {
            SlotContent::Entry(view) => info!(
                %slot,
                position,
                key = %view.key,
                title = view.title.as_deref().unwrap_or(""),
                message = view.message.as_deref().unwrap_or(""),
                "entry shown"
            ),
            SlotContent::Placeholder { height } => debug!(%slot, position, height, "placeholder"),
        }
    }

    fn update(&mut self, slot: SlotId, content: &SlotContent) {
        if let Some(entry) = self.slots.iter_mut().find(|(id, _)| *id == slot) {
            entry.1 = height_of(content);
        }
        if let SlotContent::Entry(view) = content {
            info!(
                %slot,
                title = view.title.as_deref().unwrap_or(""),
                message = view.message.as_deref().unwrap_or(""),
                color = ?view.brand_color,
                "entry updated"
            );
        }
    }

    fn remove(&mut self, slot: SlotId) {
        self.slots.retain(|(id, _)| *id != slot);
        debug!(%slot, "slot removed");
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn measure(&self, slot: SlotId) -> Extent {
        let height = self
            .slots
            .iter()
            .find_map(|(id, height)| (*id == slot).then_some(*height))
            .unwrap_or(0.0);
        Extent::new(WIDTH, height)
    }

    fn overlay_extent(&self) -> Extent {
        Extent::new(WIDTH, self.slots.iter().map(|(_, height)| height).sum())
    }

    fn translate(&mut self, target: TranslateTarget, offset: f32) {
        debug!(?target, offset, "translate");
    }

    fn play_exit_animation(&mut self, done: AnimationDone) {
        debug!(token = done.token(), "exit animation");
        let task = tokio::spawn(async move {
            tokio::time::sleep(EXIT_ANIMATION).await;
            done.finish();
        });
        if let Some(previous) = self.exit.replace(task.abort_handle()) {
            previous.abort();
        }
    }

    fn cancel_exit_animation(&mut self) {
        if let Some(exit) = self.exit.take() {
            exit.abort();
            debug!("exit animation cancelled");
        }
    }
}

/// Accepts every callback and logs it.
#[derive(Debug, Default)]
pub struct LogFeed;

impl Feed for LogFeed {
    fn subscribe(&self, _engine: EngineHandle) {
        debug!("feed subscribed");
    }

    fn unsubscribe(&self) {
        debug!("feed unsubscribed");
    }

    fn dismiss(&self, key: &NotificationKey) -> Result<(), FeedError> {
        info!(%key, "dismissed");
        Ok(())
    }

    fn click(&self, key: &NotificationKey) -> Result<(), FeedError> {
        info!(%key, "clicked");
        Ok(())
    }

    fn send_action(&self, key: &NotificationKey, action: usize) -> Result<(), FeedError> {
        info!(%key, action, "action sent");
        Ok(())
    }
}

/// Réglages figés au démarrage ; les changements passent par le script.
#[derive(Debug)]
pub struct StaticSettings(pub OverlaySettings);

impl SettingsSource for StaticSettings {
    fn snapshot(&self) -> OverlaySettings {
        self.0.clone()
    }

    fn subscribe(&self, _engine: EngineHandle) {}

    fn unsubscribe(&self) {}
}

#[derive(Debug, Default)]
pub struct NoSignals;

impl SignalSource for NoSignals {
    fn subscribe(&self, _engine: EngineHandle) {}

    fn unsubscribe(&self) {}
}

/// No icons are available to the driver.
#[derive(Debug, Default)]
pub struct NoAssets;

impl AssetSource for NoAssets {
    fn notification_icon(&self, _raw: &RawNotification) -> Result<Bitmap, AssetError> {
        Err(AssetError::Unavailable)
    }

    fn application_icon(&self, package: &str) -> Result<Bitmap, AssetError> {
        Err(AssetError::PackageNotFound {
            package: package.to_string(),
        })
    }
}
