#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use headsup::config::{Config, OverlaySettings};
use headsup::error::{AssetError, FeedError, SurfaceError};
use headsup::gesture::{TouchEvent, TouchPhase};
use headsup::notification::{Bitmap, NotificationKey, RawNotification};
use headsup::overlay::{Collaborators, Engine, EngineHandle, EngineState, TouchTarget};
use headsup::platform::{
    AnimationDone, AssetSource, Clock, Extent, Feed, Gravity, LayoutParams, SettingsSource,
    SignalSource, SlotContent, SlotId, Surface, TranslateTarget,
};

pub const SLOT_WIDTH: f32 = 400.0;
pub const SLOT_HEIGHT: f32 = 48.0;

/// What a slot showed, reduced to what tests compare.
#[derive(Clone, Debug, PartialEq)]
pub enum Drawn {
    Entry {
        key: String,
        title: Option<String>,
        message: Option<String>,
    },
    Placeholder(f32),
}

impl From<&SlotContent> for Drawn {
    fn from(content: &SlotContent) -> Self {
        match content {
            SlotContent::Entry(view) => Self::Entry {
                key: view.key.to_string(),
                title: view.title.clone(),
                message: view.message.clone(),
            },
            SlotContent::Placeholder { height } => Self::Placeholder(*height),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    Attach(Gravity),
    Detach,
    Insert { position: usize, slot: SlotId, drawn: Drawn },
    Update { slot: SlotId, drawn: Drawn },
    Remove(SlotId),
    Clear,
    Translate(TranslateTarget, f32),
    ExitAnimation(u64),
    CancelExit,
}

#[derive(Debug)]
pub struct SurfaceLog {
    pub ops: Vec<SurfaceOp>,
    pub screen_on: bool,
    pub refuse_attach: bool,
    /// Completes exit animations as soon as they start.
    pub finish_exits: bool,
    pub pending_exits: Vec<AnimationDone>,
    pub surfaces_created: usize,
}

impl Default for SurfaceLog {
    fn default() -> Self {
        Self {
            ops: Vec::new(),
            screen_on: true,
            refuse_attach: false,
            finish_exits: true,
            pending_exits: Vec::new(),
            surfaces_created: 0,
        }
    }
}

pub type SurfaceProbe = Arc<Mutex<SurfaceLog>>;

pub struct RecordingSurface {
    log: SurfaceProbe,
}

impl RecordingSurface {
    fn record(&self, op: SurfaceOp) {
        self.log.lock().unwrap().ops.push(op);
    }
}

impl Surface for RecordingSurface {
    fn attach(&mut self, params: &LayoutParams) -> Result<(), SurfaceError> {
        if self.log.lock().unwrap().refuse_attach {
            return Err(SurfaceError::Attach("permission denied".to_string()));
        }
        self.record(SurfaceOp::Attach(params.gravity));
        Ok(())
    }

    fn detach(&mut self) {
        self.record(SurfaceOp::Detach);
    }

    fn insert(&mut self, position: usize, slot: SlotId, content: &SlotContent) {
        self.record(SurfaceOp::Insert {
            position,
            slot,
            drawn: content.into(),
        });
    }

    fn update(&mut self, slot: SlotId, content: &SlotContent) {
        self.record(SurfaceOp::Update {
            slot,
            drawn: content.into(),
        });
    }

    fn remove(&mut self, slot: SlotId) {
        self.record(SurfaceOp::Remove(slot));
    }

    fn clear(&mut self) {
        self.record(SurfaceOp::Clear);
    }

    fn measure(&self, _slot: SlotId) -> Extent {
        Extent::new(SLOT_WIDTH, SLOT_HEIGHT)
    }

    fn overlay_extent(&self) -> Extent {
        Extent::new(SLOT_WIDTH, SLOT_HEIGHT * 2.0)
    }

    fn translate(&mut self, target: TranslateTarget, offset: f32) {
        self.record(SurfaceOp::Translate(target, offset));
    }

    fn play_exit_animation(&mut self, done: AnimationDone) {
        self.record(SurfaceOp::ExitAnimation(done.token()));
        let mut log = self.log.lock().unwrap();
        if log.finish_exits {
            drop(log);
            done.finish();
        } else {
            log.pending_exits.push(done);
        }
    }

    fn cancel_exit_animation(&mut self) {
        self.log.lock().unwrap().pending_exits.clear();
        self.record(SurfaceOp::CancelExit);
    }

    fn is_screen_on(&self) -> bool {
        self.log.lock().unwrap().screen_on
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedCall {
    Dismiss(String),
    Click(String),
    Action(String, usize),
}

#[derive(Default)]
pub struct CountingFeed {
    pub calls: Mutex<Vec<FeedCall>>,
    pub subscribed: AtomicBool,
    pub subscriptions: AtomicUsize,
    pub unavailable: AtomicBool,
}

impl CountingFeed {
    pub fn calls(&self) -> Vec<FeedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, call: FeedCall) -> Result<(), FeedError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FeedError::Unavailable);
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl Feed for CountingFeed {
    fn subscribe(&self, _engine: EngineHandle) {
        self.subscribed.store(true, Ordering::SeqCst);
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
    }

    fn unsubscribe(&self) {
        self.subscribed.store(false, Ordering::SeqCst);
    }

    fn dismiss(&self, key: &NotificationKey) -> Result<(), FeedError> {
        self.call(FeedCall::Dismiss(key.to_string()))
    }

    fn click(&self, key: &NotificationKey) -> Result<(), FeedError> {
        self.call(FeedCall::Click(key.to_string()))
    }

    fn send_action(&self, key: &NotificationKey, action: usize) -> Result<(), FeedError> {
        self.call(FeedCall::Action(key.to_string(), action))
    }
}

pub struct StaticSettings {
    pub settings: Mutex<OverlaySettings>,
    pub subscribed: AtomicBool,
}

impl SettingsSource for StaticSettings {
    fn snapshot(&self) -> OverlaySettings {
        self.settings.lock().unwrap().clone()
    }

    fn subscribe(&self, _engine: EngineHandle) {
        self.subscribed.store(true, Ordering::SeqCst);
    }

    fn unsubscribe(&self) {
        self.subscribed.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct StaticSignals {
    pub subscribed: AtomicBool,
}

impl SignalSource for StaticSignals {
    fn subscribe(&self, _engine: EngineHandle) {
        self.subscribed.store(true, Ordering::SeqCst);
    }

    fn unsubscribe(&self) {
        self.subscribed.store(false, Ordering::SeqCst);
    }
}

/// Never produces an icon, so no asset results reach the engine.
pub struct FailingAssets;

impl AssetSource for FailingAssets {
    fn notification_icon(&self, _raw: &RawNotification) -> Result<Bitmap, AssetError> {
        Err(AssetError::Unavailable)
    }

    fn application_icon(&self, package: &str) -> Result<Bitmap, AssetError> {
        Err(AssetError::PackageNotFound {
            package: package.to_string(),
        })
    }
}

/// Milliseconds set by the test.
pub struct ManualClock(pub AtomicU64);

impl ManualClock {
    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub engine: Engine,
    pub handle: EngineHandle,
    pub surface: SurfaceProbe,
    pub feed: Arc<CountingFeed>,
    pub settings: Arc<StaticSettings>,
    pub signals: Arc<StaticSignals>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(OverlaySettings::default())
    }

    pub fn with_settings(settings: OverlaySettings) -> Self {
        let config = Config {
            overlay: settings,
            ..Config::default()
        };
        let surface = SurfaceProbe::default();
        let feed = Arc::new(CountingFeed::default());
        let settings = Arc::new(StaticSettings {
            settings: Mutex::new(config.overlay.clone()),
            subscribed: AtomicBool::new(false),
        });
        let signals = Arc::new(StaticSignals::default());
        let clock = Arc::new(ManualClock(AtomicU64::new(1)));

        let probe = Arc::clone(&surface);
        let parts = Collaborators {
            feed: feed.clone(),
            signals: signals.clone(),
            settings: settings.clone(),
            surfaces: Box::new(move || -> Box<dyn Surface> {
                probe.lock().unwrap().surfaces_created += 1;
                Box::new(RecordingSurface {
                    log: Arc::clone(&probe),
                })
            }),
            assets: Arc::new(FailingAssets),
            clock: clock.clone(),
        };
        let (engine, handle) = Engine::new(&config, parts);
        Self {
            engine,
            handle,
            surface,
            feed,
            settings,
            signals,
            clock,
        }
    }

    /// Started, with the surface log cleared.
    pub async fn started() -> Self {
        let mut harness = Self::new();
        harness.handle.start().unwrap();
        harness.settle().await.unwrap();
        harness
    }

    /// Lets spawned tasks run, then drains the command queue until it stays
    /// empty.
    pub async fn settle(&mut self) -> headsup::Result<()> {
        loop {
            for _ in 0..8 {
                tokio::task::yield_now().await;
            }
            if self.engine.process_pending()? == 0 {
                return Ok(());
            }
        }
    }

    pub async fn advance(&mut self, by: Duration) -> headsup::Result<()> {
        tokio::time::advance(by).await;
        self.settle().await
    }

    /// Waits out the touch sensitivity delay.
    pub async fn wait_interactive(&mut self) {
        self.advance(Duration::from_millis(301)).await.unwrap();
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.surface.lock().unwrap().ops.clone()
    }

    pub fn take_ops(&self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.surface.lock().unwrap().ops)
    }

    pub fn key_of(&self, raw: &RawNotification) -> NotificationKey {
        self.handle.identity_scheme().key_for(raw)
    }

    pub fn slot_of(&self, raw: &RawNotification) -> SlotId {
        self.state()
            .entry_slot(&self.key_of(raw))
            .expect("notification is on screen")
    }

    pub async fn post(&mut self, raw: &RawNotification) {
        self.handle.posted(raw.clone()).unwrap();
        self.settle().await.unwrap();
    }

    /// Fast fling along `sign`: +1.0 right or down, -1.0 left or up.
    pub async fn fling(&mut self, target: TouchTarget, sign: f32) -> headsup::Result<()> {
        let vertical = target == TouchTarget::Overlay;
        for (phase, distance, ms) in [
            (TouchPhase::Down, 0.0, 0),
            (TouchPhase::Move, 30.0, 10),
            (TouchPhase::Move, 90.0, 20),
            (TouchPhase::Up, 140.0, 30),
        ] {
            let offset = distance * sign;
            let (x, y) = if vertical { (0.0, offset) } else { (offset, 0.0) };
            let event = TouchEvent::new(phase, x, y, Duration::from_millis(ms));
            self.handle.touch(target, event).unwrap();
        }
        self.settle().await
    }
}

pub fn notification(package: &str, id: i32, title: &str, text: &str) -> RawNotification {
    let mut raw = RawNotification::new(package, id);
    raw.title = Some(title.to_string());
    raw.text = Some(text.to_string());
    raw
}
