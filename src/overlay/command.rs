use async_channel::{Receiver, Sender};

use crate::Result;
use crate::error::Error;
use crate::gesture::TouchEvent;
use crate::notification::{AssetUpdate, DataEvent, IdentityScheme, NotificationKey, RawNotification};
use crate::platform::SlotId;
use crate::types::SettingChange;

/// Notification feed events.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    Posted(RawNotification),
    Changed(RawNotification),
    Removed(NotificationKey),
    /// Bulk list update. Not reflected in the overlay.
    Batch,
}

/// Where a touch stream was delivered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TouchTarget {
    /// A single entry; drives its horizontal swipe.
    Entry(SlotId),
    /// The overlay root; drives the vertical swipe that hides everything.
    Overlay,
}

/// Everything the control loop reacts to.
#[derive(Debug)]
pub enum Command {
    Start,
    Stop,
    /// Stops the engine and ends the control loop.
    Shutdown,
    Feed(FeedEvent),
    Suppress,
    Allow,
    Setting(SettingChange),
    Hide { immediately: bool },
    Touch { target: TouchTarget, event: TouchEvent },
    OutsideTouch,
    Click { slot: SlotId },
    ActionClick { slot: SlotId, action: usize },
    DecayElapsed { slot: SlotId, generation: u64 },
    Asset(AssetUpdate),
    EntityChanged { slot: SlotId, event: DataEvent },
    ExitAnimationFinished { token: u64 },
    PlaceholderElapsed { slot: SlotId },
}

/// Cloneable producer side of the engine's command queue.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    tx: Sender<Command>,
    scheme: IdentityScheme,
}

impl EngineHandle {
    pub(crate) fn channel(scheme: IdentityScheme) -> (Self, Receiver<Command>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx, scheme }, rx)
    }

    pub const fn identity_scheme(&self) -> IdentityScheme {
        self.scheme
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Enqueues a command for the control loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx.try_send(command).map_err(|_| Error::EngineClosed)
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn posted(&self, raw: RawNotification) -> Result<()> {
        self.send(Command::Feed(FeedEvent::Posted(raw)))
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn changed(&self, raw: RawNotification) -> Result<()> {
        self.send(Command::Feed(FeedEvent::Changed(raw)))
    }

    /// Removal by snapshot; the key is built with the engine's identity
    /// scheme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn removed(&self, raw: &RawNotification) -> Result<()> {
        self.removed_key(self.scheme.key_for(raw))
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn removed_key(&self, key: NotificationKey) -> Result<()> {
        self.send(Command::Feed(FeedEvent::Removed(key)))
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn batch(&self) -> Result<()> {
        self.send(Command::Feed(FeedEvent::Batch))
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn suppress(&self) -> Result<()> {
        self.send(Command::Suppress)
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn allow(&self) -> Result<()> {
        self.send(Command::Allow)
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn setting_changed(&self, change: SettingChange) -> Result<()> {
        self.send(Command::Setting(change))
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn hide(&self, immediately: bool) -> Result<()> {
        self.send(Command::Hide { immediately })
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn touch(&self, target: TouchTarget, event: TouchEvent) -> Result<()> {
        self.send(Command::Touch { target, event })
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn touch_outside(&self) -> Result<()> {
        self.send(Command::OutsideTouch)
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn click(&self, slot: SlotId) -> Result<()> {
        self.send(Command::Click { slot })
    }

    /// # Errors
    ///
    /// Returns [`Error::EngineClosed`] once the control loop is gone.
    pub fn action_click(&self, slot: SlotId, action: usize) -> Result<()> {
        self.send(Command::ActionClick { slot, action })
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, EngineHandle, FeedEvent};
    use crate::error::Error;
    use crate::notification::{IdentityScheme, RawNotification};

    #[test]
    fn removal_key_uses_engine_scheme() {
        let (handle, rx) = EngineHandle::channel(IdentityScheme::PackageTagId);
        let mut raw = RawNotification::new("com.example", 9);
        raw.user = Some(10);
        assert!(handle.removed(&raw).is_ok());
        match rx.try_recv() {
            Ok(Command::Feed(FeedEvent::Removed(key))) => {
                assert_eq!(key.user, None);
                assert_eq!(key.id, 9);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn sends_fail_after_loop_is_gone() {
        let (handle, rx) = EngineHandle::channel(IdentityScheme::SourceKey);
        drop(rx);
        assert!(handle.is_closed());
        assert!(matches!(handle.allow(), Err(Error::EngineClosed)));
    }
}
