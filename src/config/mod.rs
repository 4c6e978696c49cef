use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use crate::Result;
use crate::error::{ConfigError, Error};
use crate::gesture::{Direction, GestureConfig};
use crate::notification::IdentityScheme;
use crate::types::SwipeAction;

mod defaults;
mod env;
mod raw;
mod serde;

pub use serde::MillisOrHumantime;

/// Static configuration of one engine instance.
#[derive(Debug, Clone)]
pub struct Config {
    pub overlay: OverlaySettings,
    pub identity: IdentityScheme,
    /// Package name of this application; entities posted by it are "mine".
    pub own_package: String,
    pub brand_color_cache_size: NonZeroUsize,
}

/// The runtime-mutable part of the configuration. Configuration-changed
/// signals edit a copy of this owned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySettings {
    pub enabled: bool,
    /// Base decay time. Zero disables decay.
    pub decay_time: Duration,
    pub swipe_right_action: SwipeAction,
    pub swipe_left_action: SwipeAction,
    pub hide_on_touch_outside: bool,
    pub show_at_top: bool,
    pub emoticons: bool,
    pub touch_sensitivity_delay: Duration,
    pub gesture: GestureConfig,
}

impl Config {
    /// Load configuration from a file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be parsed, when
    /// environment overrides are invalid, or when the resulting values fail
    /// validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path).map_err(Error::from)?;
        raw.apply_env_overrides().map_err(Error::from)?;
        raw.validate_and_build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overlay: OverlaySettings::default(),
            identity: IdentityScheme::default(),
            own_package: defaults::default_own_package(),
            brand_color_cache_size: defaults::default_brand_color_cache_size(),
        }
    }
}

impl OverlaySettings {
    /// Action bound to a swipe in the given direction.
    pub const fn action_for(&self, direction: Direction) -> SwipeAction {
        match direction {
            Direction::Positive => self.swipe_right_action,
            Direction::Negative => self.swipe_left_action,
        }
    }
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            decay_time: defaults::default_decay_time(),
            swipe_right_action: SwipeAction::Dismiss,
            swipe_left_action: SwipeAction::Hide,
            hide_on_touch_outside: true,
            show_at_top: true,
            emoticons: false,
            touch_sensitivity_delay: defaults::default_touch_sensitivity_delay(),
            gesture: GestureConfig::default(),
        }
    }
}

pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        field,
        message: message.into(),
    }
}
