use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;

use crate::Result;
use crate::error::ConfigError;
use crate::gesture::GestureConfig;
use crate::notification::IdentityScheme;
use crate::types::SwipeAction;

use super::defaults::{
    default_brand_color_cache_size, default_decay_time, default_density_scale, default_enabled,
    default_hide_on_touch_outside, default_identity, default_own_package, default_show_at_top,
    default_swipe_left_action, default_swipe_right_action, default_touch_sensitivity_delay,
    default_touch_slop,
};
use super::env::EnvOverrides;
use super::{Config, MillisOrHumantime, OverlaySettings, invalid};

const MAX_DECAY_TIME: Duration = Duration::from_secs(60 * 60);

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    let path = path.as_ref();
    ::config::Config::builder()
        .add_source(::config::File::from(path).required(false))
        .add_source(
            ::config::Environment::with_prefix("HEADSUP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) overlay: RawOverlay,
    #[serde(default)]
    pub(super) gesture: RawGesture,
    #[serde(default)]
    pub(super) engine: RawEngine,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawOverlay {
    #[serde(default = "default_enabled")]
    pub(super) enabled: bool,
    #[serde(default = "default_decay_time")]
    #[serde_as(as = "MillisOrHumantime")]
    pub(super) decay_time: Duration,
    #[serde(default = "default_swipe_right_action")]
    pub(super) swipe_right_action: String,
    #[serde(default = "default_swipe_left_action")]
    pub(super) swipe_left_action: String,
    #[serde(default = "default_hide_on_touch_outside")]
    pub(super) hide_on_touch_outside: bool,
    #[serde(default = "default_show_at_top")]
    pub(super) show_at_top: bool,
    #[serde(default)]
    pub(super) emoticons: bool,
    #[serde(default = "default_touch_sensitivity_delay")]
    #[serde_as(as = "MillisOrHumantime")]
    pub(super) touch_sensitivity_delay: Duration,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawGesture {
    #[serde(default = "default_touch_slop")]
    pub(super) touch_slop: f32,
    #[serde(default = "default_density_scale")]
    pub(super) density_scale: f32,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawEngine {
    #[serde(default = "default_identity")]
    pub(super) identity: String,
    #[serde(default = "default_own_package")]
    pub(super) own_package: String,
    #[serde(default = "default_cache_size")]
    pub(super) brand_color_cache_size: usize,
}

const fn default_cache_size() -> usize {
    default_brand_color_cache_size().get()
}

impl RawConfig {
    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        self.apply_overrides(&EnvOverrides::from_process())
    }

    fn apply_overrides(&mut self, env: &EnvOverrides) -> std::result::Result<(), ConfigError> {
        if let Some(enabled) = env.parse::<bool>("ENABLED", "overlay.enabled")? {
            self.overlay.enabled = enabled;
        }
        if let Some(decay) = env.duration("DECAY_TIME", "overlay.decay_time")? {
            self.overlay.decay_time = decay;
        }
        if let Some(action) = env.string("SWIPE_RIGHT_ACTION") {
            self.overlay.swipe_right_action = action;
        }
        if let Some(action) = env.string("SWIPE_LEFT_ACTION") {
            self.overlay.swipe_left_action = action;
        }
        if let Some(hide) = env.parse::<bool>("HIDE_ON_TOUCH_OUTSIDE", "overlay.hide_on_touch_outside")? {
            self.overlay.hide_on_touch_outside = hide;
        }
        if let Some(top) = env.parse::<bool>("SHOW_AT_TOP", "overlay.show_at_top")? {
            self.overlay.show_at_top = top;
        }
        if let Some(emoticons) = env.parse::<bool>("EMOTICONS", "overlay.emoticons")? {
            self.overlay.emoticons = emoticons;
        }
        if let Some(delay) = env.duration("TOUCH_SENSITIVITY_DELAY", "overlay.touch_sensitivity_delay")? {
            self.overlay.touch_sensitivity_delay = delay;
        }
        if let Some(slop) = env.parse::<f32>("TOUCH_SLOP", "gesture.touch_slop")? {
            self.gesture.touch_slop = slop;
        }
        if let Some(density) = env.parse::<f32>("DENSITY_SCALE", "gesture.density_scale")? {
            self.gesture.density_scale = density;
        }
        if let Some(identity) = env.string("IDENTITY") {
            self.engine.identity = identity;
        }
        if let Some(package) = env.string("OWN_PACKAGE") {
            self.engine.own_package = package;
        }
        if let Some(size) = env.parse::<usize>("BRAND_COLOR_CACHE_SIZE", "engine.brand_color_cache_size")? {
            self.engine.brand_color_cache_size = size;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        let swipe_right_action = SwipeAction::from_str(&self.overlay.swipe_right_action)
            .map_err(|err| invalid("overlay.swipe_right_action", err))?;
        let swipe_left_action = SwipeAction::from_str(&self.overlay.swipe_left_action)
            .map_err(|err| invalid("overlay.swipe_left_action", err))?;

        if self.overlay.decay_time > MAX_DECAY_TIME {
            return Err(invalid(
                "overlay.decay_time",
                format!(
                    "expected at most {}, got {}",
                    humantime::format_duration(MAX_DECAY_TIME),
                    humantime::format_duration(self.overlay.decay_time)
                ),
            )
            .into());
        }
        if !(self.gesture.touch_slop.is_finite() && self.gesture.touch_slop > 0.0) {
            return Err(invalid("gesture.touch_slop", "touch slop must be greater than zero").into());
        }
        if !(self.gesture.density_scale.is_finite() && self.gesture.density_scale > 0.0) {
            return Err(
                invalid("gesture.density_scale", "density scale must be greater than zero").into(),
            );
        }

        let identity = IdentityScheme::from_str(&self.engine.identity)
            .map_err(|err| invalid("engine.identity", err))?;

        let own_package = self.engine.own_package.trim().to_string();
        if own_package.is_empty() {
            return Err(ConfigError::MissingField {
                field: "engine.own_package",
            }
            .into());
        }

        let brand_color_cache_size = NonZeroUsize::new(self.engine.brand_color_cache_size)
            .ok_or_else(|| {
                invalid(
                    "engine.brand_color_cache_size",
                    "cache size must be greater than zero",
                )
            })?;

        Ok(Config {
            overlay: OverlaySettings {
                enabled: self.overlay.enabled,
                decay_time: self.overlay.decay_time,
                swipe_right_action,
                swipe_left_action,
                hide_on_touch_outside: self.overlay.hide_on_touch_outside,
                show_at_top: self.overlay.show_at_top,
                emoticons: self.overlay.emoticons,
                touch_sensitivity_delay: self.overlay.touch_sensitivity_delay,
                gesture: GestureConfig {
                    touch_slop: self.gesture.touch_slop,
                    density_scale: self.gesture.density_scale,
                },
            },
            identity,
            own_package,
            brand_color_cache_size,
        })
    }
}

impl Default for RawOverlay {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            decay_time: default_decay_time(),
            swipe_right_action: default_swipe_right_action(),
            swipe_left_action: default_swipe_left_action(),
            hide_on_touch_outside: default_hide_on_touch_outside(),
            show_at_top: default_show_at_top(),
            emoticons: false,
            touch_sensitivity_delay: default_touch_sensitivity_delay(),
        }
    }
}

impl Default for RawGesture {
    fn default() -> Self {
        Self {
            touch_slop: default_touch_slop(),
            density_scale: default_density_scale(),
        }
    }
}

impl Default for RawEngine {
    fn default() -> Self {
        Self {
            identity: default_identity(),
            own_package: default_own_package(),
            brand_color_cache_size: default_cache_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RawConfig;
    use crate::config::env::EnvOverrides;
    use crate::config::{Config, OverlaySettings};
    use crate::error::{ConfigError, Error};
    use crate::notification::IdentityScheme;
    use crate::types::SwipeAction;
    use std::time::Duration;

    fn build(raw: RawConfig) -> Config {
        match raw.validate_and_build() {
            Ok(config) => config,
            Err(err) => panic!("config should validate: {err}"),
        }
    }

    fn invalid_field(raw: RawConfig) -> &'static str {
        match raw.validate_and_build() {
            Err(Error::Config(ConfigError::InvalidField { field, .. })) => field,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("config should be rejected"),
        }
    }

    #[test]
    fn defaults_match_overlay_defaults() {
        let config = build(RawConfig::default());
        assert_eq!(config.overlay, OverlaySettings::default());
        assert_eq!(config.identity, IdentityScheme::SourceKey);
        assert_eq!(config.brand_color_cache_size.get(), 64);
    }

    #[test]
    fn swipe_actions_accept_numeric_codes() {
        let mut raw = RawConfig::default();
        raw.overlay.swipe_right_action = "1".to_string();
        raw.overlay.swipe_left_action = "0".to_string();
        let config = build(raw);
        assert_eq!(config.overlay.swipe_right_action, SwipeAction::Hide);
        assert_eq!(config.overlay.swipe_left_action, SwipeAction::Dismiss);
    }

    #[test]
    fn rejects_unknown_swipe_action() {
        let mut raw = RawConfig::default();
        raw.overlay.swipe_left_action = "7".to_string();
        assert_eq!(invalid_field(raw), "overlay.swipe_left_action");
    }

    #[test]
    fn rejects_non_positive_gesture_values() {
        let mut raw = RawConfig::default();
        raw.gesture.touch_slop = 0.0;
        assert_eq!(invalid_field(raw), "gesture.touch_slop");

        let mut raw = RawConfig::default();
        raw.gesture.density_scale = f32::NAN;
        assert_eq!(invalid_field(raw), "gesture.density_scale");
    }

    #[test]
    fn rejects_zero_cache_and_unknown_identity() {
        let mut raw = RawConfig::default();
        raw.engine.brand_color_cache_size = 0;
        assert_eq!(invalid_field(raw), "engine.brand_color_cache_size");

        let mut raw = RawConfig::default();
        raw.engine.identity = "uuid".to_string();
        assert_eq!(invalid_field(raw), "engine.identity");
    }

    #[test]
    fn env_overrides_apply_on_top_of_file_values() {
        fn fake(name: &str) -> Option<String> {
            match name {
                "HEADSUP_DECAY_TIME" => Some("2s".to_string()),
                "HEADSUP_IDENTITY" => Some("package_tag_id".to_string()),
                "HEADSUP_SWIPE_RIGHT_ACTION" => Some("hide".to_string()),
                _ => None,
            }
        }

        let mut raw = RawConfig::default();
        if let Err(err) = raw.apply_overrides(&EnvOverrides::with_lookup(fake)) {
            panic!("overrides should apply: {err}");
        }
        let config = build(raw);
        assert_eq!(config.overlay.decay_time, Duration::from_secs(2));
        assert_eq!(config.identity, IdentityScheme::PackageTagId);
        assert_eq!(config.overlay.swipe_right_action, SwipeAction::Hide);
    }
}
