use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a completed horizontal swipe on an entry does.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeAction {
    /// Dismiss the notification from the system feed.
    Dismiss,
    /// Only hide the entry from the overlay.
    Hide,
    /// Reserved; not implemented.
    Snooze,
}

impl SwipeAction {
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Dismiss),
            1 => Some(Self::Hide),
            2 => Some(Self::Snooze),
            _ => None,
        }
    }

    pub const fn as_code(self) -> i64 {
        match self {
            Self::Dismiss => 0,
            Self::Hide => 1,
            Self::Snooze => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dismiss => "dismiss",
            Self::Hide => "hide",
            Self::Snooze => "snooze",
        }
    }
}

impl Display for SwipeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwipeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown swipe action code {code}"));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "dismiss" => Ok(Self::Dismiss),
            "hide" => Ok(Self::Hide),
            "snooze" => Ok(Self::Snooze),
            other => Err(format!("unknown swipe action: {other}")),
        }
    }
}

/// Keys of the configuration-changed signal that the overlay reacts to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SettingKey {
    Enabled,
    DecayTime,
    SwipeRightAction,
    SwipeLeftAction,
    HideOnTouchOutside,
    ShowAtTop,
    Emoticons,
}

impl SettingKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::DecayTime => "behavior_notify_decay_time",
            Self::SwipeRightAction => "ux_str_action",
            Self::SwipeLeftAction => "ux_stl_action",
            Self::HideOnTouchOutside => "behavior_hide_on_touch",
            Self::ShowAtTop => "ui_at_top",
            Self::Emoticons => "ui_emoticons",
        }
    }

    /// Dotted field name used in configuration errors.
    pub const fn field(self) -> &'static str {
        match self {
            Self::Enabled => "overlay.enabled",
            Self::DecayTime => "overlay.decay_time",
            Self::SwipeRightAction => "overlay.swipe_right_action",
            Self::SwipeLeftAction => "overlay.swipe_left_action",
            Self::HideOnTouchOutside => "overlay.hide_on_touch_outside",
            Self::ShowAtTop => "overlay.show_at_top",
            Self::Emoticons => "overlay.emoticons",
        }
    }
}

impl Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(Self::Enabled),
            "behavior_notify_decay_time" => Ok(Self::DecayTime),
            "ux_str_action" => Ok(Self::SwipeRightAction),
            "ux_stl_action" => Ok(Self::SwipeLeftAction),
            "behavior_hide_on_touch" => Ok(Self::HideOnTouchOutside),
            "ui_at_top" => Ok(Self::ShowAtTop),
            "ui_emoticons" => Ok(Self::Emoticons),
            other => Err(format!("unknown setting key: {other}")),
        }
    }
}

/// Value carried by a configuration-changed signal.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Result<bool, String> {
        match self {
            Self::Bool(value) => Ok(*value),
            Self::Int(value) => Ok(*value != 0),
            Self::Text(text) => text
                .trim()
                .parse::<bool>()
                .map_err(|err| format!("expected a boolean, got {text:?}: {err}")),
        }
    }

    /// Integers are milliseconds; text goes through `humantime`.
    pub fn as_duration(&self) -> Result<Duration, String> {
        match self {
            Self::Int(ms) => u64::try_from(*ms)
                .map(Duration::from_millis)
                .map_err(|_| format!("duration cannot be negative: {ms}")),
            Self::Text(text) => {
                humantime::parse_duration(text.trim()).map_err(|err| err.to_string())
            }
            Self::Bool(value) => Err(format!("expected a duration, got {value}")),
        }
    }

    pub fn as_swipe_action(&self) -> Result<SwipeAction, String> {
        match self {
            Self::Int(code) => {
                SwipeAction::from_code(*code).ok_or_else(|| format!("unknown swipe action code {code}"))
            }
            Self::Text(text) => SwipeAction::from_str(text),
            Self::Bool(value) => Err(format!("expected a swipe action, got {value}")),
        }
    }
}

/// One configuration-changed signal.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SettingChange {
    pub key: String,
    pub value: SettingValue,
}

impl SettingChange {
    pub fn new(key: impl Into<String>, value: SettingValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}
