//! JSON-lines replay scripts.
//!
//! One step per line; blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"step":"posted","notification":{"package":"com.chat","id":1,"title":"Ann","text":"hi :)"}}
//! {"step":"setting","key":"ui_emoticons","value":true,"delay":"500ms"}
//! {"step":"removed","notification":{"package":"com.chat","id":1},"delay":2000}
//! ```

use std::time::Duration;

use headsup::Result;
use headsup::config::MillisOrHumantime;
use headsup::error::Error;
use headsup::notification::RawNotification;
use headsup::overlay::EngineHandle;
use headsup::types::{SettingChange, SettingValue};
use serde::Deserialize;
use serde_with::serde_as;
use tokio::time::sleep;
use tracing::{debug, info};

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct Step {
    /// Wait before this step, relative to the previous one.
    #[serde_as(as = "Option<MillisOrHumantime>")]
    pub delay: Option<Duration>,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Action {
    Posted { notification: RawNotification },
    Changed { notification: RawNotification },
    Removed { notification: RawNotification },
    Batch,
    Suppress,
    Allow,
    Setting { key: String, value: SettingValue },
    Hide {
        #[serde(default)]
        immediately: bool,
    },
}

/// Parses a whole script.
///
/// # Errors
///
/// Returns [`Error::Script`] naming the first line that does not parse.
pub fn parse(text: &str) -> Result<Vec<Step>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|err| Error::Script {
                line: index + 1,
                message: err.to_string(),
            })
        })
        .collect()
}

/// Feeds every step to the engine, honoring delays divided by `speed`.
///
/// # Errors
///
/// Fails once the engine has stopped accepting commands.
pub async fn play(steps: Vec<Step>, engine: &EngineHandle, speed: f64) -> Result<()> {
    let total = steps.len();
    for (index, step) in steps.into_iter().enumerate() {
        if let Some(delay) = step.delay.filter(|delay| !delay.is_zero()) {
            sleep(delay.div_f64(speed)).await;
        }
        debug!(step = index + 1, total, action = ?step.action, "replaying step");
        send(step.action, engine)?;
    }
    info!(total, "script finished");
    Ok(())
}

fn send(action: Action, engine: &EngineHandle) -> Result<()> {
    match action {
        Action::Posted { notification } => engine.posted(notification),
        Action::Changed { notification } => engine.changed(notification),
        Action::Removed { notification } => engine.removed(&notification),
        Action::Batch => engine.batch(),
        Action::Suppress => engine.suppress(),
        Action::Allow => engine.allow(),
        Action::Setting { key, value } => engine.setting_changed(SettingChange::new(key, value)),
        Action::Hide { immediately } => engine.hide(immediately),
    }
}
