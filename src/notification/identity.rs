use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One action button of a notification.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RawAction {
    pub title: String,
}

/// Snapshot of a notification as delivered by the feed.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct RawNotification {
    pub package: String,
    pub tag: Option<String>,
    pub id: i32,
    /// Owning user, only known to newer feeds.
    pub user: Option<i32>,
    /// Feed-assigned key, only known to newer feeds.
    pub key: Option<String>,
    pub title: Option<String>,
    pub title_big: Option<String>,
    pub text: Option<String>,
    pub big_text: Option<String>,
    pub text_lines: Vec<String>,
    pub info_text: Option<String>,
    pub sub_text: Option<String>,
    pub summary_text: Option<String>,
    pub actions: Vec<RawAction>,
    pub priority: i32,
    pub ongoing: bool,
    pub no_clear: bool,
    pub number: u32,
}

impl RawNotification {
    pub fn new(package: impl Into<String>, id: i32) -> Self {
        Self {
            package: package.into(),
            id,
            ..Self::default()
        }
    }
}

/// Stable identity of a notification, independent of its content.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NotificationKey {
    pub package: String,
    pub tag: Option<String>,
    pub id: i32,
    pub user: Option<i32>,
    pub source_key: Option<String>,
}

impl Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key) = &self.source_key {
            return f.write_str(key);
        }
        write!(f, "{}:{}:{}", self.package, self.tag.as_deref().unwrap_or("-"), self.id)
    }
}

/// How identities are built from raw snapshots. Chosen once per engine from
/// what the feed can provide.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IdentityScheme {
    /// Package, tag and id plus the owning user and feed key when present.
    #[default]
    SourceKey,
    /// Package, tag and id only, for feeds without user or key data.
    PackageTagId,
}

impl IdentityScheme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SourceKey => "source_key",
            Self::PackageTagId => "package_tag_id",
        }
    }

    pub fn key_for(self, raw: &RawNotification) -> NotificationKey {
        let (user, source_key) = match self {
            Self::SourceKey => (raw.user, raw.key.clone()),
            Self::PackageTagId => (None, None),
        };
        NotificationKey {
            package: raw.package.clone(),
            tag: raw.tag.clone(),
            id: raw.id,
            user,
            source_key,
        }
    }
}

impl Display for IdentityScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "source_key" => Ok(Self::SourceKey),
            "package_tag_id" => Ok(Self::PackageTagId),
            other => Err(format!("unknown identity scheme: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IdentityScheme, RawNotification};
    use std::str::FromStr;

    fn raw(tag: Option<&str>, user: Option<i32>) -> RawNotification {
        RawNotification {
            tag: tag.map(str::to_string),
            user,
            key: user.map(|user| format!("{user}|com.example.mail|7")),
            title: Some("Inbox".into()),
            ..RawNotification::new("com.example.mail", 7)
        }
    }

    #[test]
    fn content_does_not_affect_identity() {
        let scheme = IdentityScheme::SourceKey;
        let mut changed = raw(Some("inbox"), Some(0));
        changed.title = Some("2 new messages".into());
        assert_eq!(scheme.key_for(&raw(Some("inbox"), Some(0))), scheme.key_for(&changed));
    }

    #[test]
    fn source_key_scheme_separates_users() {
        let scheme = IdentityScheme::SourceKey;
        assert_ne!(scheme.key_for(&raw(None, Some(0))), scheme.key_for(&raw(None, Some(10))));

        let legacy = IdentityScheme::PackageTagId;
        assert_eq!(legacy.key_for(&raw(None, Some(0))), legacy.key_for(&raw(None, Some(10))));
    }

    #[test]
    fn tag_is_part_of_identity() {
        let scheme = IdentityScheme::PackageTagId;
        assert_ne!(scheme.key_for(&raw(Some("a"), None)), scheme.key_for(&raw(Some("b"), None)));
        assert_eq!(scheme.key_for(&raw(Some("a"), None)).to_string(), "com.example.mail:a:7");
    }

    #[test]
    fn scheme_names_parse() {
        assert_eq!(IdentityScheme::from_str("package_tag_id"), Ok(IdentityScheme::PackageTagId));
        assert_eq!(IdentityScheme::from_str(IdentityScheme::SourceKey.as_str()), Ok(IdentityScheme::SourceKey));
        assert!(IdentityScheme::from_str("uuid").is_err());
    }
}
