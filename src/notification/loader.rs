//! Background icon and brand-color jobs.
//!
//! Jobs run off the control context and never touch an entity directly: each
//! result is handed to the [`AssetSink`] as an [`AssetUpdate`] tagged with
//! the load token of the entity that asked for it. The engine forwards the
//! update to the entity, which drops it if the token is stale.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use tokio::task::AbortHandle;
use tracing::debug;

use super::identity::{NotificationKey, RawNotification};
use super::palette::{Bitmap, Color, vibrant};
use crate::error::AssetError;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Fresh load token; unique for the process lifetime.
pub(crate) fn next_token() -> u64 {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

/// Blocking access to icons. Called from `spawn_blocking` workers.
pub trait AssetSource: Send + Sync {
    /// The small icon shipped with the notification.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetError`] when there is no decodable icon.
    fn notification_icon(&self, raw: &RawNotification) -> Result<Bitmap, AssetError>;

    /// The launcher icon of `package`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::PackageNotFound`] for unknown packages.
    fn application_icon(&self, package: &str) -> Result<Bitmap, AssetError>;
}

/// Couleurs de marque par package, partagées par toutes les entités d'un moteur.
#[derive(Clone)]
pub struct BrandColorCache {
    inner: Arc<Mutex<LruCache<String, Color>>>,
}

impl BrandColorCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn get(&self, package: &str) -> Option<Color> {
        let mut cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(package).copied()
    }

    pub fn insert(&self, package: &str, color: Color) {
        let mut cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        cache.put(package.to_string(), color);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for BrandColorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrandColorCache").field("len", &self.len()).finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AssetPayload {
    Icon(Arc<Bitmap>),
    BrandColor(Color),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssetUpdate {
    pub key: NotificationKey,
    pub token: u64,
    pub payload: AssetPayload,
}

pub type AssetSink = Arc<dyn Fn(AssetUpdate) + Send + Sync>;

/// Everything `NotificationEntity::load` needs from its environment.
#[derive(Clone)]
pub struct LoadContext {
    pub own_package: String,
    pub emoticons: bool,
    pub assets: Arc<dyn AssetSource>,
    pub brand_colors: BrandColorCache,
    pub sink: AssetSink,
}

impl fmt::Debug for LoadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadContext")
            .field("own_package", &self.own_package)
            .field("emoticons", &self.emoticons)
            .field("brand_colors", &self.brand_colors)
            .finish_non_exhaustive()
    }
}

/// Starts the icon job and the brand-color job. Returns immediately.
pub(crate) fn spawn_jobs(
    raw: &Arc<RawNotification>,
    key: &NotificationKey,
    token: u64,
    ctx: &LoadContext,
) -> Vec<AbortHandle> {
    vec![spawn_icon_job(raw, key, token, ctx), spawn_brand_color_job(raw, key, token, ctx)]
}

fn spawn_icon_job(
    raw: &Arc<RawNotification>,
    key: &NotificationKey,
    token: u64,
    ctx: &LoadContext,
) -> AbortHandle {
    let raw = Arc::clone(raw);
    let key = key.clone();
    let assets = Arc::clone(&ctx.assets);
    let sink = Arc::clone(&ctx.sink);
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || assets.notification_icon(&raw)).await;
        match result {
            Ok(Ok(bitmap)) => sink(AssetUpdate {
                key,
                token,
                payload: AssetPayload::Icon(Arc::new(bitmap)),
            }),
            Ok(Err(err)) => debug!(%key, error = %err, "notification icon unavailable"),
            Err(err) => debug!(%key, error = %err, "icon job did not complete"),
        }
    })
    .abort_handle()
}

fn spawn_brand_color_job(
    raw: &Arc<RawNotification>,
    key: &NotificationKey,
    token: u64,
    ctx: &LoadContext,
) -> AbortHandle {
    let package = raw.package.clone();
    let key = key.clone();
    let assets = Arc::clone(&ctx.assets);
    let cache = ctx.brand_colors.clone();
    let sink = Arc::clone(&ctx.sink);
    tokio::spawn(async move {
        let color = if let Some(color) = cache.get(&package) {
            Ok(color)
        } else {
            let lookup = package.clone();
            match tokio::task::spawn_blocking(move || {
                assets
                    .application_icon(&lookup)
                    .map(|icon| vibrant(&icon).unwrap_or(Color::WHITE))
            })
            .await
            {
                Ok(Ok(color)) => {
                    cache.insert(&package, color);
                    Ok(color)
                }
                Ok(Err(err)) => Err(err.to_string()),
                Err(err) => Err(err.to_string()),
            }
        };
        match color {
            Ok(color) => sink(AssetUpdate {
                key,
                token,
                payload: AssetPayload::BrandColor(color),
            }),
            Err(err) => debug!(%key, %package, error = %err, "brand color unavailable"),
        }
    })
    .abort_handle()
}

#[cfg(test)]
mod tests {
    use super::BrandColorCache;
    use crate::notification::Color;
    use std::num::NonZeroUsize;

    #[test]
    fn brand_color_cache_evicts_least_recent() {
        let cache = BrandColorCache::new(NonZeroUsize::MIN.saturating_add(1));
        cache.insert("a", Color::from_rgb(1, 0, 0));
        cache.insert("b", Color::from_rgb(2, 0, 0));
        assert_eq!(cache.get("a"), Some(Color::from_rgb(1, 0, 0)));
        cache.insert("c", Color::from_rgb(3, 0, 0));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.len(), 2);
        assert!(!cache.is_empty());
    }
}
