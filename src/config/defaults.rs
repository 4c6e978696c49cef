use std::num::NonZeroUsize;
use std::time::Duration;

pub(super) const fn default_enabled() -> bool {
    true
}

pub(super) const fn default_decay_time() -> Duration {
    Duration::from_secs(5)
}

pub(super) fn default_swipe_right_action() -> String {
    "dismiss".to_string()
}

pub(super) fn default_swipe_left_action() -> String {
    "hide".to_string()
}

pub(super) const fn default_hide_on_touch_outside() -> bool {
    true
}

pub(super) const fn default_show_at_top() -> bool {
    true
}

pub(super) const fn default_touch_sensitivity_delay() -> Duration {
    Duration::from_millis(300)
}

pub(super) const fn default_touch_slop() -> f32 {
    16.0
}

pub(super) const fn default_density_scale() -> f32 {
    1.0
}

pub(super) fn default_identity() -> String {
    "source_key".to_string()
}

pub(super) fn default_own_package() -> String {
    "com.achep.headsup".to_string()
}

pub(super) const fn default_brand_color_cache_size() -> NonZeroUsize {
    NonZeroUsize::MIN.saturating_add(63)
}
