//! Brand-color extraction from application icons.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

const MIN_ALPHA: u32 = 0x80;
const MIN_SATURATION: f32 = 0.35;
const MIN_LUMA: f32 = 0.3;
const TARGET_LUMA: f32 = 0.5;
const MAX_LUMA: f32 = 0.7;
const WEIGHT_SATURATION: f32 = 0.24;
const WEIGHT_LUMA: f32 = 0.52;
const WEIGHT_POPULATION: f32 = 0.24;

/// Packed `0xAARRGGBB` color.
#[derive(Clone, Copy, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn alpha(self) -> u32 {
        self.0 >> 24
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        let [_, r, g, b] = self.0.to_be_bytes();
        (r, g, b)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// Decoded ARGB image.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Bitmap {
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let len = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            pixels: vec![color.0; len],
        }
    }
}

#[derive(Default)]
struct Bucket {
    population: u32,
    r: u64,
    g: u64,
    b: u64,
}

/// Most vibrant color of a bitmap, if any swatch is saturated enough and of
/// medium lightness.
pub fn vibrant(bitmap: &Bitmap) -> Option<Color> {
    let mut buckets: HashMap<u32, Bucket> = HashMap::new();
    for &pixel in &bitmap.pixels {
        let color = Color(pixel);
        if color.alpha() < MIN_ALPHA {
            continue;
        }
        let (r, g, b) = color.rgb();
        let key = (u32::from(r >> 3) << 10) | (u32::from(g >> 3) << 5) | u32::from(b >> 3);
        let bucket = buckets.entry(key).or_default();
        bucket.population += 1;
        bucket.r += u64::from(r);
        bucket.g += u64::from(g);
        bucket.b += u64::from(b);
    }

    let max_population = buckets.values().map(|bucket| bucket.population).max()?;
    let mut best: Option<(f32, Color)> = None;
    for bucket in buckets.values() {
        let population = u64::from(bucket.population);
        let average = |sum: u64| u8::try_from(sum / population).unwrap_or(u8::MAX);
        let color = Color::from_rgb(average(bucket.r), average(bucket.g), average(bucket.b));
        let (saturation, luma) = saturation_and_lightness(color);
        if saturation < MIN_SATURATION || !(MIN_LUMA..=MAX_LUMA).contains(&luma) {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let share = bucket.population as f32 / max_population as f32;
        let score = WEIGHT_SATURATION * saturation
            + WEIGHT_LUMA * (1.0 - (luma - TARGET_LUMA).abs())
            + WEIGHT_POPULATION * share;
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, color));
        }
    }
    best.map(|(_, color)| color)
}

/// HSL saturation and lightness in `0.0..=1.0`.
fn saturation_and_lightness(color: Color) -> (f32, f32) {
    let (r, g, b) = color.rgb();
    let [r, g, b] = [r, g, b].map(|channel| f32::from(channel) / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lightness = (max + min) / 2.0;
    if (max - min).abs() <= f32::EPSILON {
        return (0.0, lightness);
    }
    let delta = max - min;
    let saturation = delta / (1.0 - (2.0f32.mul_add(lightness, -1.0)).abs());
    (saturation, lightness)
}
