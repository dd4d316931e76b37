//! Temperature to color mapping.
//!
//! A raw reading is first placed inside the configured thresholds as a
//! 0-100 "delta", which is then turned into a green → yellow → red ramp.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Delta reported when the thresholds do not describe a usable range.
pub const NEUTRAL_DELTA: i32 = 50;

/// 8-bit RGB color.
///
/// # Example
///
/// ```
/// use shroud_ledd::temperature::Rgb;
///
/// let red = Rgb::new(255, 0, 0);
/// assert_eq!(Rgb::from_packed(red.packed()), red);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs the color as `0x00RRGGBB`.
    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn from_packed(value: u32) -> Self {
        Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Normalizes `current` into `0..=100` relative to `lower..upper`.
///
/// Returns [`NEUTRAL_DELTA`] for an empty or inverted range and for any
/// arithmetic overflow. The adjusted reading is capped at `upper` (not at
/// the width of the range), so the result only saturates at 100 once the
/// reading is well past `upper` unless `lower` is zero.
///
/// # Example
///
/// ```
/// use shroud_ledd::temperature::delta;
///
/// assert_eq!(delta(45, 85, 45), 0);
/// assert_eq!(delta(45, 85, 65), 50);
/// assert_eq!(delta(45, 85, 85), 100);
/// assert_eq!(delta(10, 5, 70), 50);
/// ```
pub fn delta(lower: i32, upper: i32, current: i32) -> i32 {
    let (Some(difference), Some(adjusted)) =
        (upper.checked_sub(lower), current.checked_sub(lower))
    else {
        return NEUTRAL_DELTA;
    };

    if difference <= 0 {
        return NEUTRAL_DELTA;
    }

    if adjusted <= 0 {
        return 0;
    }

    let adjusted = adjusted.min(upper);
    let ratio = adjusted as f32 / difference as f32 * 100.0;
    if !ratio.is_finite() {
        return NEUTRAL_DELTA;
    }

    (ratio.round_ties_even() as i32).clamp(0, 100)
}

/// Color shown for a given delta: green at 0, yellow around 50, red at 100.
pub fn color_for(delta: i32) -> Rgb {
    Rgb::new(red_for(delta), green_for(delta), 0)
}

fn red_for(delta: i32) -> u8 {
    let percent = delta as f32 / 100.0;
    channel(percent * 255.0 * 2.0)
}

fn green_for(delta: i32) -> u8 {
    let percent = delta as f32 / 100.0;
    channel((255.0 - percent * 255.0) * 2.0)
}

fn channel(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Last temperature sample taken by a zone in temperature mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureSample {
    pub celsius: i32,
    pub delta: i32,
    pub color: Rgb,
}

impl TemperatureSample {
    pub fn from_reading(lower: i32, upper: i32, celsius: i32) -> Self {
        let delta = delta(lower, upper, celsius);
        Self {
            celsius,
            delta,
            color: color_for(delta),
        }
    }
}
