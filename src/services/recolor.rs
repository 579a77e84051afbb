//! Color transforms behind the bulk editing operations.
//!
//! These are pure functions over single colors; the session applies them to
//! its selection and records the result in history.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{ColorParameter, LinearColor, RgbColor};

/// Switches shared by every bulk edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOptions {
    /// Keep each parameter's original brightness, taking only the hue of the new color
    pub preserve_intensity: bool,
    /// Leave parameters with R == G == B untouched
    pub ignore_grayscale: bool,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            preserve_intensity: true,
            ignore_grayscale: true,
        }
    }
}

impl EditOptions {
    fn skips(&self, color: &LinearColor) -> bool {
        self.ignore_grayscale && color.is_grayscale()
    }
}

/// Replaces the RGB channels of `color` with `target`. Alpha is kept.
///
/// With `preserve_intensity` the target is rescaled so its largest channel
/// equals the original intensity; a black original or black target gives
/// black.
///
/// # Examples
///
/// ```
/// use rvfxe::models::{LinearColor, RgbColor};
/// use rvfxe::services::recolor::{apply_color, EditOptions};
///
/// let original = LinearColor::new(0.8, 0.2, 0.2, 1.0);
/// let green = RgbColor::from_hex("#00FF00").unwrap();
/// let result = apply_color(original, green, EditOptions::default());
/// assert_eq!(result, LinearColor::new(0.0, 0.8, 0.0, 1.0));
/// ```
pub fn apply_color(color: LinearColor, target: RgbColor, opts: EditOptions) -> LinearColor {
    if opts.skips(&color) {
        return color;
    }

    if !opts.preserve_intensity {
        return color.with_rgb(target.r, target.g, target.b);
    }

    let intensity = color.intensity();
    let target_max = target.max_channel();
    if intensity <= 0.0 || target_max <= 0.0 {
        return color.with_rgb(0.0, 0.0, 0.0);
    }

    let scale = intensity / target_max;
    color.with_rgb(target.r * scale, target.g * scale, target.b * scale)
}

/// Rotates the hue of `color` by `degrees`, keeping its intensity and alpha.
pub fn hue_shift(color: LinearColor, degrees: f64, opts: EditOptions) -> LinearColor {
    if opts.skips(&color) {
        return color;
    }

    let intensity = color.intensity();
    if intensity <= 0.0 {
        return color;
    }

    let normalized = color.with_rgb(color.r / intensity, color.g / intensity, color.b / intensity);
    let (h, s, l) = normalized.to_hsl();
    let shifted = LinearColor::from_hsl((h + degrees / 360.0).rem_euclid(1.0), s, l);

    color.with_rgb(
        shifted.r * intensity,
        shifted.g * intensity,
        shifted.b * intensity,
    )
}

/// Assigns palette colors to the distinct owning files of `selected`,
/// round-robin in list order.
///
/// Returns an empty map for an empty palette.
pub fn shuffle_assignments<'p>(
    selected: impl IntoIterator<Item = &'p ColorParameter>,
    palette: &[RgbColor],
) -> HashMap<String, RgbColor> {
    let mut assignments = HashMap::new();
    if palette.is_empty() {
        return assignments;
    }

    for param in selected {
        if !assignments.contains_key(&param.relative_path) {
            let color = palette[assignments.len() % palette.len()];
            assignments.insert(param.relative_path.clone(), color);
        }
    }
    assignments
}
