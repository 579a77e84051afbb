//! Linear color handling with hex parsing, HSL conversion and sanitization.

// Allow small types passed by reference for API consistency
#![allow(clippy::trivially_copy_pass_by_ref)]
// Allow intentional type casts for color math
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Coerces a loosely-typed channel value into a float.
///
/// Numbers pass through, numeric strings are parsed, anything else
/// (missing, null, booleans, garbage strings, NaN) becomes `0.0`.
pub fn sanitize_channel(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// A four-channel floating point color as stored in asset documents.
///
/// Channels are unbounded: emissive colors routinely exceed 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearColor {
    /// Red channel
    #[serde(rename = "R")]
    pub r: f64,
    /// Green channel
    #[serde(rename = "G")]
    pub g: f64,
    /// Blue channel
    #[serde(rename = "B")]
    pub b: f64,
    /// Alpha channel
    #[serde(rename = "A")]
    pub a: f64,
}

impl LinearColor {
    /// Creates a new `LinearColor` from individual channel values.
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Reads the `R`/`G`/`B`/`A` fields of a JSON object, sanitizing each.
    ///
    /// Non-objects yield an all-zero color.
    pub fn from_json(value: &Value) -> Self {
        Self {
            r: sanitize_channel(value.get("R")),
            g: sanitize_channel(value.get("G")),
            b: sanitize_channel(value.get("B")),
            a: sanitize_channel(value.get("A")),
        }
    }

    /// Largest of the three color channels.
    #[must_use]
    pub fn intensity(&self) -> f64 {
        self.r.max(self.g).max(self.b)
    }

    /// True when all three color channels are exactly equal.
    #[must_use]
    pub fn is_grayscale(&self) -> bool {
        self.r == self.g && self.g == self.b
    }

    /// Returns a copy with new RGB channels and the original alpha.
    #[must_use]
    pub const fn with_rgb(&self, r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: self.a }
    }

    /// Hex string suitable for a color swatch.
    ///
    /// HDR values are normalized by `max(R, G, B, 1.0)` so the hue survives.
    ///
    /// # Examples
    ///
    /// ```
    /// use rvfxe::models::LinearColor;
    ///
    /// let color = LinearColor::new(2.0, 1.0, 0.0, 1.0);
    /// assert_eq!(color.display_hex(), "#ff8000");
    /// ```
    #[must_use]
    pub fn display_hex(&self) -> String {
        let max = self.intensity().max(1.0);
        let to_byte = |c: f64| (c / max * 255.0).round().clamp(0.0, 255.0) as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b)
        )
    }

    /// Converts the RGB channels to HSL.
    ///
    /// Channels are first normalized by `max(R, G, B, 1.0)`.
    ///
    /// # Returns
    ///
    /// A tuple `(h, s, l)` with every component in `0.0..=1.0`
    /// (hue is a fraction of a full turn, 0.0 for grayscale).
    #[must_use]
    pub fn to_hsl(&self) -> (f64, f64, f64) {
        let max_val = self.intensity().max(1.0);
        let (r, g, b) = (self.r / max_val, self.g / max_val, self.b / max_val);

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return (0.0, 0.0, l);
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        (h / 6.0, s, l)
    }

    /// Builds RGB channels from HSL components (each in `0.0..=1.0`).
    ///
    /// Alpha is set to 1.0.
    #[must_use]
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        if s == 0.0 {
            return Self::new(l, l, l, 1.0);
        }

        fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                return p + (q - p) * 6.0 * t;
            }
            if t < 1.0 / 2.0 {
                return q;
            }
            if t < 2.0 / 3.0 {
                return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
            }
            p
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Self::new(
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
            1.0,
        )
    }
}

impl Default for LinearColor {
    /// Default color is opaque black.
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

/// An sRGB picker color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    /// Red channel (0.0-1.0)
    pub r: f64,
    /// Green channel (0.0-1.0)
    pub g: f64,
    /// Blue channel (0.0-1.0)
    pub b: f64,
}

impl RgbColor {
    /// Creates a new `RgbColor` from individual channel values.
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parses an `RgbColor` from a hex string.
    ///
    /// Supports formats: "#RRGGBB", "RRGGBB", "#RGB", "RGB" (any case).
    ///
    /// # Examples
    ///
    /// ```
    /// use rvfxe::models::RgbColor;
    ///
    /// let color = RgbColor::from_hex("#00FF00").unwrap();
    /// assert_eq!(color, RgbColor::new(0.0, 1.0, 0.0));
    ///
    /// let color = RgbColor::from_hex("f00").unwrap();
    /// assert_eq!(color, RgbColor::new(1.0, 0.0, 0.0));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid hex color format.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        let digits = hex.strip_prefix('#').unwrap_or(hex);

        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => anyhow::bail!(
                "Invalid hex color format '{hex}'. Expected 3 or 6 hex digits (RGB or RRGGBB)"
            ),
        };

        let channel = |range: std::ops::Range<usize>, name: &str| -> Result<f64> {
            let byte = u8::from_str_radix(&expanded[range], 16)
                .context(format!("Invalid {name} channel in hex color '{hex}'"))?;
            Ok(f64::from(byte) / 255.0)
        };

        Ok(Self::new(
            channel(0..2, "red")?,
            channel(2..4, "green")?,
            channel(4..6, "blue")?,
        ))
    }

    /// Largest of the three channels.
    #[must_use]
    pub fn max_channel(&self) -> f64 {
        self.r.max(self.g).max(self.b)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_byte = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        write!(
            f,
            "#{:02X}{:02X}{:02X}",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b)
        )
    }
}
