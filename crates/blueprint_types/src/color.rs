// Colors for on-screen text
//
// `LinearColor` is what graph pins carry; `Color` is the quantized sRGB value
// the overlay draws with.

use serde::{Deserialize, Serialize};

/// Linear-space RGBA color with float channels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl LinearColor {
    pub const WHITE: LinearColor = LinearColor::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: LinearColor = LinearColor::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: LinearColor = LinearColor::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: LinearColor = LinearColor::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: LinearColor = LinearColor::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Quantize to 8 bits, encoding RGB with the sRGB curve when `srgb` is set.
    /// Alpha is always linear.
    pub fn to_color(&self, srgb: bool) -> Color {
        let encode = |c: f32| {
            let c = c.clamp(0.0, 1.0);
            if !srgb {
                c
            } else if c <= 0.003_130_8 {
                c * 12.92
            } else {
                1.055 * c.powf(1.0 / 2.4) - 0.055
            }
        };
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;

        Color {
            r: quantize(encode(self.r)),
            g: quantize(encode(self.g)),
            b: quantize(encode(self.b)),
            a: quantize(self.a),
        }
    }
}

impl Default for LinearColor {
    fn default() -> Self {
        LinearColor::BLUE
    }
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Hex form "#RRGGBBAA"
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}
