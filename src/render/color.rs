//! Color mapping for the choropleth and its legend.

use std::fmt;

use crate::render::Domain;

/// Simple RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self { Self { r, g, b } }

    /// CSS hex form, e.g. `#fc8d59`.
    pub fn to_hex(&self) -> String { format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b) }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| -> u8 {
            (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb { r: mix(self.r, other.r), g: mix(self.g, other.g), b: mix(self.b, other.b) }
    }
}

impl fmt::Display for Rgb {
    /// Format as CSS: rgb(r,g,b)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Fill for counties without a usable value. Gray, so it never reads as a
/// point on the orange-red ramp.
pub const NO_DATA: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);

/// ColorBrewer OrRd, 9 classes, light to dark.
const OR_RD: [Rgb; 9] = [
    Rgb::new(0xff, 0xf7, 0xec),
    Rgb::new(0xfe, 0xe8, 0xc8),
    Rgb::new(0xfd, 0xd4, 0x9e),
    Rgb::new(0xfd, 0xbb, 0x84),
    Rgb::new(0xfc, 0x8d, 0x59),
    Rgb::new(0xef, 0x65, 0x48),
    Rgb::new(0xd7, 0x30, 0x1f),
    Rgb::new(0xb3, 0x00, 0x00),
    Rgb::new(0x7f, 0x00, 0x00),
];

/// Piecewise-linear interpolation through the OrRd stops, `t` in [0, 1].
pub fn interpolate_or_rd(t: f64) -> Rgb {
    if !t.is_finite() { return NO_DATA }
    let t = t.clamp(0.0, 1.0);

    let segments = (OR_RD.len() - 1) as f64;
    let pos = t * segments;
    let lo = (pos.floor() as usize).min(OR_RD.len() - 2);
    OR_RD[lo].lerp(OR_RD[lo + 1], pos - lo as f64)
}

/// Sequential color scale over a reconfigurable domain.
///
/// Shared by the renderer and the legend so both agree on what a color means.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorScale {
    domain: Option<Domain>,
}

impl ColorScale {
    pub fn new(domain: Option<Domain>) -> Self { Self { domain } }

    pub fn domain(&self) -> Option<Domain> { self.domain }

    pub fn set_domain(&mut self, domain: Option<Domain>) { self.domain = domain }

    /// Map a value to a color. Values outside the domain clamp to the ends;
    /// a degenerate domain (min == max) maps everything to the first stop.
    /// Without a domain, or for non-finite values, the answer is `NO_DATA`.
    pub fn color(&self, value: f64) -> Rgb {
        let Some(domain) = self.domain else { return NO_DATA };
        if !value.is_finite() { return NO_DATA }

        // Halved operands keep the span finite for domains near the f64 limits.
        let half_span = domain.max / 2.0 - domain.min / 2.0;
        let t = if half_span > 0.0 { (value / 2.0 - domain.min / 2.0) / half_span } else { 0.0 };
        interpolate_or_rd(t)
    }
}
