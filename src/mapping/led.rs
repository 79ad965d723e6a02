use alloc::vec::Vec;

use crate::color::ColorOrder;

/// Fractional image rectangle scanned for one LED
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanRect {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// A single physical LED and the image area it mirrors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Led {
    pub min_x_frac: f64,
    pub max_x_frac: f64,
    pub min_y_frac: f64,
    pub max_y_frac: f64,
    pub color_order: ColorOrder,
}

impl Led {
    /// Create a LED, clamping fractions to `[0, 1]` and swapping reversed bounds
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64, color_order: ColorOrder) -> Self {
        let (min_x, max_x) = ordered(clamp_fraction(min_x), clamp_fraction(max_x));
        let (min_y, max_y) = ordered(clamp_fraction(min_y), clamp_fraction(max_y));
        Self {
            min_x_frac: min_x,
            max_x_frac: max_x,
            min_y_frac: min_y,
            max_y_frac: max_y,
            color_order,
        }
    }

    /// Whether the LED covers no area at all
    pub fn is_degenerate(&self) -> bool {
        (self.max_x_frac - self.min_x_frac) < 1e-6 || (self.max_y_frac - self.min_y_frac) < 1e-6
    }

    pub const fn scan_rect(&self) -> ScanRect {
        ScanRect {
            min_x: self.min_x_frac,
            max_x: self.max_x_frac,
            min_y: self.min_y_frac,
            max_y: self.max_y_frac,
        }
    }
}

fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a > b { (b, a) } else { (a, b) }
}

/// Ordered LED geometry of one device
///
/// Replaced as a whole when the layout changes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedString {
    leds: Vec<Led>,
}

impl LedString {
    pub const fn new() -> Self {
        Self { leds: Vec::new() }
    }

    pub fn from_leds(leds: Vec<Led>) -> Self {
        Self { leds }
    }

    /// `count` LEDs side by side, each spanning an equal horizontal slice of
    /// the full image height
    pub fn horizontal_strip(count: usize) -> Self {
        let step = 1.0 / count.max(1) as f64;
        let leds = (0..count)
            .map(|i| {
                let start = i as f64 * step;
                Led::new(start, start + step, 0.0, 1.0, ColorOrder::Rgb)
            })
            .collect();
        Self { leds }
    }

    pub fn len(&self) -> usize {
        self.leds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leds.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Led> {
        self.leds.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Led> {
        self.leds.iter()
    }

    pub fn leds(&self) -> &[Led] {
        &self.leds
    }
}

impl<'a> IntoIterator for &'a LedString {
    type Item = &'a Led;
    type IntoIter = core::slice::Iter<'a, Led>;

    fn into_iter(self) -> Self::IntoIter {
        self.leds.iter()
    }
}
