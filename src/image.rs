//! Captured frame buffer

use alloc::vec;
use alloc::vec::Vec;

use crate::color::Rgb;

/// Row-major RGB image as delivered by a capture backend
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Image {
    /// Create an image filled with a single color
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Wrap existing pixel data
    ///
    /// Returns `None` if `pixels` does not hold exactly `width * height` entries.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgb>) -> Option<Self> {
        if pixels.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel at `(x, y)`; callers keep coordinates in bounds
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    /// Pixel by flat row-major index
    #[inline]
    pub fn pixel_at(&self, index: usize) -> Rgb {
        self.pixels[index]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        let width = self.width;
        self.pixels[y * width + x] = color;
    }

    /// Fill the rectangle `[x0, x1) x [y0, y1)`, clipped to the image
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, color: Rgb) {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.set_pixel(x, y, color);
            }
        }
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }
}
