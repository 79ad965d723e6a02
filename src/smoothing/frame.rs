//! Float to 8-bit frame assembly

use alloc::vec::Vec;

use crate::color::Rgb;

/// Color with floating point channels on the 0-255 scale
pub type ColorF = [f32; 3];

pub(crate) fn to_color_f(color: Rgb) -> ColorF {
    [f32::from(color.r), f32::from(color.g), f32::from(color.b)]
}

#[inline]
fn quantize(value: f32) -> u8 {
    libm::roundf(value).clamp(0.0, 255.0) as u8
}

/// Round each channel to the nearest 8-bit value
pub fn assemble_frame(means: &[ColorF]) -> Vec<Rgb> {
    means
        .iter()
        .map(|mean| Rgb::new(quantize(mean[0]), quantize(mean[1]), quantize(mean[2])))
        .collect()
}

/// Error diffusion over time
///
/// Keeps the rounding error of every channel and adds it to the next frame,
/// so the time average of the output matches the unrounded input.
#[derive(Debug, Clone, Default)]
pub struct Ditherer {
    residuals: Vec<ColorF>,
}

impl Ditherer {
    pub const fn new() -> Self {
        Self {
            residuals: Vec::new(),
        }
    }

    /// Quantize `means`, carrying the per-channel residual to the next call
    pub fn assemble(&mut self, means: &[ColorF]) -> Vec<Rgb> {
        if self.residuals.len() != means.len() {
            self.residuals.clear();
            self.residuals.resize(means.len(), [0.0; 3]);
        }

        means
            .iter()
            .zip(self.residuals.iter_mut())
            .map(|(mean, residual)| {
                let mut out = [0u8; 3];
                for channel in 0..3 {
                    let value = mean[channel] + residual[channel];
                    out[channel] = quantize(value);
                    residual[channel] = value - f32::from(out[channel]);
                }
                Rgb::new(out[0], out[1], out[2])
            })
            .collect()
    }

    /// Current residual errors
    pub fn residuals(&self) -> &[ColorF] {
        &self.residuals
    }

    pub fn reset(&mut self) {
        self.residuals.clear();
    }
}
