use crate::border::{BlackBorder, BorderMode};
use crate::color::Rgb;
use crate::image::Image;

/// Convert a threshold fraction into an 8-bit channel limit
pub fn calculate_threshold(fraction: f64) -> u8 {
    let threshold = libm::ceil(fraction * 255.0);
    if threshold <= 0.0 {
        0
    } else if threshold >= 255.0 {
        255
    } else {
        threshold as u8
    }
}

/// Stateless per-frame black border detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderDetector {
    threshold: u8,
}

impl BorderDetector {
    /// Create a detector for the given threshold fraction
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: calculate_threshold(threshold),
        }
    }

    /// Channel limit below which a pixel counts as black
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    #[inline]
    pub const fn is_black(&self, color: Rgb) -> bool {
        color.r < self.threshold && color.g < self.threshold && color.b < self.threshold
    }

    /// Run the detection algorithm selected by `mode`
    pub fn detect(&self, image: &Image, mode: BorderMode) -> BlackBorder {
        if image.width() < 3 || image.height() < 3 {
            return BlackBorder::UNKNOWN;
        }
        match mode {
            BorderMode::Default => self.process(image),
            BorderMode::Classic => self.process_classic(image),
            BorderMode::Osd => self.process_osd(image),
            BorderMode::Letterbox => self.process_letterbox(image),
        }
    }

    #[inline]
    fn is_content(&self, image: &Image, x: usize, y: usize) -> bool {
        !self.is_black(image.pixel(x, y))
    }

    /// First column (from the left) holding content
    ///
    /// Samples the 33% and 66% rows from the left and the center row from the
    /// right edge.
    fn scan_x(&self, image: &Image) -> Option<usize> {
        let width33 = image.width() / 3;
        let height33 = image.height() / 3;
        let height66 = height33 * 2;
        let y_center = image.height() / 2;
        let last_x = image.width() - 1;

        (0..width33).find(|&x| {
            self.is_content(image, last_x - x, y_center)
                || self.is_content(image, x, height33)
                || self.is_content(image, x, height66)
        })
    }

    /// Default detection: symmetric line sampling from both directions
    pub fn process(&self, image: &Image) -> BlackBorder {
        let width33 = image.width() / 3;
        let width66 = width33 * 2;
        let height33 = image.height() / 3;
        let x_center = image.width() / 2;
        let last_y = image.height() - 1;

        let first_x = self.scan_x(image);
        let first_y = (0..height33).find(|&y| {
            self.is_content(image, x_center, last_y - y)
                || self.is_content(image, width33, y)
                || self.is_content(image, width66, y)
        });

        to_border(first_x, first_y)
    }

    /// Classic detection: diagonal walk through the top-left third
    ///
    /// The first non-black pixel on the diagonal is then extended to the left
    /// and upwards while its neighbours are still content.
    pub fn process_classic(&self, image: &Image) -> BlackBorder {
        let width = image.width() / 3;
        let height = image.height() / 3;
        let max_size = width.max(height);

        let hit = (0..max_size)
            .map(|i| (i.min(width), i.min(height)))
            .find(|&(x, y)| self.is_content(image, x, y));

        let Some((mut x, mut y)) = hit else {
            return BlackBorder::UNKNOWN;
        };

        while x > 0 && self.is_content(image, x - 1, y) {
            x -= 1;
        }
        while y > 0 && self.is_content(image, x, y - 1) {
            y -= 1;
        }

        BlackBorder::known(y, x)
    }

    /// OSD-tolerant detection
    ///
    /// Finds the column like [`process`](Self::process), then looks for the
    /// row at that column in all four corners at once, so an overlay in one
    /// corner cannot shrink the border on its own.
    pub fn process_osd(&self, image: &Image) -> BlackBorder {
        let width33 = image.width() / 3;
        let height33 = image.height() / 3;
        let last_x = image.width() - 1;
        let last_y = image.height() - 1;

        let first_x = self.scan_x(image);
        let x = first_x.unwrap_or(width33);
        let first_y = (0..height33).find(|&y| {
            self.is_content(image, x, y)
                || self.is_content(image, x, last_y - y)
                || self.is_content(image, last_x - x, y)
                || self.is_content(image, last_x - x, last_y - y)
        });

        to_border(first_x, first_y)
    }

    /// Letterbox detection: top/bottom bars only
    ///
    /// The center column is only checked from the top, subtitles usually sit
    /// in the bottom center.
    pub fn process_letterbox(&self, image: &Image) -> BlackBorder {
        let width25 = image.width() / 4;
        let width75 = width25 * 3;
        let x_center = image.width() / 2;
        let height33 = image.height() / 3;
        let last_y = image.height() - 1;

        let first_y = (0..height33).find(|&y| {
            self.is_content(image, x_center, y)
                || self.is_content(image, width25, y)
                || self.is_content(image, width75, y)
                || self.is_content(image, width25, last_y - y)
                || self.is_content(image, width75, last_y - y)
        });

        match first_y {
            Some(y) => BlackBorder::known(y, 0),
            None => BlackBorder::UNKNOWN,
        }
    }
}

const fn to_border(first_x: Option<usize>, first_y: Option<usize>) -> BlackBorder {
    match (first_x, first_y) {
        (Some(x), Some(y)) => BlackBorder::known(y, x),
        _ => BlackBorder::UNKNOWN,
    }
}
