//! Precomputed pixel sets per LED

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use crate::color::{BLACK, Rgb};
use crate::image::Image;
use crate::mapping::{LedString, MAX_CLUSTER_ITERATIONS, MappingType};

/// Parameters the pixel sets were computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MapKey {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) horizontal_border: usize,
    pub(crate) vertical_border: usize,
    pub(crate) reduced_pixel_set_factor: usize,
    pub(crate) accuracy_level: u8,
}

/// Association between every LED and the image pixels that determine its color
///
/// Stores flat row-major pixel indices, so producing colors for a frame is a
/// lookup plus the reduction selected by [`MappingType`].
#[derive(Debug, Clone)]
pub struct ImageToLedMap {
    key: MapKey,
    cluster_count: usize,
    /// Sampled pixel indices per LED
    led_pixels: Vec<Vec<usize>>,
    /// Sampled pixel indices of the whole non-border area
    area_pixels: Vec<usize>,
}

impl ImageToLedMap {
    pub(crate) fn new(key: MapKey, leds: &LedString) -> Self {
        let step = key.reduced_pixel_set_factor.max(1);
        let x_offset = key.vertical_border;
        let y_offset = key.horizontal_border;
        let actual_width = key.width - 2 * x_offset;
        let actual_height = key.height - 2 * y_offset;

        let led_pixels = leds
            .iter()
            .map(|led| {
                if led.is_degenerate() {
                    return Vec::new();
                }
                let (min_x, max_x) =
                    index_span(x_offset, actual_width, led.min_x_frac, led.max_x_frac);
                let (min_y, max_y) =
                    index_span(y_offset, actual_height, led.min_y_frac, led.max_y_frac);

                let mut pixels = Vec::with_capacity(
                    (max_x - min_x).div_ceil(step) * (max_y - min_y).div_ceil(step),
                );
                for y in (min_y..max_y).step_by(step) {
                    for x in (min_x..max_x).step_by(step) {
                        pixels.push(y * key.width + x);
                    }
                }
                pixels
            })
            .collect();

        let mut area_pixels = Vec::new();
        for y in (y_offset..y_offset + actual_height).step_by(step) {
            for x in (x_offset..x_offset + actual_width).step_by(step) {
                area_pixels.push(y * key.width + x);
            }
        }

        Self {
            key,
            cluster_count: usize::from(key.accuracy_level.clamp(1, 4)) + 1,
            led_pixels,
            area_pixels,
        }
    }

    pub(crate) const fn key(&self) -> MapKey {
        self.key
    }

    pub const fn width(&self) -> usize {
        self.key.width
    }

    pub const fn height(&self) -> usize {
        self.key.height
    }

    pub const fn horizontal_border(&self) -> usize {
        self.key.horizontal_border
    }

    pub const fn vertical_border(&self) -> usize {
        self.key.vertical_border
    }

    pub fn led_count(&self) -> usize {
        self.led_pixels.len()
    }

    /// Sampled pixel indices of one LED
    pub fn led_pixels(&self, index: usize) -> Option<&[usize]> {
        self.led_pixels.get(index).map(Vec::as_slice)
    }

    /// Compute one color per LED
    pub fn colors(&self, image: &Image, mapping: MappingType) -> Vec<Rgb> {
        if mapping.is_unicolor() {
            let color = self.reduce(image, &self.area_pixels, mapping);
            return vec![color; self.led_count()];
        }
        self.led_pixels
            .iter()
            .map(|pixels| self.reduce(image, pixels, mapping))
            .collect()
    }

    fn reduce(&self, image: &Image, pixels: &[usize], mapping: MappingType) -> Rgb {
        match mapping {
            MappingType::MulticolorMean | MappingType::UnicolorMean => mean_color(image, pixels),
            MappingType::MulticolorMeanSquared => mean_color_squared(image, pixels),
            MappingType::DominantColor | MappingType::UnicolorDominant => {
                dominant_color(image, pixels)
            }
            MappingType::DominantColorAdvanced | MappingType::UnicolorDominantAdvanced => {
                dominant_color_advanced(image, pixels, self.cluster_count)
            }
        }
    }
}

/// Pixel index range `[min, max)` covered by a fractional span
fn index_span(offset: usize, actual: usize, min_frac: f64, max_frac: f64) -> (usize, usize) {
    let last = offset + actual - 1;
    let mut min = offset + libm::round(actual as f64 * min_frac) as usize;
    let mut max = offset + libm::round(actual as f64 * max_frac) as usize;

    min = min.min(last);
    if min == max {
        max += 1;
    }
    max = max.min(offset + actual);
    (min, max)
}

/// Truncating per-channel mean
pub(crate) fn mean_color(image: &Image, pixels: &[usize]) -> Rgb {
    if pixels.is_empty() {
        return BLACK;
    }
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for &index in pixels {
        let color = image.pixel_at(index);
        r += u64::from(color.r);
        g += u64::from(color.g);
        b += u64::from(color.b);
    }
    let count = pixels.len() as u64;
    Rgb::new((r / count) as u8, (g / count) as u8, (b / count) as u8)
}

/// Root mean square per channel
pub(crate) fn mean_color_squared(image: &Image, pixels: &[usize]) -> Rgb {
    if pixels.is_empty() {
        return BLACK;
    }
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for &index in pixels {
        let color = image.pixel_at(index);
        r += u64::from(color.r) * u64::from(color.r);
        g += u64::from(color.g) * u64::from(color.g);
        b += u64::from(color.b) * u64::from(color.b);
    }
    let count = pixels.len() as f64;
    let channel = |sum: u64| libm::round(libm::sqrt(sum as f64 / count)).min(255.0) as u8;
    Rgb::new(channel(r), channel(g), channel(b))
}

#[inline]
fn pack(color: Rgb) -> u32 {
    (u32::from(color.r) << 16) | (u32::from(color.g) << 8) | u32::from(color.b)
}

/// Most frequent exact color; the first color to reach the top count wins
pub(crate) fn dominant_color(image: &Image, pixels: &[usize]) -> Rgb {
    let mut histogram: BTreeMap<u32, u32> = BTreeMap::new();
    let mut dominant = BLACK;
    let mut dominant_count = 0;

    for &index in pixels {
        let color = image.pixel_at(index);
        let count = histogram.entry(pack(color)).or_insert(0);
        *count += 1;
        if *count > dominant_count {
            dominant_count = *count;
            dominant = color;
        }
    }
    dominant
}

/// Mean of the most populated k-means cluster
///
/// Clusters are seeded with the first distinct colors of the region.
pub(crate) fn dominant_color_advanced(image: &Image, pixels: &[usize], clusters: usize) -> Rgb {
    if pixels.is_empty() {
        return BLACK;
    }

    let mut centers: Vec<[f32; 3]> = Vec::with_capacity(clusters);
    let mut seeds: Vec<Rgb> = Vec::with_capacity(clusters);
    for &index in pixels {
        if seeds.len() == clusters {
            break;
        }
        let color = image.pixel_at(index);
        if !seeds.contains(&color) {
            seeds.push(color);
            centers.push([f32::from(color.r), f32::from(color.g), f32::from(color.b)]);
        }
    }

    let mut counts = vec![0usize; centers.len()];
    for _ in 0..MAX_CLUSTER_ITERATIONS {
        let mut sums = vec![[0f32; 3]; centers.len()];
        counts.iter_mut().for_each(|count| *count = 0);

        for &index in pixels {
            let color = image.pixel_at(index);
            let nearest = nearest_center(&centers, color);
            sums[nearest][0] += f32::from(color.r);
            sums[nearest][1] += f32::from(color.g);
            sums[nearest][2] += f32::from(color.b);
            counts[nearest] += 1;
        }

        let mut moved = false;
        for (center, (sum, &count)) in centers.iter_mut().zip(sums.iter().zip(counts.iter())) {
            if count == 0 {
                continue;
            }
            let next = [
                sum[0] / count as f32,
                sum[1] / count as f32,
                sum[2] / count as f32,
            ];
            if next != *center {
                *center = next;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    let mut best = 0;
    for (index, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = index;
        }
    }
    let center = centers[best];
    let channel = |value: f32| libm::roundf(value).clamp(0.0, 255.0) as u8;
    Rgb::new(channel(center[0]), channel(center[1]), channel(center[2]))
}

fn nearest_center(centers: &[[f32; 3]], color: Rgb) -> usize {
    let pixel = [f32::from(color.r), f32::from(color.g), f32::from(color.b)];
    let mut nearest = 0;
    let mut nearest_distance = f32::MAX;
    for (index, center) in centers.iter().enumerate() {
        let distance: f32 = center
            .iter()
            .zip(pixel.iter())
            .map(|(c, p)| (c - p) * (c - p))
            .sum();
        if distance < nearest_distance {
            nearest_distance = distance;
            nearest = index;
        }
    }
    nearest
}
