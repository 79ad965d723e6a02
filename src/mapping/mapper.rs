use alloc::vec;
use alloc::vec::Vec;

use log::{debug, warn};

use crate::border::BlackBorder;
use crate::color::Rgb;
use crate::error::ConfigError;
use crate::image::Image;
use crate::mapping::leds_map::MapKey;
use crate::mapping::{ImageToLedMap, LedString, MappingConfig, MappingType, ScanRect};

/// Converts captured images into per-LED colors
///
/// Owns the LED geometry and a cached [`ImageToLedMap`]. The cache is keyed by
/// image size, border sizes, pixel reduction and accuracy level, and is
/// rebuilt only when one of them (or the LED string) changes.
#[derive(Debug, Clone)]
pub struct LedMapper {
    leds: LedString,
    user_mapping_type: MappingType,
    hard_mapping_type: Option<MappingType>,
    reduced_pixel_set_factor: usize,
    accuracy_level: u8,

    map: Option<ImageToLedMap>,
    mapping_changed: bool,
}

impl LedMapper {
    pub fn new(leds: LedString, config: &MappingConfig) -> Self {
        Self {
            leds,
            user_mapping_type: config.mapping_type,
            hard_mapping_type: None,
            reduced_pixel_set_factor: config.reduced_pixel_set_factor.max(1),
            accuracy_level: config.accuracy_level.clamp(1, 4),
            map: None,
            mapping_changed: false,
        }
    }

    /// Apply a new configuration, keeping any hard override in place
    pub fn set_config(&mut self, config: &MappingConfig) {
        self.set_mapping_type(config.mapping_type);
        self.reduced_pixel_set_factor = config.reduced_pixel_set_factor.max(1);
        self.accuracy_level = config.accuracy_level.clamp(1, 4);
    }

    pub const fn led_string(&self) -> &LedString {
        &self.leds
    }

    pub fn led_count(&self) -> usize {
        self.leds.len()
    }

    /// Replace the LED geometry
    ///
    /// The mapping is rebuilt right away for the last seen image size.
    pub fn set_led_string(&mut self, leds: LedString) {
        debug!("[LedMapper] led string replaced ({} leds)", leds.len());
        self.leds = leds;
        if let Some(key) = self.map.as_ref().map(ImageToLedMap::key) {
            self.map = Some(ImageToLedMap::new(key, &self.leds));
        }
        self.mapping_changed = true;
    }

    /// Effective mapping type: the hard override if set, else the user choice
    pub const fn mapping_type(&self) -> MappingType {
        match self.hard_mapping_type {
            Some(mapping) => mapping,
            None => self.user_mapping_type,
        }
    }

    pub const fn user_mapping_type(&self) -> MappingType {
        self.user_mapping_type
    }

    pub const fn hard_mapping_type(&self) -> Option<MappingType> {
        self.hard_mapping_type
    }

    /// User requested mapping type
    ///
    /// Remembered even while a hard override is active.
    pub fn set_mapping_type(&mut self, mapping: MappingType) {
        let previous = self.mapping_type();
        self.user_mapping_type = mapping;
        self.note_type_change(previous);
    }

    /// User requested mapping type by its configuration name
    ///
    /// Unknown names fall back to `multicolor_mean` and report the error.
    pub fn set_mapping_type_str(&mut self, name: &str) -> Result<(), ConfigError> {
        match MappingType::parse_from_str(name) {
            Ok(mapping) => {
                self.set_mapping_type(mapping);
                Ok(())
            }
            Err(err) => {
                warn!("[LedMapper] unknown mapping type '{}', using multicolor_mean", name);
                self.set_mapping_type(MappingType::MulticolorMean);
                Err(err)
            }
        }
    }

    /// System override; `None` restores the user choice
    pub fn set_hard_mapping_type(&mut self, mapping: Option<MappingType>) {
        let previous = self.mapping_type();
        self.hard_mapping_type = mapping;
        self.note_type_change(previous);
    }

    fn note_type_change(&mut self, previous: MappingType) {
        let current = self.mapping_type();
        if current != previous {
            debug!("[LedMapper] mapping type: {}", current.as_str());
            self.mapping_changed = true;
        }
    }

    pub fn set_reduced_pixel_set_factor(&mut self, factor: usize) {
        self.reduced_pixel_set_factor = factor.max(1);
    }

    pub fn set_accuracy_level(&mut self, level: u8) {
        self.accuracy_level = level.clamp(1, 4);
    }

    /// Fractional scan rectangle of a LED
    pub fn get_scan_parameters(&self, led: usize) -> Option<ScanRect> {
        self.leds.get(led).map(|led| led.scan_rect())
    }

    /// The cached mapping, if one was built
    pub const fn cached_map(&self) -> Option<&ImageToLedMap> {
        self.map.as_ref()
    }

    /// Returns `true` once after the mapping or its type changed
    pub fn take_mapping_changed(&mut self) -> bool {
        core::mem::take(&mut self.mapping_changed)
    }

    /// Compute one color per LED, excluding the given border
    ///
    /// Always yields exactly one color per LED; an empty image maps to black.
    pub fn map(&mut self, image: &Image, border: BlackBorder) -> Vec<Rgb> {
        if image.is_empty() {
            warn!("[LedMapper] called with an empty image");
            return vec![Rgb::default(); self.leds.len()];
        }

        let key = self.key_for(image, border);
        if self.map.as_ref().map(ImageToLedMap::key) != Some(key) {
            debug!(
                "[LedMapper] rebuilding mapping {}x{} border h={} v={}",
                key.width, key.height, key.horizontal_border, key.vertical_border
            );
            self.map = Some(ImageToLedMap::new(key, &self.leds));
            self.mapping_changed = true;
        }

        let mapping = self.mapping_type();
        match &self.map {
            Some(map) => map.colors(image, mapping),
            None => vec![Rgb::default(); self.leds.len()],
        }
    }

    fn key_for(&self, image: &Image, border: BlackBorder) -> MapKey {
        let (mut horizontal, mut vertical) = if border.unknown {
            (0, 0)
        } else {
            (border.horizontal_size, border.vertical_size)
        };
        // A border eating the whole frame is a detection glitch
        if image.width() <= 2 * vertical || image.height() <= 2 * horizontal {
            horizontal = 0;
            vertical = 0;
        }
        MapKey {
            width: image.width(),
            height: image.height(),
            horizontal_border: horizontal,
            vertical_border: vertical,
            reduced_pixel_set_factor: self.reduced_pixel_set_factor,
            accuracy_level: self.accuracy_level,
        }
    }
}
