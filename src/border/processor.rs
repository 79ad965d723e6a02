use log::debug;

use crate::border::{BlackBorder, BorderConfig, BorderDetector, BorderMode};
use crate::image::Image;

/// Stateful black border processor
///
/// Wraps a [`BorderDetector`] and debounces its per-frame result:
/// 1. a deviating border must persist for more than `max_inconsistent_cnt`
///    frames before it replaces the previously detected border;
/// 2. the previously detected border becomes current once it was confirmed
///    `unknown_switch_cnt` (no border) or `border_switch_cnt` (known border)
///    consecutive times.
#[derive(Debug, Clone)]
pub struct BorderProcessor {
    detector: BorderDetector,
    config: BorderConfig,

    user_enabled: bool,
    hard_disabled: bool,

    current_border: BlackBorder,
    previous_detected_border: BlackBorder,
    consistent_cnt: u32,
    inconsistent_cnt: u32,
}

impl BorderProcessor {
    pub fn new(config: &BorderConfig) -> Self {
        Self {
            detector: BorderDetector::new(config.threshold),
            config: config.clone(),
            user_enabled: config.enable,
            hard_disabled: false,
            current_border: BlackBorder::UNKNOWN,
            previous_detected_border: BlackBorder::UNKNOWN,
            consistent_cnt: 0,
            inconsistent_cnt: 0,
        }
    }

    /// Apply a new configuration
    ///
    /// The detector is rebuilt when the threshold changed. Stabilization
    /// state starts over.
    pub fn set_config(&mut self, config: &BorderConfig) {
        if libm::fabs(config.threshold - self.config.threshold) > f64::EPSILON {
            self.detector = BorderDetector::new(config.threshold);
            debug!(
                "[BorderProcessor] threshold changed to {} ({})",
                config.threshold,
                self.detector.threshold()
            );
        }
        self.config = config.clone();
        self.user_enabled = config.enable;
        self.reset();
    }

    pub const fn config(&self) -> &BorderConfig {
        &self.config
    }

    pub const fn mode(&self) -> BorderMode {
        self.config.mode
    }

    /// User toggle
    pub fn set_enabled(&mut self, enable: bool) {
        if self.user_enabled != enable {
            debug!("[BorderProcessor] user enable: {}", enable);
        }
        self.user_enabled = enable;
        self.config.enable = enable;
    }

    /// System override
    ///
    /// Disabling always wins. Lifting the override only re-enables
    /// processing if the user enabled it.
    pub fn set_hard_disable(&mut self, disable: bool) {
        if self.hard_disabled != disable {
            debug!("[BorderProcessor] hard disable: {}", disable);
        }
        self.hard_disabled = disable;
    }

    pub const fn enabled(&self) -> bool {
        self.user_enabled && !self.hard_disabled
    }

    /// The stabilized border
    pub const fn current_border(&self) -> BlackBorder {
        self.current_border
    }

    /// Process one frame
    ///
    /// Returns `true` if the stabilized border changed. While disabled the
    /// border is forced to unknown and every call reports a change.
    pub fn process(&mut self, image: &Image) -> bool {
        if !self.enabled() {
            self.current_border = BlackBorder::UNKNOWN;
            return true;
        }

        let mut border = self.detector.detect(image, self.config.mode);
        if !border.unknown {
            if border.horizontal_size > 0 {
                border.horizontal_size += self.config.blur_remove_cnt;
            }
            if border.vertical_size > 0 {
                border.vertical_size += self.config.blur_remove_cnt;
            }
        }

        self.update_border(border)
    }

    fn update_border(&mut self, detected: BlackBorder) -> bool {
        if detected == self.previous_detected_border {
            self.consistent_cnt = self.consistent_cnt.saturating_add(1);
            self.inconsistent_cnt = 0;
        } else {
            self.inconsistent_cnt = self.inconsistent_cnt.saturating_add(1);
            if self.inconsistent_cnt <= self.config.max_inconsistent_cnt {
                // A few stray frames, keep confirming the previous border
                return false;
            }
            self.previous_detected_border = detected;
            self.consistent_cnt = 0;
            self.inconsistent_cnt = 0;
        }

        if self.current_border == detected {
            self.inconsistent_cnt = 0;
            return false;
        }

        let switch_cnt = if detected.unknown {
            self.config.unknown_switch_cnt
        } else {
            self.config.border_switch_cnt
        };
        if self.consistent_cnt != switch_cnt {
            return false;
        }

        debug!(
            "[BorderProcessor] border changed: unknown={} horizontal={} vertical={}",
            detected.unknown, detected.horizontal_size, detected.vertical_size
        );
        self.current_border = detected;
        true
    }

    fn reset(&mut self) {
        self.current_border = BlackBorder::UNKNOWN;
        self.previous_detected_border = BlackBorder::UNKNOWN;
        self.consistent_cnt = 0;
        self.inconsistent_cnt = 0;
    }
}
