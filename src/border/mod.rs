//! Black border (letterbox / pillarbox) detection
//!
//! [`BorderDetector`] inspects a single frame. [`BorderProcessor`] stabilizes
//! the per-frame result over time so LEDs do not flicker when a scene fades
//! to black or the grabber delivers a stray frame.

mod detector;
mod processor;

pub use detector::{BorderDetector, calculate_threshold};
pub use processor::BorderProcessor;

use crate::error::ConfigError;

const MODE_NAME_DEFAULT: &str = "default";
const MODE_NAME_CLASSIC: &str = "classic";
const MODE_NAME_OSD: &str = "osd";
const MODE_NAME_LETTERBOX: &str = "letterbox";

/// Detected black border around the image content
///
/// `horizontal_size` is the height of the top and bottom bars,
/// `vertical_size` the width of the left and right bars.
#[derive(Debug, Clone, Copy, Eq)]
pub struct BlackBorder {
    pub unknown: bool,
    pub horizontal_size: usize,
    pub vertical_size: usize,
}

impl BlackBorder {
    /// Border state when nothing could be detected
    pub const UNKNOWN: Self = Self {
        unknown: true,
        horizontal_size: 0,
        vertical_size: 0,
    };

    /// A known border with the given bar sizes
    pub const fn known(horizontal_size: usize, vertical_size: usize) -> Self {
        Self {
            unknown: false,
            horizontal_size,
            vertical_size,
        }
    }
}

impl Default for BlackBorder {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// Two unknown borders are equal regardless of their sizes
impl PartialEq for BlackBorder {
    fn eq(&self, other: &Self) -> bool {
        if self.unknown {
            return other.unknown;
        }
        !other.unknown
            && self.horizontal_size == other.horizontal_size
            && self.vertical_size == other.vertical_size
    }
}

/// Detection algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BorderMode {
    /// Symmetric sampling at 33%, 66% and the center lines
    #[default]
    Default,
    /// Diagonal scan through the top-left third
    Classic,
    /// Corner-aware scan that tolerates on-screen display overlays
    Osd,
    /// Top/bottom bars only
    Letterbox,
}

impl BorderMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => MODE_NAME_DEFAULT,
            Self::Classic => MODE_NAME_CLASSIC,
            Self::Osd => MODE_NAME_OSD,
            Self::Letterbox => MODE_NAME_LETTERBOX,
        }
    }

    pub fn parse_from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            MODE_NAME_DEFAULT => Ok(Self::Default),
            MODE_NAME_CLASSIC => Ok(Self::Classic),
            MODE_NAME_OSD => Ok(Self::Osd),
            MODE_NAME_LETTERBOX => Ok(Self::Letterbox),
            _ => Err(ConfigError::UnknownBorderMode),
        }
    }
}

/// Configuration of the black border processor
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BorderConfig {
    /// User toggle
    pub enable: bool,
    /// Blackness threshold as a fraction of full scale (0.0 - 1.0)
    pub threshold: f64,
    /// Detection algorithm
    pub mode: BorderMode,
    /// Frames an unknown border must persist before it becomes current
    pub unknown_switch_cnt: u32,
    /// Frames a known border must persist before it becomes current
    pub border_switch_cnt: u32,
    /// Deviating frames tolerated before a new border is taken seriously
    pub max_inconsistent_cnt: u32,
    /// Pixels added to each detected bar to hide capture blur
    pub blur_remove_cnt: usize,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            enable: true,
            threshold: 0.05,
            mode: BorderMode::Default,
            unknown_switch_cnt: 600,
            border_switch_cnt: 50,
            max_inconsistent_cnt: 10,
            blur_remove_cnt: 1,
        }
    }
}
