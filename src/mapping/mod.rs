//! Image to LED color mapping
//!
//! Each LED covers a fractional rectangle of the captured image. The
//! [`LedMapper`] turns a frame into one color per LED, skipping the black
//! border reported by the border processor.

mod led;
mod leds_map;
mod mapper;

pub use led::{Led, LedString, ScanRect};
pub use leds_map::ImageToLedMap;
pub use mapper::LedMapper;

use crate::error::ConfigError;

const MAPPING_NAME_MULTICOLOR_MEAN: &str = "multicolor_mean";
const MAPPING_NAME_MULTICOLOR_MEAN_SQUARED: &str = "multicolor_mean_squared";
const MAPPING_NAME_UNICOLOR_MEAN: &str = "unicolor_mean";
const MAPPING_NAME_DOMINANT_COLOR: &str = "dominant_color";
const MAPPING_NAME_UNICOLOR_DOMINANT: &str = "unicolor_dominant";
const MAPPING_NAME_DOMINANT_COLOR_ADVANCED: &str = "dominant_color_advanced";
const MAPPING_NAME_UNICOLOR_DOMINANT_ADVANCED: &str = "unicolor_dominant_advanced";

/// Maximum number of k-means iterations for the advanced dominant color
pub(crate) const MAX_CLUSTER_ITERATIONS: usize = 10;

/// How the pixels assigned to a LED are reduced to one color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MappingType {
    /// Mean of each LED's own region
    #[default]
    MulticolorMean,
    /// Root mean square of each LED's region, favours bright pixels
    MulticolorMeanSquared,
    /// Mean of the whole frame, broadcast to every LED
    UnicolorMean,
    /// Most frequent color of each LED's region
    DominantColor,
    /// Most frequent color of the whole frame, broadcast to every LED
    UnicolorDominant,
    /// Largest k-means cluster of each LED's region
    DominantColorAdvanced,
    /// Largest k-means cluster of the whole frame, broadcast to every LED
    UnicolorDominantAdvanced,
}

impl MappingType {
    pub const ALL: [Self; 7] = [
        Self::MulticolorMean,
        Self::MulticolorMeanSquared,
        Self::UnicolorMean,
        Self::DominantColor,
        Self::UnicolorDominant,
        Self::DominantColorAdvanced,
        Self::UnicolorDominantAdvanced,
    ];

    /// Whether one color is computed for the whole frame
    pub const fn is_unicolor(self) -> bool {
        matches!(
            self,
            Self::UnicolorMean | Self::UnicolorDominant | Self::UnicolorDominantAdvanced
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MulticolorMean => MAPPING_NAME_MULTICOLOR_MEAN,
            Self::MulticolorMeanSquared => MAPPING_NAME_MULTICOLOR_MEAN_SQUARED,
            Self::UnicolorMean => MAPPING_NAME_UNICOLOR_MEAN,
            Self::DominantColor => MAPPING_NAME_DOMINANT_COLOR,
            Self::UnicolorDominant => MAPPING_NAME_UNICOLOR_DOMINANT,
            Self::DominantColorAdvanced => MAPPING_NAME_DOMINANT_COLOR_ADVANCED,
            Self::UnicolorDominantAdvanced => MAPPING_NAME_UNICOLOR_DOMINANT_ADVANCED,
        }
    }

    pub fn parse_from_str(s: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|mapping| mapping.as_str() == s)
            .ok_or(ConfigError::UnknownMappingType)
    }
}

/// Configuration of the LED mapper
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MappingConfig {
    /// User selected mapping type
    pub mapping_type: MappingType,
    /// Sample every n-th pixel on both axes (1 = every pixel)
    pub reduced_pixel_set_factor: usize,
    /// Cluster granularity of the advanced dominant color (1 - 4)
    pub accuracy_level: u8,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            mapping_type: MappingType::MulticolorMean,
            reduced_pixel_set_factor: 1,
            accuracy_level: 2,
        }
    }
}
