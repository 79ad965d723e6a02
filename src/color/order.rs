//! Per-LED channel ordering
//!
//! Strips are wired with different channel orders. The mapper keeps colors
//! in RGB; the instance reorders them when the visible colors are handed to
//! the output stage.

use crate::color::Rgb;
use crate::error::ConfigError;

/// Channel order of a physical LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ColorOrder {
    #[default]
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ColorOrder {
    /// Reorder channels so that `r`, `g`, `b` hold the bytes in wire order
    pub const fn apply(self, color: Rgb) -> Rgb {
        let Rgb { r, g, b } = color;
        match self {
            Self::Rgb => Rgb { r, g, b },
            Self::Rbg => Rgb { r, g: b, b: g },
            Self::Grb => Rgb { r: g, g: r, b },
            Self::Gbr => Rgb { r: g, g: b, b: r },
            Self::Brg => Rgb { r: b, g: r, b: g },
            Self::Bgr => Rgb { r: b, g, b: r },
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rgb => "rgb",
            Self::Rbg => "rbg",
            Self::Grb => "grb",
            Self::Gbr => "gbr",
            Self::Brg => "brg",
            Self::Bgr => "bgr",
        }
    }

    pub fn parse_from_str(s: &str) -> Result<Self, ConfigError> {
        Ok(match s {
            "rgb" => Self::Rgb,
            "rbg" => Self::Rbg,
            "grb" => Self::Grb,
            "gbr" => Self::Gbr,
            "brg" => Self::Brg,
            "bgr" => Self::Bgr,
            _ => return Err(ConfigError::InvalidValue("color order")),
        })
    }
}
