use alloc::string::String;
use alloc::vec::Vec;

use embassy_time::Instant;

use crate::color::Rgb;

/// Priority of a color source; lower values win
pub type Priority = u8;

/// Reserved foreground slot (boot effect, system overlays)
pub const FG_PRIORITY: Priority = 1;
/// Reserved background slot (background effect / color)
pub const BG_PRIORITY: Priority = 254;
/// Permanent fallback slot, shows black
pub const LOWEST_PRIORITY: Priority = 255;

/// Origin of the fallback slot
pub const SYSTEM_ORIGIN: &str = "System";

/// Category of the component that registered a priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentKind {
    All,
    Smoothing,
    BlackBorder,
    Forwarder,
    Boblight,
    Grabber,
    V4L,
    Audio,
    #[default]
    Color,
    Effect,
    Image,
    FlatBufServer,
    ProtoServer,
    LedDevice,
}

impl ComponentKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Smoothing => "smoothing",
            Self::BlackBorder => "blackborder",
            Self::Forwarder => "forwarder",
            Self::Boblight => "boblightserver",
            Self::Grabber => "grabber",
            Self::V4L => "v4l",
            Self::Audio => "audio",
            Self::Color => "color",
            Self::Effect => "effect",
            Self::Image => "image",
            Self::FlatBufServer => "flatbufserver",
            Self::ProtoServer => "protoserver",
            Self::LedDevice => "leddevice",
        }
    }
}

/// State of one registered priority
#[derive(Debug, Clone, PartialEq)]
pub struct InputInfo {
    pub priority: Priority,
    pub component: ComponentKind,
    pub origin: String,
    pub owner: Option<String>,
    /// Absolute expiry; `None` never expires
    pub timeout_at: Option<Instant>,
    pub colors: Vec<Rgb>,
    pub smoothing_cfg: u32,
    /// Inactive inputs stay registered but are never visible
    pub active: bool,
}

impl InputInfo {
    pub(crate) fn new(
        priority: Priority,
        component: ComponentKind,
        origin: String,
        owner: Option<String>,
        smoothing_cfg: u32,
    ) -> Self {
        Self {
            priority,
            component,
            origin,
            owner,
            timeout_at: None,
            colors: Vec::new(),
            smoothing_cfg,
            active: true,
        }
    }

    /// Whether the input is expired at `now`
    pub fn is_expired(&self, now: Instant) -> bool {
        self.timeout_at.is_some_and(|at| at <= now)
    }
}
