use crate::error::ConfigError;

/// Config of the `smoothing` settings section
pub const SMOOTHING_CFG_SYSTEM: u32 = 0;
/// Pauses output
pub const SMOOTHING_CFG_PAUSE: u32 = 1;
/// Timing requested dynamically by effects
pub const SMOOTHING_CFG_EFFECT_DYNAMIC: u32 = 2;
/// Timing declared by a specific effect
pub const SMOOTHING_CFG_EFFECT_SPECIFIC: u32 = 3;

/// Upper bound for the output delay FIFO
pub const MAX_OUTPUT_DELAY_FRAMES: usize = 16;

const KIND_NAME_LINEAR: &str = "linear";
const KIND_NAME_DECAY: &str = "decay";

/// Interpolation algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SmoothingKind {
    /// Straight line from the last written frame to the target
    #[default]
    Linear,
    /// Decay-weighted moving average over the settling window
    Decay,
}

impl SmoothingKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => KIND_NAME_LINEAR,
            Self::Decay => KIND_NAME_DECAY,
        }
    }

    pub fn parse_from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            KIND_NAME_LINEAR => Ok(Self::Linear),
            KIND_NAME_DECAY => Ok(Self::Decay),
            _ => Err(ConfigError::UnknownSmoothingKind),
        }
    }
}

/// User facing smoothing settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SmoothingConfig {
    pub enable: bool,
    pub kind: SmoothingKind,
    pub settling_time_ms: u32,
    pub update_frequency_hz: f64,
    pub output_delay_frames: usize,
    pub interpolation_rate_hz: f64,
    pub output_rate_hz: f64,
    pub dithering: bool,
    pub decay: f64,
    pub pause: bool,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enable: true,
            kind: SmoothingKind::Linear,
            settling_time_ms: 200,
            update_frequency_hz: 25.0,
            output_delay_frames: 0,
            interpolation_rate_hz: 25.0,
            output_rate_hz: 25.0,
            dithering: false,
            decay: 1.0,
            pause: false,
        }
    }
}

/// One selectable smoothing configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingCfg {
    pub pause: bool,
    pub settling_time_ms: u32,
    pub update_interval_ms: u32,
    pub kind: SmoothingKind,
    pub output_rate_hz: f64,
    pub interpolation_rate_hz: f64,
    pub output_delay_frames: usize,
    pub dithering: bool,
    pub decay: f64,
}

impl SmoothingCfg {
    /// Linear config with output and interpolation paced by the update rate
    pub fn linear(settling_time_ms: u32, update_frequency_hz: f64, output_delay_frames: usize) -> Self {
        let frequency = sanitize_rate(update_frequency_hz);
        Self {
            pause: false,
            settling_time_ms,
            update_interval_ms: interval_ms(frequency),
            kind: SmoothingKind::Linear,
            output_rate_hz: frequency,
            interpolation_rate_hz: frequency,
            output_delay_frames: output_delay_frames.min(MAX_OUTPUT_DELAY_FRAMES),
            dithering: false,
            decay: 1.0,
        }
    }

    /// Config that suspends output
    pub fn paused() -> Self {
        Self {
            pause: true,
            ..Self::linear(0, 25.0, 0)
        }
    }

    pub fn from_config(config: &SmoothingConfig) -> Self {
        let update = sanitize_rate(config.update_frequency_hz);
        Self {
            pause: config.pause,
            settling_time_ms: config.settling_time_ms,
            update_interval_ms: interval_ms(update),
            kind: config.kind,
            output_rate_hz: sanitize_rate(config.output_rate_hz),
            interpolation_rate_hz: sanitize_rate(config.interpolation_rate_hz),
            output_delay_frames: config.output_delay_frames.min(MAX_OUTPUT_DELAY_FRAMES),
            dithering: config.dithering,
            decay: if config.decay > 0.0 { config.decay } else { 1.0 },
        }
    }
}

fn sanitize_rate(hz: f64) -> f64 {
    if hz.is_finite() && hz > 0.0 { hz } else { 25.0 }
}

fn interval_ms(hz: f64) -> u32 {
    (libm::round(1000.0 / hz) as u32).max(1)
}
