//! Temporal color smoothing
//!
//! Receives the visible source's frames as targets and produces a separately
//! paced output stream for the LED device. Two interpolation kinds exist:
//! - linear: moves from the last written frame towards the target so that
//!   the target is reached exactly when the settling time has passed;
//! - decay: a decay-weighted moving average over all frames received within
//!   the settling window.
//!
//! Output can be dithered (error diffusion) and delayed by a fixed number of
//! frames.

mod config;
mod frame;
mod output_queue;

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use embassy_time::{Duration, Instant};
use log::{debug, warn};

pub use config::{
    MAX_OUTPUT_DELAY_FRAMES, SMOOTHING_CFG_EFFECT_DYNAMIC, SMOOTHING_CFG_EFFECT_SPECIFIC,
    SMOOTHING_CFG_PAUSE, SMOOTHING_CFG_SYSTEM, SmoothingCfg, SmoothingConfig, SmoothingKind,
};
pub use frame::{ColorF, Ditherer, assemble_frame};
pub use output_queue::OutputQueue;

use crate::color::Rgb;
use crate::error::ConfigError;
use frame::to_color_f;

const MICROS_PER_MILLI: i64 = 1_000;
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Weight of a remembered frame inside the settling window
///
/// Arguments are `(frame_start, frame_end, window_start)` in microseconds,
/// with `frame_start` already clamped to the window.
pub type FrameWeighting = Box<dyn Fn(i64, i64, i64) -> f32>;

/// Default weighting for a settling window and decay exponent
///
/// With `decay == 1` the weight is proportional to the time the frame spent
/// inside the window. Larger exponents favour recent frames.
pub fn decay_weighting(settling_time_ms: u32, decay: f64) -> FrameWeighting {
    let window = i64::from(settling_time_ms) * MICROS_PER_MILLI;
    let inv_window = if window > 0 { 1.0 / window as f32 } else { 1.0 };
    let decay = decay as f32;

    if libm::fabsf(decay - 1.0) > f32::EPSILON {
        Box::new(move |frame_start, frame_end, window_start| {
            let start = inv_window * (frame_start - window_start) as f32;
            let end = inv_window * (frame_end - window_start) as f32;
            libm::powf(end, decay) - libm::powf(start, decay)
        })
    } else {
        Box::new(move |frame_start, frame_end, _| inv_window * (frame_end - frame_start) as f32)
    }
}

/// Target frame kept for the decay average
#[derive(Debug, Clone, PartialEq)]
pub struct RememberedFrame {
    pub time_us: i64,
    pub colors: Vec<Rgb>,
}

/// Temporal smoothing stage between the muxer and the LED device
pub struct ColorSmoothing {
    configs: Vec<SmoothingCfg>,
    current_config: u32,

    // Timing derived from the selected config
    kind: SmoothingKind,
    settling_time_us: i64,
    update_interval: Duration,
    output_interval_us: i64,
    interpolation_interval_us: i64,
    dithering: bool,
    decay: f64,
    weighting: FrameWeighting,

    enabled: bool,
    paused: bool,
    /// Decay timing anchors must be reset on the next tick
    restart_pending: bool,

    target_values: Vec<Rgb>,
    target_time_us: i64,
    previous_values: Vec<ColorF>,
    previous_write_time_us: i64,

    frames: VecDeque<RememberedFrame>,
    mean_values: Vec<ColorF>,
    previous_interpolation_time_us: i64,

    ditherer: Ditherer,
    output: OutputQueue,
}

impl ColorSmoothing {
    pub fn new(config: &SmoothingConfig) -> Self {
        let system = SmoothingCfg::from_config(config);
        let effect = SmoothingCfg::linear(
            system.settling_time_ms,
            1000.0 / f64::from(system.update_interval_ms),
            system.output_delay_frames,
        );
        let configs = alloc::vec![system, SmoothingCfg::paused(), effect.clone(), effect];

        let mut smoothing = Self {
            configs,
            current_config: SMOOTHING_CFG_SYSTEM,
            kind: SmoothingKind::Linear,
            settling_time_us: 0,
            update_interval: Duration::from_millis(40),
            output_interval_us: 40_000,
            interpolation_interval_us: 40_000,
            dithering: false,
            decay: 1.0,
            weighting: decay_weighting(0, 1.0),
            enabled: config.enable,
            paused: false,
            restart_pending: true,
            target_values: Vec::new(),
            target_time_us: 0,
            previous_values: Vec::new(),
            previous_write_time_us: 0,
            frames: VecDeque::new(),
            mean_values: Vec::new(),
            previous_interpolation_time_us: 0,
            ditherer: Ditherer::new(),
            output: OutputQueue::new(0),
        };
        smoothing.apply_config(SMOOTHING_CFG_SYSTEM);
        smoothing
    }

    /// Replace the system config with new user settings
    pub fn set_config(&mut self, config: &SmoothingConfig) {
        self.configs[SMOOTHING_CFG_SYSTEM as usize] = SmoothingCfg::from_config(config);
        self.set_enable(config.enable);
        if self.current_config == SMOOTHING_CFG_SYSTEM {
            self.apply_config(SMOOTHING_CFG_SYSTEM);
        }
    }

    /// Append a linear config and return its id
    pub fn add_config(
        &mut self,
        settling_time_ms: u32,
        update_frequency_hz: f64,
        output_delay_frames: usize,
    ) -> u32 {
        self.add_cfg(SmoothingCfg::linear(
            settling_time_ms,
            update_frequency_hz,
            output_delay_frames,
        ))
    }

    /// Append a fully specified config and return its id
    pub fn add_cfg(&mut self, cfg: SmoothingCfg) -> u32 {
        self.configs.push(cfg);
        let id = (self.configs.len() - 1) as u32;
        debug!("[ColorSmoothing] added config {}", id);
        id
    }

    /// Overwrite config `id`, or append a new one if it does not exist
    ///
    /// Returns the id the config was stored under. The active config is
    /// re-applied right away.
    pub fn update_config(
        &mut self,
        id: u32,
        settling_time_ms: u32,
        update_frequency_hz: f64,
        output_delay_frames: usize,
    ) -> u32 {
        let cfg = SmoothingCfg::linear(settling_time_ms, update_frequency_hz, output_delay_frames);
        let Some(slot) = self.configs.get_mut(id as usize) else {
            return self.add_cfg(cfg);
        };
        *slot = cfg;
        if id == self.current_config {
            self.apply_config(id);
        }
        id
    }

    pub fn config(&self, id: u32) -> Option<&SmoothingCfg> {
        self.configs.get(id as usize)
    }

    pub const fn current_config(&self) -> u32 {
        self.current_config
    }

    /// Activate config `id`
    ///
    /// Unknown ids fall back to the system config. The failure is reported
    /// unless `force` is set.
    pub fn select_config(&mut self, id: u32, force: bool) -> Result<(), ConfigError> {
        if id == self.current_config && !force {
            return Ok(());
        }
        if (id as usize) < self.configs.len() {
            self.apply_config(id);
            return Ok(());
        }

        warn!("[ColorSmoothing] unknown config {}, using system config", id);
        self.apply_config(SMOOTHING_CFG_SYSTEM);
        if force {
            Ok(())
        } else {
            Err(ConfigError::UnknownSmoothingConfig(id))
        }
    }

    fn apply_config(&mut self, id: u32) {
        let cfg = &self.configs[id as usize];
        self.kind = cfg.kind;
        self.settling_time_us = i64::from(cfg.settling_time_ms) * MICROS_PER_MILLI;
        self.update_interval = Duration::from_millis(u64::from(cfg.update_interval_ms.max(1)));
        self.output_interval_us = (MICROS_PER_SECOND / cfg.output_rate_hz) as i64;
        self.interpolation_interval_us = (MICROS_PER_SECOND / cfg.interpolation_rate_hz) as i64;
        self.dithering = cfg.dithering;
        self.decay = cfg.decay;
        self.paused = cfg.pause;
        self.weighting = decay_weighting(cfg.settling_time_ms, cfg.decay);
        self.output.set_delay(cfg.output_delay_frames);
        self.current_config = id;
        self.restart_pending = true;

        debug!(
            "[ColorSmoothing] selected config {}: {} settling={}ms interval={}ms delay={} dithering={} decay={}",
            id,
            self.kind.as_str(),
            cfg.settling_time_ms,
            cfg.update_interval_ms,
            cfg.output_delay_frames,
            self.dithering,
            self.decay
        );
    }

    /// Replace the frame weighting used by the decay average
    ///
    /// Selecting a config restores the default weighting.
    pub fn set_weighting(&mut self, weighting: impl Fn(i64, i64, i64) -> f32 + 'static) {
        self.weighting = Box::new(weighting);
    }

    pub const fn kind(&self) -> SmoothingKind {
        self.kind
    }

    /// Cadence at which [`tick`](Self::tick) is expected to run
    pub const fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Cadence the owner should tick at
    ///
    /// Decay mode needs the finer of its interpolation and output rates.
    pub fn tick_interval(&self) -> Duration {
        match self.kind {
            SmoothingKind::Linear => self.update_interval,
            SmoothingKind::Decay => {
                let micros = self
                    .interpolation_interval_us
                    .min(self.output_interval_us)
                    .max(1);
                Duration::from_micros(micros as u64)
            }
        }
    }

    pub const fn output_delay(&self) -> usize {
        self.output.delay()
    }

    pub const fn is_dithering(&self) -> bool {
        self.dithering
    }

    pub const fn enabled(&self) -> bool {
        self.enabled && !self.paused
    }

    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Enable or disable smoothing
    ///
    /// Disabling drops queued output and the remembered history.
    pub fn set_enable(&mut self, enable: bool) {
        if self.enabled == enable {
            return;
        }
        debug!("[ColorSmoothing] enabled: {}", enable);
        self.enabled = enable;
        if !enable {
            self.clear_queues();
        }
    }

    /// Suspend output without discarding the smoothing state
    pub fn set_pause(&mut self, pause: bool) {
        if self.paused != pause {
            debug!("[ColorSmoothing] paused: {}", pause);
            self.paused = pause;
            self.restart_pending = true;
        }
    }

    /// Drop in-flight output frames and all smoothing history
    pub fn clear_queues(&mut self) {
        self.output.clear();
        self.frames.clear();
        self.target_values.clear();
        self.previous_values.clear();
        self.mean_values.clear();
        self.ditherer.reset();
        self.restart_pending = true;
    }

    /// Number of LEDs of the current target
    pub fn led_count(&self) -> usize {
        self.target_values.len()
    }

    /// Remembered frames of the decay average
    pub fn remembered_frames(&self) -> impl Iterator<Item = &RememberedFrame> {
        self.frames.iter()
    }

    /// Accept a new target frame
    ///
    /// Returns `false` if smoothing is disabled or paused, the caller is then
    /// expected to bypass it. A different LED count restarts smoothing from
    /// the new frame.
    pub fn update_led_values(&mut self, colors: &[Rgb], now: Instant) -> bool {
        if !self.enabled() || colors.is_empty() {
            return false;
        }
        let now_us = micros(now);

        if !self.target_values.is_empty() && self.target_values.len() != colors.len() {
            debug!(
                "[ColorSmoothing] led count changed {} -> {}",
                self.target_values.len(),
                colors.len()
            );
            self.clear_queues();
        }

        self.target_time_us = now_us + self.settling_time_us;
        self.target_values.clear();
        self.target_values.extend_from_slice(colors);

        if self.kind == SmoothingKind::Decay {
            self.frames.push_back(RememberedFrame {
                time_us: now_us,
                colors: self.target_values.clone(),
            });
        }

        if self.previous_values.is_empty() {
            self.previous_values = colors.iter().copied().map(to_color_f).collect();
            self.mean_values.clone_from(&self.previous_values);
            self.previous_write_time_us = now_us;
            self.previous_interpolation_time_us = now_us;
            self.restart_pending = false;
        }
        true
    }

    /// Advance the smoothing state to `now`
    ///
    /// Returns the frame due for the device, if one is due.
    pub fn tick(&mut self, now: Instant) -> Option<Vec<Rgb>> {
        if !self.enabled() || self.previous_values.is_empty() {
            return None;
        }
        let now_us = micros(now);

        let frame = match self.kind {
            SmoothingKind::Linear => Some(self.perform_linear(now_us)),
            SmoothingKind::Decay => self.perform_decay(now_us),
        }?;
        self.output.push(frame)
    }

    fn perform_linear(&mut self, now_us: i64) -> Vec<Rgb> {
        self.restart_pending = false;
        let span = self.target_time_us - self.previous_write_time_us;
        let k = if span <= 0 {
            1.0
        } else {
            ((now_us - self.previous_write_time_us) as f32 / span as f32).clamp(0.0, 1.0)
        };

        for (previous, target) in self.previous_values.iter_mut().zip(self.target_values.iter()) {
            let target = to_color_f(*target);
            if k >= 1.0 {
                *previous = target;
                continue;
            }
            for channel in 0..3 {
                previous[channel] += k * (target[channel] - previous[channel]);
            }
        }
        self.previous_write_time_us = now_us;

        self.assemble(true)
    }

    fn perform_decay(&mut self, now_us: i64) -> Option<Vec<Rgb>> {
        if self.restart_pending {
            self.restart_pending = false;
            self.previous_interpolation_time_us = now_us - self.interpolation_interval_us;
            self.previous_write_time_us = now_us - self.output_interval_us;
        }

        let interpolation_pending =
            now_us >= self.previous_interpolation_time_us + self.interpolation_interval_us;
        let write_pending = now_us >= self.previous_write_time_us + self.output_interval_us;

        if interpolation_pending {
            self.interpolate_frame(now_us);
            self.previous_interpolation_time_us += self.interpolation_interval_us;
            // Lagging behind: resynchronise instead of bursting
            if now_us - self.previous_interpolation_time_us > self.interpolation_interval_us {
                self.previous_interpolation_time_us = now_us;
            }
        }

        if !write_pending {
            return None;
        }
        self.previous_write_time_us += self.output_interval_us;
        if now_us - self.previous_write_time_us > self.output_interval_us {
            self.previous_write_time_us = now_us;
        }
        Some(self.assemble(false))
    }

    /// Decay-weighted mean of all remembered frames overlapping the window
    fn interpolate_frame(&mut self, now_us: i64) {
        let window_start = now_us - self.settling_time_us;

        while self.frames.len() > 1 && self.frames[1].time_us <= window_start {
            self.frames.pop_front();
        }
        let Some(latest) = self.frames.back() else {
            return;
        };

        let led_count = latest.colors.len();
        let mut sums: Vec<ColorF> = alloc::vec![[0.0; 3]; led_count];
        let mut total_weight = 0.0f32;

        for (index, frame) in self.frames.iter().enumerate() {
            let start = frame.time_us.max(window_start);
            let end = self
                .frames
                .get(index + 1)
                .map_or(now_us, |next| next.time_us)
                .min(now_us);
            if end <= start || frame.colors.len() != led_count {
                continue;
            }
            let weight = (self.weighting)(start, end, window_start);
            if weight <= 0.0 {
                continue;
            }
            total_weight += weight;
            for (sum, color) in sums.iter_mut().zip(frame.colors.iter()) {
                let color = to_color_f(*color);
                for channel in 0..3 {
                    sum[channel] += weight * color[channel];
                }
            }
        }

        if total_weight > 0.0 {
            for sum in &mut sums {
                for channel in sum.iter_mut() {
                    *channel /= total_weight;
                }
            }
            self.mean_values = sums;
        } else {
            self.mean_values = latest.colors.iter().copied().map(to_color_f).collect();
        }
    }

    fn assemble(&mut self, linear: bool) -> Vec<Rgb> {
        let values = if linear {
            &self.previous_values
        } else {
            &self.mean_values
        };
        if self.dithering {
            self.ditherer.assemble(values)
        } else {
            assemble_frame(values)
        }
    }
}

impl core::fmt::Debug for ColorSmoothing {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ColorSmoothing")
            .field("current_config", &self.current_config)
            .field("kind", &self.kind)
            .field("enabled", &self.enabled)
            .field("paused", &self.paused)
            .field("led_count", &self.target_values.len())
            .field("remembered_frames", &self.frames.len())
            .field("output_delay", &self.output.delay())
            .finish_non_exhaustive()
    }
}

fn micros(instant: Instant) -> i64 {
    instant.as_micros() as i64
}
