use alloc::vec;
use alloc::vec::Vec;

use embassy_time::{Duration, Instant};
use log::{debug, trace, warn};

use crate::LedDevice;
use crate::border::{BlackBorder, BorderConfig, BorderProcessor};
use crate::color::Rgb;
use crate::error::MuxerError;
use crate::events::{EventListener, EventQueue, PipelineEvent};
use crate::image::Image;
use crate::mapping::{LedMapper, LedString, MappingConfig, MappingType};
use crate::muxer::{ComponentKind, Priority, PriorityMuxer};
use crate::scheduler::{Task, TaskQueue};
use crate::smoothing::{ColorSmoothing, SMOOTHING_CFG_SYSTEM, SmoothingConfig};

/// Default period of the muxer timeout check
pub const DEFAULT_MUXER_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration of one pipeline instance
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    pub border: BorderConfig,
    pub mapping: MappingConfig,
    pub smoothing: SmoothingConfig,
    pub leds: LedString,
    pub muxer_update_interval: Duration,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            border: BorderConfig::default(),
            mapping: MappingConfig::default(),
            smoothing: SmoothingConfig::default(),
            leds: LedString::new(),
            muxer_update_interval: DEFAULT_MUXER_UPDATE_INTERVAL,
        }
    }
}

/// One complete pipeline: muxer, border processor, mapper and smoothing
/// driving a single LED device
///
/// All mutation happens through `&mut self`, so the instance runs on one
/// execution context. Periodic work is driven by [`poll`](Self::poll).
pub struct Instance<D: LedDevice> {
    // External dependencies
    device: D,

    // Pipeline stages
    muxer: PriorityMuxer,
    border: BorderProcessor,
    mapper: LedMapper,
    smoothing: ColorSmoothing,

    // Scheduling and notifications
    tasks: TaskQueue,
    muxer_update_interval: Duration,
    events: EventQueue<PipelineEvent>,

    reported_border: BlackBorder,
    // Last visible state handed to smoothing or the device
    forwarded: Option<(Priority, Vec<Rgb>)>,
    requested_cfg: u32,
    dropped_ticks: u32,
    failed_writes: u32,
}

impl<D: LedDevice> Instance<D> {
    pub fn new(config: InstanceConfig, device: D) -> Self {
        let led_count = config.leds.len();
        Self {
            device,
            muxer: PriorityMuxer::new(led_count),
            border: BorderProcessor::new(&config.border),
            mapper: LedMapper::new(config.leds, &config.mapping),
            smoothing: ColorSmoothing::new(&config.smoothing),
            tasks: TaskQueue::new(),
            muxer_update_interval: config.muxer_update_interval,
            events: EventQueue::new(),
            reported_border: BlackBorder::UNKNOWN,
            forwarded: None,
            requested_cfg: SMOOTHING_CFG_SYSTEM,
            dropped_ticks: 0,
            failed_writes: 0,
        }
    }

    /// Register a color source with the muxer
    pub fn register_input(
        &mut self,
        priority: Priority,
        component: ComponentKind,
        origin: &str,
        owner: Option<&str>,
        smoothing_cfg: u32,
        now: Instant,
    ) -> Result<(), MuxerError> {
        self.muxer
            .register_input(priority, component, origin, owner, smoothing_cfg, now)?;
        self.after_muxer_update(now);
        Ok(())
    }

    /// Feed a captured image for a registered priority
    ///
    /// The image goes through border detection and LED mapping before it
    /// reaches the muxer.
    pub fn push_image(
        &mut self,
        priority: Priority,
        image: &Image,
        timeout_ms: i64,
        now: Instant,
    ) -> Result<(), MuxerError> {
        if self.border.process(image) {
            let border = self.border.current_border();
            if border != self.reported_border {
                self.reported_border = border;
                self.events.push(PipelineEvent::BorderChanged(border));
            }
        }

        let colors = self.mapper.map(image, self.border.current_border());
        self.note_mapping_change();

        self.muxer.set_input(priority, colors, timeout_ms, false, now)?;
        self.after_muxer_update(now);
        Ok(())
    }

    /// Set the colors of a registered priority
    ///
    /// A single color is spread over all LEDs.
    pub fn set_color(
        &mut self,
        priority: Priority,
        colors: &[Rgb],
        timeout_ms: i64,
        clear_effect: bool,
        now: Instant,
    ) -> Result<(), MuxerError> {
        let colors = match colors {
            [single] => vec![*single; self.mapper.led_count()],
            _ => colors.to_vec(),
        };
        self.muxer
            .set_input(priority, colors, timeout_ms, clear_effect, now)?;
        self.after_muxer_update(now);
        Ok(())
    }

    pub fn set_input_inactive(&mut self, priority: Priority, now: Instant) -> Result<(), MuxerError> {
        self.muxer.set_input_inactive(priority, now)?;
        self.after_muxer_update(now);
        Ok(())
    }

    pub fn clear_input(&mut self, priority: Priority, now: Instant) -> bool {
        let cleared = self.muxer.clear_input(priority, now);
        self.after_muxer_update(now);
        cleared
    }

    pub fn clear_all(&mut self, force: bool, now: Instant) {
        self.muxer.clear_all(force, now);
        self.after_muxer_update(now);
    }

    /// Run all scheduled work due at `now`
    ///
    /// Returns how long the caller may sleep before polling again.
    pub fn poll(&mut self, now: Instant) -> Duration {
        if !self.tasks.is_scheduled(Task::MuxerUpdate) {
            self.tasks
                .schedule(Task::MuxerUpdate, self.muxer_update_interval, now);
        }
        if !self.tasks.is_scheduled(Task::SmoothingTick) {
            self.tasks
                .schedule(Task::SmoothingTick, self.smoothing.tick_interval(), now);
        }

        for task in self.tasks.due(now) {
            match task {
                Task::MuxerUpdate => {
                    self.muxer.evaluate(now);
                    self.after_muxer_update(now);
                }
                Task::SmoothingTick => self.smoothing_tick(now),
            }
        }

        self.tasks
            .sleep_duration(now)
            .unwrap_or(self.muxer_update_interval)
    }

    /// Collect muxer events and forward the visible colors when they changed
    fn after_muxer_update(&mut self, now: Instant) {
        for event in self.muxer.drain_events() {
            self.events.push(PipelineEvent::Muxer(event));
        }

        let Some(input) = self.muxer.visible_input() else {
            return;
        };
        if input.colors.is_empty() {
            return;
        }
        let priority = input.priority;
        let cfg = input.smoothing_cfg;

        let cfg_changed = cfg != self.requested_cfg;
        if cfg_changed {
            self.requested_cfg = cfg;
            if let Err(err) = self.smoothing.select_config(cfg, false) {
                warn!(
                    "[Instance] priority {} requested smoothing config {}: {}",
                    priority, cfg, err
                );
                self.events.push(PipelineEvent::SmoothingConfigRejected(err));
            }
            self.events.push(PipelineEvent::SmoothingConfigSelected(
                self.smoothing.current_config(),
            ));
            self.tasks
                .schedule(Task::SmoothingTick, self.smoothing.tick_interval(), now);
        }

        let unchanged = self
            .forwarded
            .as_ref()
            .is_some_and(|(p, colors)| *p == priority && *colors == input.colors);
        if unchanged && !cfg_changed {
            return;
        }

        let mut colors = input.colors.clone();
        self.forwarded = Some((priority, colors.clone()));
        for (color, led) in colors.iter_mut().zip(self.mapper.led_string()) {
            *color = led.color_order.apply(*color);
        }

        if !self.smoothing.update_led_values(&colors, now) {
            self.write_frame(&colors);
        }
    }

    fn smoothing_tick(&mut self, now: Instant) {
        if self.device.is_busy() {
            self.dropped_ticks = self.dropped_ticks.wrapping_add(1);
            trace!("[Instance] device busy, smoothing tick dropped");
            return;
        }
        if let Some(frame) = self.smoothing.tick(now) {
            self.write_frame(&frame);
        }
    }

    fn write_frame(&mut self, frame: &[Rgb]) {
        if let Err(err) = self.device.write(frame) {
            self.failed_writes = self.failed_writes.wrapping_add(1);
            warn!("[Instance] device write failed: {}", err);
            self.events.push(PipelineEvent::DeviceWriteFailed(err));
        }
    }

    fn note_mapping_change(&mut self) {
        if self.mapper.take_mapping_changed() {
            self.events.push(PipelineEvent::MappingChanged {
                led_count: self.mapper.led_count(),
                mapping_type: self.mapper.mapping_type(),
            });
        }
    }

    /// Enable or disable smoothing; disabled frames go straight to the device
    pub fn set_smoothing_enabled(&mut self, enable: bool) {
        self.smoothing.set_enable(enable);
        self.forwarded = None;
    }

    pub fn set_border_enabled(&mut self, enable: bool) {
        self.border.set_enabled(enable);
    }

    /// System override of border detection, e.g. while an effect is shown
    pub fn set_border_hard_disable(&mut self, disable: bool) {
        self.border.set_hard_disable(disable);
    }

    /// Replace the LED geometry
    pub fn set_led_string(&mut self, leds: LedString) {
        debug!("[Instance] new led string with {} leds", leds.len());
        self.muxer.set_led_count(leds.len());
        self.mapper.set_led_string(leds);
        self.forwarded = None;
        self.note_mapping_change();
    }

    pub fn set_mapping_type(&mut self, mapping: MappingType) {
        self.mapper.set_mapping_type(mapping);
        self.note_mapping_change();
    }

    /// Override the mapping type; `None` restores the user choice
    pub fn set_hard_mapping_type(&mut self, mapping: Option<MappingType>) {
        self.mapper.set_hard_mapping_type(mapping);
        self.note_mapping_change();
    }

    /// Deliver all queued events to `listener`, oldest first
    pub fn dispatch_events(&mut self, listener: &mut impl EventListener) {
        for event in self.events.drain() {
            listener.on_event(&event);
        }
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        self.events.drain().collect()
    }

    pub const fn muxer(&self) -> &PriorityMuxer {
        &self.muxer
    }

    pub const fn border_processor(&self) -> &BorderProcessor {
        &self.border
    }

    pub const fn mapper(&self) -> &LedMapper {
        &self.mapper
    }

    pub const fn smoothing(&self) -> &ColorSmoothing {
        &self.smoothing
    }

    /// Mutable access for smoothing config management
    pub fn smoothing_mut(&mut self) -> &mut ColorSmoothing {
        &mut self.smoothing
    }

    pub const fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Smoothing ticks skipped because the device was still writing
    pub const fn dropped_ticks(&self) -> u32 {
        self.dropped_ticks
    }

    pub const fn failed_writes(&self) -> u32 {
        self.failed_writes
    }
}
