//! Priority muxer
//!
//! Arbitrates between all registered color sources. The visible source is
//! the active registration with the lowest numeric priority, unless a
//! priority was pinned manually. A permanent fallback entry at
//! [`LOWEST_PRIORITY`] guarantees there is always something to show.

mod input;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use embassy_time::{Duration, Instant, TICK_HZ};
use log::{debug, warn};

pub use input::{
    BG_PRIORITY, ComponentKind, FG_PRIORITY, InputInfo, LOWEST_PRIORITY, Priority, SYSTEM_ORIGIN,
};

use crate::color::Rgb;
use crate::error::MuxerError;
use crate::events::EventQueue;

/// Notification emitted by the muxer
#[derive(Debug, Clone, PartialEq)]
pub enum MuxerEvent {
    /// Registrations, expiries or the visible priority changed
    PrioritiesChanged {
        current: Priority,
        table: Vec<InputInfo>,
    },
    /// A different priority became visible
    VisiblePriorityChanged(Priority),
    /// The visible priority belongs to a different component kind
    VisibleComponentChanged(ComponentKind),
    /// An input switched between active and inactive
    ActiveStateChanged { priority: Priority, active: bool },
    /// A running effect at this priority must be stopped
    EffectStopRequested(Priority),
    /// An input was removed because its timeout elapsed
    InputExpired(Priority),
}

/// Priority table with timeout-driven arbitration
#[derive(Debug, Clone)]
pub struct PriorityMuxer {
    inputs: BTreeMap<Priority, InputInfo>,
    current_priority: Priority,
    previous_priority: Priority,
    visible_component: ComponentKind,
    auto_select: bool,
    manual_priority: Option<Priority>,
    table_changed: bool,
    events: EventQueue<MuxerEvent>,
}

impl PriorityMuxer {
    /// Create a muxer holding only the fallback entry
    pub fn new(led_count: usize) -> Self {
        let mut inputs = BTreeMap::new();
        inputs.insert(LOWEST_PRIORITY, Self::fallback_input(led_count));
        Self {
            inputs,
            current_priority: LOWEST_PRIORITY,
            previous_priority: LOWEST_PRIORITY,
            visible_component: ComponentKind::Color,
            auto_select: true,
            manual_priority: None,
            table_changed: false,
            events: EventQueue::new(),
        }
    }

    fn fallback_input(led_count: usize) -> InputInfo {
        let mut info = InputInfo::new(
            LOWEST_PRIORITY,
            ComponentKind::Color,
            SYSTEM_ORIGIN.to_string(),
            None,
            0,
        );
        info.colors = vec![Rgb::default(); led_count];
        info
    }

    /// Resize the black frame of the fallback entry
    pub fn set_led_count(&mut self, led_count: usize) {
        if let Some(fallback) = self.inputs.get_mut(&LOWEST_PRIORITY) {
            fallback.colors = vec![Rgb::default(); led_count];
        }
    }

    /// Register (or re-register) a color source
    ///
    /// The slot starts active, without colors and without timeout.
    pub fn register_input(
        &mut self,
        priority: Priority,
        component: ComponentKind,
        origin: &str,
        owner: Option<&str>,
        smoothing_cfg: u32,
        now: Instant,
    ) -> Result<(), MuxerError> {
        if priority < FG_PRIORITY || priority == LOWEST_PRIORITY {
            return Err(MuxerError::ReservedPriority(priority));
        }
        let info = InputInfo::new(
            priority,
            component,
            origin.to_string(),
            owner.map(String::from),
            smoothing_cfg,
        );
        if self.inputs.insert(priority, info).is_none() {
            debug!(
                "[PriorityMuxer] registered '{}/{}' at priority {}",
                component.as_str(),
                origin,
                priority
            );
        }
        self.table_changed = true;
        self.evaluate(now);
        Ok(())
    }

    /// Update the colors and timeout of a registered priority
    ///
    /// A negative `timeout_ms` never expires. With `clear_effect` an effect
    /// running at this priority is asked to stop and the slot becomes a
    /// plain color source.
    pub fn set_input(
        &mut self,
        priority: Priority,
        colors: Vec<Rgb>,
        timeout_ms: i64,
        clear_effect: bool,
        now: Instant,
    ) -> Result<(), MuxerError> {
        if priority == LOWEST_PRIORITY {
            return Err(MuxerError::ReservedPriority(priority));
        }
        let Some(input) = self.inputs.get_mut(&priority) else {
            warn!("[PriorityMuxer] set on unregistered priority {}", priority);
            return Err(MuxerError::NotRegistered(priority));
        };

        input.colors = colors;
        input.timeout_at = timeout_at(timeout_ms, now);
        if !input.active {
            input.active = true;
            self.events.push(MuxerEvent::ActiveStateChanged {
                priority,
                active: true,
            });
            self.table_changed = true;
        }
        if clear_effect && input.component == ComponentKind::Effect {
            input.component = ComponentKind::Color;
            self.events.push(MuxerEvent::EffectStopRequested(priority));
            self.table_changed = true;
        }

        self.evaluate(now);
        Ok(())
    }

    /// Keep a registration but take it out of arbitration until the next
    /// [`set_input`](Self::set_input)
    pub fn set_input_inactive(&mut self, priority: Priority, now: Instant) -> Result<(), MuxerError> {
        if priority == LOWEST_PRIORITY {
            return Err(MuxerError::ReservedPriority(priority));
        }
        let input = self
            .inputs
            .get_mut(&priority)
            .ok_or(MuxerError::NotRegistered(priority))?;
        if input.active {
            input.active = false;
            self.events.push(MuxerEvent::ActiveStateChanged {
                priority,
                active: false,
            });
            self.table_changed = true;
        }
        self.evaluate(now);
        Ok(())
    }

    /// Remove a general-purpose registration
    ///
    /// The fallback entry and the reserved foreground/background slots are
    /// left alone, see [`force_clear_input`](Self::force_clear_input).
    pub fn clear_input(&mut self, priority: Priority, now: Instant) -> bool {
        if priority <= FG_PRIORITY || priority >= BG_PRIORITY {
            debug!("[PriorityMuxer] refusing to clear reserved priority {}", priority);
            return false;
        }
        self.remove(priority, now)
    }

    /// Remove any registration except the fallback entry
    pub fn force_clear_input(&mut self, priority: Priority, now: Instant) -> bool {
        if priority == LOWEST_PRIORITY {
            return false;
        }
        self.remove(priority, now)
    }

    fn remove(&mut self, priority: Priority, now: Instant) -> bool {
        if self.inputs.remove(&priority).is_none() {
            return false;
        }
        debug!("[PriorityMuxer] removed priority {}", priority);
        self.table_changed = true;
        self.evaluate(now);
        true
    }

    /// Remove all general-purpose registrations, or everything but the
    /// fallback entry with `force`
    pub fn clear_all(&mut self, force: bool, now: Instant) {
        let before = self.inputs.len();
        if force {
            self.inputs.retain(|&priority, _| priority == LOWEST_PRIORITY);
        } else {
            self.inputs
                .retain(|&priority, _| priority <= FG_PRIORITY || priority >= BG_PRIORITY);
        }
        if self.inputs.len() != before {
            debug!(
                "[PriorityMuxer] cleared {} inputs (force: {})",
                before - self.inputs.len(),
                force
            );
            self.table_changed = true;
        }
        self.evaluate(now);
    }

    /// Pin the visible priority and disable automatic selection
    pub fn set_manual_priority(&mut self, priority: Priority, now: Instant) -> Result<(), MuxerError> {
        if !self.inputs.contains_key(&priority) {
            return Err(MuxerError::NotRegistered(priority));
        }
        self.manual_priority = Some(priority);
        self.auto_select = false;
        self.table_changed = true;
        self.evaluate(now);
        Ok(())
    }

    /// Toggle automatic selection of the lowest priority
    pub fn set_source_auto_select(&mut self, enable: bool, now: Instant) {
        if self.auto_select == enable {
            return;
        }
        self.auto_select = enable;
        if enable {
            self.manual_priority = None;
        } else if self.manual_priority.is_none() {
            self.manual_priority = Some(self.current_priority);
        }
        debug!("[PriorityMuxer] source auto select: {}", enable);
        self.table_changed = true;
        self.evaluate(now);
    }

    pub const fn is_source_auto_select_enabled(&self) -> bool {
        self.auto_select
    }

    /// Expire timed out inputs and recompute the visible priority
    ///
    /// `now` is read once for the whole pass, so inputs that expire together
    /// are removed together regardless of table order.
    pub fn evaluate(&mut self, now: Instant) {
        let mut changed = core::mem::take(&mut self.table_changed);

        let expired: Vec<Priority> = self
            .inputs
            .values()
            .filter(|input| input.priority != LOWEST_PRIORITY && input.is_expired(now))
            .map(|input| input.priority)
            .collect();
        for priority in expired {
            self.inputs.remove(&priority);
            debug!("[PriorityMuxer] timeout clear for priority {}", priority);
            self.events.push(MuxerEvent::InputExpired(priority));
            changed = true;
        }

        let mut visible = self
            .inputs
            .values()
            .find(|input| input.active)
            .map_or(LOWEST_PRIORITY, |input| input.priority);

        if !self.auto_select {
            match self.manual_priority {
                Some(manual) if self.inputs.contains_key(&manual) => visible = manual,
                _ => {
                    debug!("[PriorityMuxer] manual priority gone, switching to auto selection");
                    self.auto_select = true;
                    self.manual_priority = None;
                }
            }
        }

        if visible != self.current_priority {
            self.previous_priority = self.current_priority;
            self.current_priority = visible;
            debug!("[PriorityMuxer] visible priority: {}", visible);
            self.events.push(MuxerEvent::VisiblePriorityChanged(visible));
            changed = true;
        }

        let component = self
            .inputs
            .get(&visible)
            .map_or(ComponentKind::Color, |input| input.component);
        if component != self.visible_component {
            self.visible_component = component;
            self.events
                .push(MuxerEvent::VisibleComponentChanged(component));
        }

        if changed {
            self.events.push(MuxerEvent::PrioritiesChanged {
                current: self.current_priority,
                table: self.inputs.values().cloned().collect(),
            });
        }
    }

    pub const fn current_priority(&self) -> Priority {
        self.current_priority
    }

    pub const fn previous_priority(&self) -> Priority {
        self.previous_priority
    }

    pub const fn visible_component(&self) -> ComponentKind {
        self.visible_component
    }

    pub fn has_priority(&self, priority: Priority) -> bool {
        self.inputs.contains_key(&priority)
    }

    pub fn input_info(&self, priority: Priority) -> Option<&InputInfo> {
        self.inputs.get(&priority)
    }

    /// Info of the visible input
    pub fn visible_input(&self) -> Option<&InputInfo> {
        self.inputs.get(&self.current_priority)
    }

    /// Colors of the visible input
    pub fn visible_colors(&self) -> &[Rgb] {
        self.visible_input()
            .map(|input| input.colors.as_slice())
            .unwrap_or(&[])
    }

    /// Registered priorities in ascending order
    pub fn priorities(&self) -> Vec<Priority> {
        self.inputs.keys().copied().collect()
    }

    /// Take all queued notifications
    pub fn drain_events(&mut self) -> impl Iterator<Item = MuxerEvent> + '_ {
        self.events.drain()
    }
}

/// Expiry instant of a timeout; negative or unrepresentable timeouts never expire
fn timeout_at(timeout_ms: i64, now: Instant) -> Option<Instant> {
    let ms = u64::try_from(timeout_ms).ok()?;
    let deadline = ms
        .checked_mul(TICK_HZ)
        .map(|ticks| Duration::from_ticks(ticks / 1000))
        .and_then(|timeout| now.checked_add(timeout));
    if deadline.is_none() {
        debug!("[PriorityMuxer] timeout of {} ms out of range, input never expires", ms);
    }
    deadline
}
