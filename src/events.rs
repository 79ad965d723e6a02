//! Typed event queue
//!
//! Components record what happened during a call; the owning instance drains
//! the queues on its single execution context and hands the events to
//! registered listeners in order.

use alloc::collections::VecDeque;
use alloc::collections::vec_deque::Drain;

use crate::border::BlackBorder;
use crate::error::{ConfigError, DeviceError};
use crate::mapping::MappingType;
use crate::muxer::MuxerEvent;

/// FIFO of pending notifications
#[derive(Debug, Clone)]
pub struct EventQueue<E> {
    inner: VecDeque<E>,
}

impl<E> EventQueue<E> {
    pub const fn new() -> Self {
        Self {
            inner: VecDeque::new(),
        }
    }

    pub fn push(&mut self, event: E) {
        self.inner.push_back(event);
    }

    /// Remove and return all queued events, oldest first
    pub fn drain(&mut self) -> Drain<'_, E> {
        self.inner.drain(..)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Notification emitted by an [`Instance`](crate::Instance)
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Priority muxer state change
    Muxer(MuxerEvent),
    /// The stabilized black border changed
    BorderChanged(BlackBorder),
    /// The image to LED mapping was rebuilt or its type changed
    MappingChanged {
        led_count: usize,
        mapping_type: MappingType,
    },
    /// A smoothing configuration became active
    SmoothingConfigSelected(u32),
    /// The visible input asked for a smoothing configuration that does not
    /// exist; the system configuration is used instead
    SmoothingConfigRejected(ConfigError),
    /// The device rejected a frame; the frame was dropped
    DeviceWriteFailed(DeviceError),
}

/// Consumer of pipeline notifications
pub trait EventListener {
    fn on_event(&mut self, event: &PipelineEvent);
}

impl<F: FnMut(&PipelineEvent)> EventListener for F {
    fn on_event(&mut self, event: &PipelineEvent) {
        self(event);
    }
}
