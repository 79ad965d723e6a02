#![no_std]

extern crate alloc;

pub mod border;
pub mod color;
pub mod error;
pub mod events;
pub mod frame_slot;
pub mod image;
pub mod instance;
pub mod mapping;
pub mod muxer;
pub mod scheduler;
pub mod smoothing;

pub use border::{BlackBorder, BorderConfig, BorderDetector, BorderMode, BorderProcessor};
pub use color::{ColorOrder, Rgb};
pub use error::{ConfigError, DeviceError, MuxerError};
pub use events::{EventListener, EventQueue, PipelineEvent};
pub use frame_slot::{Consumer, FrameSlot, Publisher};
pub use image::Image;
pub use instance::{Instance, InstanceConfig};
pub use mapping::{Led, LedMapper, LedString, MappingConfig, MappingType};
pub use muxer::{ComponentKind, InputInfo, MuxerEvent, Priority, PriorityMuxer};
pub use scheduler::{Task, TaskQueue};
pub use smoothing::{ColorSmoothing, SmoothingCfg, SmoothingConfig, SmoothingKind};

pub use embassy_time::{Duration, Instant};

/// Abstract LED device sink
///
/// Implement this trait to support different hardware and transports.
/// The pipeline instance is generic over this trait.
pub trait LedDevice {
    /// Write colors to the LED device
    ///
    /// A failed frame is dropped; the pipeline keeps its timing.
    fn write(&mut self, colors: &[Rgb]) -> Result<(), DeviceError>;

    /// Whether a previous write is still in flight
    ///
    /// Smoothing ticks arriving while the device is busy are dropped.
    fn is_busy(&self) -> bool {
        false
    }
}
