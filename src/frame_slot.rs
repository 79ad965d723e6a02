//! Latest-frame-wins handoff between capture threads and an instance.
//!
//! A single slot guarded by a critical section. Producers never wait for the
//! consumer: publishing replaces a frame that has not been taken yet.

use core::cell::RefCell;

use critical_section::Mutex;

struct Slot<T> {
    frame: Option<T>,
    superseded: u32,
}

/// Thread/interrupt safe single slot holding the most recent frame.
pub struct FrameSlot<T> {
    inner: Mutex<RefCell<Slot<T>>>,
}

impl<T> FrameSlot<T> {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Slot {
                frame: None,
                superseded: 0,
            })),
        }
    }

    /// Get a publisher handle for this slot.
    ///
    /// Any number of publishers may coexist.
    pub const fn publisher(&self) -> Publisher<'_, T> {
        Publisher { slot: self }
    }

    /// Get a consumer handle for this slot.
    pub const fn consumer(&self) -> Consumer<'_, T> {
        Consumer { slot: self }
    }

    /// Store `frame`, replacing any frame that was not taken.
    ///
    /// Returns `true` if an older frame was superseded.
    pub fn publish(&self, frame: T) -> bool {
        critical_section::with(|cs| {
            let mut slot = self.inner.borrow(cs).borrow_mut();
            let replaced = slot.frame.replace(frame).is_some();
            if replaced {
                slot.superseded = slot.superseded.wrapping_add(1);
            }
            replaced
        })
    }

    /// Take the latest frame, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().frame.take())
    }

    /// Whether a frame is waiting.
    pub fn is_pending(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().frame.is_some())
    }

    /// Number of frames dropped because a newer one arrived first.
    pub fn superseded_count(&self) -> u32 {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().superseded)
    }
}

impl<T> Default for FrameSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A publishing handle for a [`FrameSlot`].
#[derive(Clone, Copy)]
pub struct Publisher<'a, T> {
    slot: &'a FrameSlot<T>,
}

impl<T> Publisher<'_, T> {
    /// See [`FrameSlot::publish`].
    pub fn publish(&self, frame: T) -> bool {
        self.slot.publish(frame)
    }
}

/// A consuming handle for a [`FrameSlot`].
#[derive(Clone, Copy)]
pub struct Consumer<'a, T> {
    slot: &'a FrameSlot<T>,
}

impl<T> Consumer<'_, T> {
    /// See [`FrameSlot::take`].
    pub fn take(&self) -> Option<T> {
        self.slot.take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }
}
