use alloc::vec::Vec;

use heapless::Deque;

use crate::color::Rgb;
use crate::smoothing::config::MAX_OUTPUT_DELAY_FRAMES;

/// Fixed depth FIFO delaying device output by a number of frames
#[derive(Debug, Default)]
pub struct OutputQueue {
    frames: Deque<Vec<Rgb>, { MAX_OUTPUT_DELAY_FRAMES + 1 }>,
    delay: usize,
}

impl OutputQueue {
    pub const fn new(delay: usize) -> Self {
        Self {
            frames: Deque::new(),
            delay: if delay > MAX_OUTPUT_DELAY_FRAMES {
                MAX_OUTPUT_DELAY_FRAMES
            } else {
                delay
            },
        }
    }

    pub const fn delay(&self) -> usize {
        self.delay
    }

    /// Change the depth, dropping the oldest frames that no longer fit
    pub fn set_delay(&mut self, delay: usize) {
        self.delay = delay.min(MAX_OUTPUT_DELAY_FRAMES);
        while self.frames.len() > self.delay {
            self.frames.pop_front();
        }
    }

    /// Queue a frame and return the one due for output, if any
    pub fn push(&mut self, frame: Vec<Rgb>) -> Option<Vec<Rgb>> {
        if self.delay == 0 {
            return Some(frame);
        }
        if self.frames.is_full() {
            self.frames.pop_front();
        }
        // Capacity exceeds the maximum delay, so a slot is free here
        let _ = self.frames.push_back(frame);
        if self.frames.len() > self.delay {
            return self.frames.pop_front();
        }
        None
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
