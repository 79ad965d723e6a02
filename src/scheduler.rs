//! Deadline-ordered periodic tasks.
//!
//! Portable pacing without async/await or platform timers: the owner asks
//! which tasks are due at `now`, runs them and sleeps until
//! [`TaskQueue::next_deadline`]. A task that fell far behind is rescheduled
//! from `now` instead of catching up in a burst.

use core::cmp::Ordering;

use embassy_time::{Duration, Instant};
use heapless::binary_heap::{BinaryHeap, Min};

/// Number of distinct [`Task`] kinds.
pub const TASK_COUNT: usize = 2;

/// Periodic work of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Task {
    /// Re-evaluate the priority muxer (input timeouts)
    MuxerUpdate,
    /// Advance color smoothing and write the device
    SmoothingTick,
}

impl Task {
    const fn index(self) -> usize {
        match self {
            Self::MuxerUpdate => 0,
            Self::SmoothingTick => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scheduled {
    deadline: Instant,
    task: Task,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then(self.task.cmp(&other.task))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of task deadlines with a fixed interval per task.
pub struct TaskQueue {
    heap: BinaryHeap<Scheduled, Min, TASK_COUNT>,
    intervals: [Duration; TASK_COUNT],
}

impl TaskQueue {
    pub const fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            intervals: [Duration::from_ticks(0); TASK_COUNT],
        }
    }

    /// Schedule `task` every `interval`, first at `first_deadline`.
    ///
    /// Replaces an existing schedule of the same task.
    pub fn schedule(&mut self, task: Task, interval: Duration, first_deadline: Instant) {
        self.cancel(task);
        self.intervals[task.index()] = interval;
        // One entry per task kind, so the heap never overflows
        let _ = self.heap.push(Scheduled {
            deadline: first_deadline,
            task,
        });
    }

    /// Change the interval of `task`; the next run is `now + interval`.
    pub fn set_interval(&mut self, task: Task, interval: Duration, now: Instant) {
        self.schedule(task, interval, now + interval);
    }

    /// Remove `task` from the queue.
    pub fn cancel(&mut self, task: Task) {
        if !self.is_scheduled(task) {
            return;
        }
        let mut kept: heapless::Vec<Scheduled, TASK_COUNT> = heapless::Vec::new();
        while let Some(entry) = self.heap.pop() {
            if entry.task != task {
                let _ = kept.push(entry);
            }
        }
        for entry in kept {
            let _ = self.heap.push(entry);
        }
    }

    pub fn is_scheduled(&self, task: Task) -> bool {
        self.heap.iter().any(|entry| entry.task == task)
    }

    pub fn interval(&self, task: Task) -> Duration {
        self.intervals[task.index()]
    }

    /// Deadline of the earliest task.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.deadline)
    }

    /// How long the owner may sleep (zero if something is already due).
    pub fn sleep_duration(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.checked_duration_since(now).unwrap_or(Duration::from_ticks(0)))
    }

    /// Pop every task due at `now`, in deadline order, and reschedule it.
    ///
    /// Each task is returned at most once per call.
    pub fn due(&mut self, now: Instant) -> heapless::Vec<Task, TASK_COUNT> {
        let mut due: heapless::Vec<Scheduled, TASK_COUNT> = heapless::Vec::new();
        while self.heap.peek().is_some_and(|entry| entry.deadline <= now) {
            if let Some(entry) = self.heap.pop() {
                let _ = due.push(entry);
            }
        }

        let mut tasks = heapless::Vec::new();
        for entry in due {
            let interval = self.intervals[entry.task.index()];
            // Drift correction: skip the backlog after long stalls
            let base = if now > entry.deadline + interval * 2 {
                now
            } else {
                entry.deadline
            };
            let _ = self.heap.push(Scheduled {
                deadline: base + interval,
                task: entry.task,
            });
            let _ = tasks.push(entry.task);
        }
        tasks
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
