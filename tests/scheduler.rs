mod tests {
    use embassy_time::{Duration, Instant};
    use myrtio_ambilight::scheduler::{Task, TaskQueue};

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_due_in_deadline_order() {
        let mut queue = TaskQueue::new();
        queue.schedule(Task::MuxerUpdate, Duration::from_millis(500), at(20));
        queue.schedule(Task::SmoothingTick, Duration::from_millis(40), at(10));

        assert!(queue.due(at(5)).is_empty());
        assert_eq!(queue.next_deadline(), Some(at(10)));
        assert_eq!(queue.sleep_duration(at(5)), Some(Duration::from_millis(5)));

        let due = queue.due(at(20));
        assert_eq!(due.as_slice(), &[Task::SmoothingTick, Task::MuxerUpdate]);
        assert_eq!(queue.next_deadline(), Some(at(50)));
    }

    #[test]
    fn test_reschedules_by_interval() {
        let mut queue = TaskQueue::new();
        queue.schedule(Task::SmoothingTick, Duration::from_millis(40), at(0));
        assert_eq!(queue.due(at(0)).as_slice(), &[Task::SmoothingTick]);
        assert_eq!(queue.next_deadline(), Some(at(40)));

        // Slightly late ticks keep the original cadence
        assert_eq!(queue.due(at(45)).as_slice(), &[Task::SmoothingTick]);
        assert_eq!(queue.next_deadline(), Some(at(80)));
    }

    #[test]
    fn test_drift_correction_skips_backlog() {
        let mut queue = TaskQueue::new();
        queue.schedule(Task::SmoothingTick, Duration::from_millis(40), at(0));
        queue.due(at(0));

        // Stalled for many intervals: one run, then restart from now
        assert_eq!(queue.due(at(1000)).len(), 1);
        assert_eq!(queue.next_deadline(), Some(at(1040)));
        assert!(queue.due(at(1000)).is_empty());
    }

    #[test]
    fn test_set_interval_and_cancel() {
        let mut queue = TaskQueue::new();
        queue.schedule(Task::MuxerUpdate, Duration::from_millis(500), at(0));
        queue.schedule(Task::SmoothingTick, Duration::from_millis(40), at(0));

        queue.set_interval(Task::SmoothingTick, Duration::from_millis(20), at(100));
        assert_eq!(queue.interval(Task::SmoothingTick), Duration::from_millis(20));

        queue.cancel(Task::MuxerUpdate);
        assert!(!queue.is_scheduled(Task::MuxerUpdate));
        assert_eq!(queue.next_deadline(), Some(at(120)));
        assert_eq!(queue.due(at(120)).as_slice(), &[Task::SmoothingTick]);
    }
}
