mod tests {
    use embassy_time::Instant;
    use myrtio_ambilight::Rgb;
    use myrtio_ambilight::error::MuxerError;
    use myrtio_ambilight::muxer::{
        BG_PRIORITY, ComponentKind, FG_PRIORITY, LOWEST_PRIORITY, MuxerEvent, PriorityMuxer,
    };

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn register(muxer: &mut PriorityMuxer, priority: u8, component: ComponentKind, now: Instant) {
        muxer
            .register_input(priority, component, "test", None, 0, now)
            .expect("priority can be registered");
    }

    #[test]
    fn test_starts_with_black_fallback() {
        let muxer = PriorityMuxer::new(3);
        assert_eq!(muxer.current_priority(), LOWEST_PRIORITY);
        assert_eq!(muxer.visible_colors(), &[Rgb::default(); 3]);
        assert_eq!(muxer.priorities(), vec![LOWEST_PRIORITY]);
        assert_eq!(
            muxer.input_info(LOWEST_PRIORITY).map(|info| info.origin.as_str()),
            Some("System")
        );
    }

    #[test]
    fn test_lowest_priority_wins() {
        let mut muxer = PriorityMuxer::new(1);
        register(&mut muxer, 50, ComponentKind::Color, at(0));
        register(&mut muxer, 100, ComponentKind::Color, at(0));
        assert_eq!(muxer.current_priority(), 50);
        assert_eq!(muxer.priorities(), vec![50, 100, LOWEST_PRIORITY]);
    }

    #[test]
    fn test_timeout_expires_input() {
        let mut muxer = PriorityMuxer::new(1);
        register(&mut muxer, 50, ComponentKind::Color, at(0));
        register(&mut muxer, 100, ComponentKind::Color, at(0));
        muxer
            .set_input(50, vec![RED], 1000, false, at(0))
            .expect("registered");

        muxer.evaluate(at(999));
        assert!(muxer.has_priority(50));
        assert_eq!(muxer.current_priority(), 50);

        muxer.drain_events().for_each(drop);
        muxer.evaluate(at(1000));
        assert!(!muxer.has_priority(50));
        assert_eq!(muxer.current_priority(), 100);
        assert_eq!(muxer.previous_priority(), 50);

        let events: Vec<MuxerEvent> = muxer.drain_events().collect();
        assert!(events.contains(&MuxerEvent::InputExpired(50)));
        assert!(events.contains(&MuxerEvent::VisiblePriorityChanged(100)));
        assert!(events.iter().any(|event| matches!(
            event,
            MuxerEvent::PrioritiesChanged { current: 100, table } if table.len() == 2
        )));
    }

    #[test]
    fn test_simultaneous_expiry() {
        let mut muxer = PriorityMuxer::new(1);
        for priority in [10, 20, 30] {
            register(&mut muxer, priority, ComponentKind::Color, at(0));
            muxer
                .set_input(priority, vec![BLUE], 500, false, at(0))
                .expect("registered");
        }
        muxer.evaluate(at(600));
        assert_eq!(muxer.priorities(), vec![LOWEST_PRIORITY]);
        assert_eq!(muxer.current_priority(), LOWEST_PRIORITY);
    }

    #[test]
    fn test_negative_timeout_never_expires() {
        let mut muxer = PriorityMuxer::new(1);
        register(&mut muxer, 60, ComponentKind::Color, at(0));
        muxer
            .set_input(60, vec![RED], -1, false, at(0))
            .expect("registered");
        muxer.evaluate(at(10_000_000));
        assert_eq!(muxer.current_priority(), 60);
        assert_eq!(muxer.visible_colors(), &[RED]);
    }

    #[test]
    fn test_huge_timeout_never_expires() {
        let mut muxer = PriorityMuxer::new(1);
        register(&mut muxer, 60, ComponentKind::Color, at(0));
        muxer
            .set_input(60, vec![RED], i64::MAX, false, at(1000))
            .expect("registered");
        assert_eq!(muxer.input_info(60).and_then(|info| info.timeout_at), None);

        muxer.evaluate(at(10_000_000));
        assert_eq!(muxer.current_priority(), 60);
        assert_eq!(muxer.visible_colors(), &[RED]);
    }

    #[test]
    fn test_reserved_priorities() {
        let mut muxer = PriorityMuxer::new(1);
        assert_eq!(
            muxer.register_input(0, ComponentKind::Color, "test", None, 0, at(0)),
            Err(MuxerError::ReservedPriority(0))
        );
        assert_eq!(
            muxer.register_input(LOWEST_PRIORITY, ComponentKind::Color, "test", None, 0, at(0)),
            Err(MuxerError::ReservedPriority(LOWEST_PRIORITY))
        );
        assert_eq!(
            muxer.set_input(42, vec![RED], -1, false, at(0)),
            Err(MuxerError::NotRegistered(42))
        );
    }

    #[test]
    fn test_clear_rules() {
        let mut muxer = PriorityMuxer::new(1);
        for priority in [FG_PRIORITY, 20, 30, BG_PRIORITY] {
            register(&mut muxer, priority, ComponentKind::Color, at(0));
        }

        assert!(!muxer.clear_input(FG_PRIORITY, at(0)));
        assert!(!muxer.clear_input(LOWEST_PRIORITY, at(0)));
        assert!(muxer.clear_input(20, at(0)));
        assert!(!muxer.clear_input(20, at(0)));

        muxer.clear_all(false, at(0));
        assert_eq!(
            muxer.priorities(),
            vec![FG_PRIORITY, BG_PRIORITY, LOWEST_PRIORITY]
        );

        assert!(muxer.force_clear_input(FG_PRIORITY, at(0)));
        assert!(!muxer.force_clear_input(LOWEST_PRIORITY, at(0)));

        muxer.clear_all(true, at(0));
        assert_eq!(muxer.priorities(), vec![LOWEST_PRIORITY]);
    }

    #[test]
    fn test_inactive_input_is_skipped() {
        let mut muxer = PriorityMuxer::new(1);
        register(&mut muxer, 10, ComponentKind::Grabber, at(0));
        register(&mut muxer, 20, ComponentKind::Color, at(0));
        assert_eq!(muxer.current_priority(), 10);

        muxer.set_input_inactive(10, at(1)).expect("registered");
        assert_eq!(muxer.current_priority(), 20);
        assert!(muxer.has_priority(10));

        muxer
            .set_input(10, vec![RED], -1, false, at(2))
            .expect("registered");
        assert_eq!(muxer.current_priority(), 10);

        let events: Vec<MuxerEvent> = muxer.drain_events().collect();
        assert!(events.contains(&MuxerEvent::ActiveStateChanged {
            priority: 10,
            active: false
        }));
        assert!(events.contains(&MuxerEvent::ActiveStateChanged {
            priority: 10,
            active: true
        }));
    }

    #[test]
    fn test_visible_component_event() {
        let mut muxer = PriorityMuxer::new(1);
        register(&mut muxer, 100, ComponentKind::Color, at(0));
        muxer.drain_events().for_each(drop);

        register(&mut muxer, 30, ComponentKind::Effect, at(0));
        assert_eq!(muxer.visible_component(), ComponentKind::Effect);
        let events: Vec<MuxerEvent> = muxer.drain_events().collect();
        assert!(events.contains(&MuxerEvent::VisibleComponentChanged(ComponentKind::Effect)));
    }

    #[test]
    fn test_clear_effect_turns_slot_into_color() {
        let mut muxer = PriorityMuxer::new(1);
        register(&mut muxer, 30, ComponentKind::Effect, at(0));
        muxer.drain_events().for_each(drop);

        muxer
            .set_input(30, vec![BLUE], -1, true, at(1))
            .expect("registered");
        assert_eq!(
            muxer.input_info(30).map(|info| info.component),
            Some(ComponentKind::Color)
        );
        let events: Vec<MuxerEvent> = muxer.drain_events().collect();
        assert!(events.contains(&MuxerEvent::EffectStopRequested(30)));
        assert!(events.contains(&MuxerEvent::VisibleComponentChanged(ComponentKind::Color)));
    }

    #[test]
    fn test_manual_selection_falls_back_to_auto() {
        let mut muxer = PriorityMuxer::new(1);
        register(&mut muxer, 10, ComponentKind::Color, at(0));
        register(&mut muxer, 20, ComponentKind::Color, at(0));

        muxer.set_manual_priority(20, at(1)).expect("registered");
        assert!(!muxer.is_source_auto_select_enabled());
        assert_eq!(muxer.current_priority(), 20);

        assert!(muxer.clear_input(20, at(2)));
        assert!(muxer.is_source_auto_select_enabled());
        assert_eq!(muxer.current_priority(), 10);

        assert_eq!(
            muxer.set_manual_priority(99, at(3)),
            Err(MuxerError::NotRegistered(99))
        );
    }

    #[test]
    fn test_fallback_follows_led_count() {
        let mut muxer = PriorityMuxer::new(2);
        muxer.set_led_count(5);
        assert_eq!(muxer.visible_colors().len(), 5);
    }
}
