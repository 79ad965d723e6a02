mod tests {
    use embassy_time::Instant;
    use myrtio_ambilight::Rgb;
    use myrtio_ambilight::error::ConfigError;
    use myrtio_ambilight::smoothing::{
        ColorSmoothing, Ditherer, OutputQueue, SMOOTHING_CFG_PAUSE, SMOOTHING_CFG_SYSTEM,
        SmoothingConfig, SmoothingKind, assemble_frame, decay_weighting,
    };

    const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn gray(value: u8) -> Rgb {
        Rgb {
            r: value,
            g: value,
            b: value,
        }
    }

    fn config(kind: SmoothingKind, settling_time_ms: u32) -> SmoothingConfig {
        SmoothingConfig {
            kind,
            settling_time_ms,
            ..SmoothingConfig::default()
        }
    }

    #[test]
    fn test_linear_reaches_target_at_settling_time() {
        let mut smoothing = ColorSmoothing::new(&config(SmoothingKind::Linear, 1000));
        assert!(smoothing.update_led_values(&[BLACK], at(0)));
        assert!(smoothing.update_led_values(&[WHITE], at(0)));

        let half = smoothing.tick(at(500)).expect("frame");
        assert!(half[0].r.abs_diff(128) <= 1, "{:?}", half[0]);

        let done = smoothing.tick(at(1000)).expect("frame");
        assert_eq!(done, vec![WHITE]);
        let later = smoothing.tick(at(1500)).expect("frame");
        assert_eq!(later, vec![WHITE]);
    }

    #[test]
    fn test_linear_zero_settling_jumps() {
        let mut smoothing = ColorSmoothing::new(&config(SmoothingKind::Linear, 0));
        smoothing.update_led_values(&[BLACK, BLACK], at(0));
        smoothing.update_led_values(&[WHITE, gray(10)], at(5));
        assert_eq!(smoothing.tick(at(5)), Some(vec![WHITE, gray(10)]));
    }

    #[test]
    fn test_decay_is_time_weighted_mean() {
        let mut smoothing = ColorSmoothing::new(&config(SmoothingKind::Decay, 1000));
        smoothing.update_led_values(&[gray(100)], at(0));
        smoothing.update_led_values(&[gray(200)], at(500));

        let frame = smoothing.tick(at(1000)).expect("frame");
        assert_eq!(frame, vec![gray(150)]);

        // The first frame left the window
        let frame = smoothing.tick(at(1500)).expect("frame");
        assert_eq!(frame, vec![gray(200)]);
        assert_eq!(smoothing.remembered_frames().count(), 1);
    }

    #[test]
    fn test_decay_custom_weighting() {
        let mut smoothing = ColorSmoothing::new(&config(SmoothingKind::Decay, 1000));
        smoothing.update_led_values(&[BLACK], at(0));
        smoothing.update_led_values(&[WHITE], at(500));

        // Zero weights fall back to the newest frame
        smoothing.set_weighting(|_, _, _| 0.0);
        assert_eq!(smoothing.tick(at(1000)), Some(vec![WHITE]));
    }

    #[test]
    fn test_decay_weighting_favours_recent_frames() {
        let linear = decay_weighting(1000, 1.0);
        let quadratic = decay_weighting(1000, 2.0);

        let old_linear = linear(0, 500_000, 0);
        let new_linear = linear(500_000, 1_000_000, 0);
        assert!((old_linear - new_linear).abs() < 1e-4);

        let old_quadratic = quadratic(0, 500_000, 0);
        let new_quadratic = quadratic(500_000, 1_000_000, 0);
        assert!((old_quadratic - 0.25).abs() < 1e-4);
        assert!((new_quadratic - 0.75).abs() < 1e-4);
    }

    #[test]
    fn test_decay_paces_output() {
        let mut smoothing = ColorSmoothing::new(&config(SmoothingKind::Decay, 200));
        smoothing.update_led_values(&[WHITE], at(0));
        assert!(smoothing.tick(at(10)).is_none());
        assert!(smoothing.tick(at(40)).is_some());
        assert!(smoothing.tick(at(50)).is_none());
        assert!(smoothing.tick(at(80)).is_some());
    }

    #[test]
    fn test_assemble_rounds() {
        let frame = assemble_frame(&[[0.4, 127.5, 300.0], [-3.0, 254.6, 12.49]]);
        assert_eq!(
            frame,
            vec![Rgb { r: 0, g: 128, b: 255 }, Rgb { r: 0, g: 255, b: 12 }]
        );
    }

    #[test]
    fn test_dithering_preserves_average() {
        let target = [[100.4f32, 20.7, 3.5]];
        let mut ditherer = Ditherer::new();
        let frames = 50;
        let mut sums = [0u32; 3];
        for _ in 0..frames {
            let frame = ditherer.assemble(&target);
            sums[0] += u32::from(frame[0].r);
            sums[1] += u32::from(frame[0].g);
            sums[2] += u32::from(frame[0].b);
            for residual in ditherer.residuals()[0] {
                assert!(residual.abs() <= 1.0);
            }
        }
        for (sum, expected) in sums.iter().zip(target[0]) {
            let average = *sum as f32 / frames as f32;
            assert!((average - expected).abs() <= 1.0 / frames as f32 + 1e-3);
        }
    }

    #[test]
    fn test_output_queue_delays_frames() {
        let mut queue = OutputQueue::new(2);
        assert_eq!(queue.push(vec![gray(1)]), None);
        assert_eq!(queue.push(vec![gray(2)]), None);
        assert_eq!(queue.push(vec![gray(3)]), Some(vec![gray(1)]));
        assert_eq!(queue.len(), 2);

        queue.set_delay(0);
        assert!(queue.is_empty());
        assert_eq!(queue.push(vec![gray(4)]), Some(vec![gray(4)]));
    }

    #[test]
    fn test_output_delay_is_capped() {
        let queue = OutputQueue::new(1000);
        assert_eq!(queue.delay(), 16);
    }

    #[test]
    fn test_output_delay_applies_to_ticks() {
        let cfg = SmoothingConfig {
            settling_time_ms: 0,
            output_delay_frames: 1,
            ..SmoothingConfig::default()
        };
        let mut smoothing = ColorSmoothing::new(&cfg);
        smoothing.update_led_values(&[gray(1)], at(0));
        assert_eq!(smoothing.tick(at(0)), None);
        smoothing.update_led_values(&[gray(2)], at(40));
        assert_eq!(smoothing.tick(at(40)), Some(vec![gray(1)]));
    }

    #[test]
    fn test_config_management() {
        let mut smoothing = ColorSmoothing::new(&SmoothingConfig::default());
        assert_eq!(smoothing.current_config(), SMOOTHING_CFG_SYSTEM);

        let id = smoothing.add_config(500, 50.0, 2);
        assert_eq!(id, 4);
        assert_eq!(smoothing.update_config(2, 100, 20.0, 0), 2);
        assert_eq!(smoothing.update_config(42, 100, 20.0, 0), 5);

        assert_eq!(smoothing.select_config(id, false), Ok(()));
        assert_eq!(smoothing.current_config(), id);
        assert_eq!(smoothing.update_interval().as_millis(), 20);
        assert_eq!(smoothing.output_delay(), 2);
    }

    #[test]
    fn test_unknown_config_falls_back() {
        let mut smoothing = ColorSmoothing::new(&SmoothingConfig::default());
        smoothing.add_config(500, 50.0, 0);
        smoothing.select_config(4, false).expect("known config");

        assert_eq!(
            smoothing.select_config(99, false),
            Err(ConfigError::UnknownSmoothingConfig(99))
        );
        assert_eq!(smoothing.current_config(), SMOOTHING_CFG_SYSTEM);

        smoothing.select_config(4, false).expect("known config");
        assert_eq!(smoothing.select_config(99, true), Ok(()));
        assert_eq!(smoothing.current_config(), SMOOTHING_CFG_SYSTEM);
    }

    #[test]
    fn test_pause_keeps_history() {
        let mut smoothing = ColorSmoothing::new(&config(SmoothingKind::Linear, 1000));
        smoothing.update_led_values(&[BLACK], at(0));
        smoothing.set_pause(true);
        assert!(!smoothing.enabled());
        assert!(!smoothing.update_led_values(&[WHITE], at(10)));
        assert!(smoothing.tick(at(20)).is_none());

        smoothing.set_pause(false);
        assert_eq!(smoothing.led_count(), 1);
        assert!(smoothing.tick(at(30)).is_some());
    }

    #[test]
    fn test_pause_config() {
        let mut smoothing = ColorSmoothing::new(&SmoothingConfig::default());
        smoothing
            .select_config(SMOOTHING_CFG_PAUSE, false)
            .expect("built-in config");
        assert!(smoothing.is_paused());
        smoothing
            .select_config(SMOOTHING_CFG_SYSTEM, false)
            .expect("built-in config");
        assert!(smoothing.enabled());
    }

    #[test]
    fn test_disable_clears_state() {
        let mut smoothing = ColorSmoothing::new(&SmoothingConfig::default());
        smoothing.update_led_values(&[WHITE; 3], at(0));
        smoothing.set_enable(false);
        assert!(!smoothing.enabled());
        assert_eq!(smoothing.led_count(), 0);
        assert!(!smoothing.update_led_values(&[WHITE; 3], at(10)));
        assert!(smoothing.tick(at(20)).is_none());
    }

    #[test]
    fn test_led_count_change_restarts() {
        let mut smoothing = ColorSmoothing::new(&config(SmoothingKind::Linear, 1000));
        smoothing.update_led_values(&[BLACK; 3], at(0));
        smoothing.update_led_values(&[WHITE; 5], at(100));
        assert_eq!(smoothing.led_count(), 5);
        assert_eq!(smoothing.tick(at(200)), Some(vec![WHITE; 5]));
    }
}
