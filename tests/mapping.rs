mod tests {
    use myrtio_ambilight::border::BlackBorder;
    use myrtio_ambilight::mapping::{
        Led, LedMapper, LedString, MappingConfig, MappingType, ScanRect,
    };
    use myrtio_ambilight::{ColorOrder, Image, Rgb};

    const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
    const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };
    const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    fn full_frame_led() -> LedString {
        LedString::from_leds(vec![Led::new(0.0, 1.0, 0.0, 1.0, ColorOrder::Rgb)])
    }

    fn mapper_with(leds: LedString, mapping_type: MappingType) -> LedMapper {
        let config = MappingConfig {
            mapping_type,
            ..MappingConfig::default()
        };
        LedMapper::new(leds, &config)
    }

    #[test]
    fn test_led_clamps_and_swaps() {
        let led = Led::new(0.8, 0.2, -1.0, 2.0, ColorOrder::Grb);
        assert_eq!(
            led.scan_rect(),
            ScanRect {
                min_x: 0.2,
                max_x: 0.8,
                min_y: 0.0,
                max_y: 1.0
            }
        );
        assert!(!led.is_degenerate());
        assert!(Led::new(0.5, 0.5, 0.0, 1.0, ColorOrder::Rgb).is_degenerate());
    }

    #[test]
    fn test_solid_image_maps_every_led() {
        let mut mapper = mapper_with(LedString::horizontal_strip(10), MappingType::MulticolorMean);
        let colors = mapper.map(&Image::filled(100, 100, RED), BlackBorder::UNKNOWN);
        assert_eq!(colors, vec![RED; 10]);
    }

    #[test]
    fn test_empty_image_maps_to_black() {
        let mut mapper = mapper_with(LedString::horizontal_strip(4), MappingType::MulticolorMean);
        let colors = mapper.map(&Image::default(), BlackBorder::UNKNOWN);
        assert_eq!(colors, vec![BLACK; 4]);
    }

    #[test]
    fn test_degenerate_led_is_black() {
        let leds = LedString::from_leds(vec![
            Led::new(0.0, 1.0, 0.0, 1.0, ColorOrder::Rgb),
            Led::new(0.3, 0.3, 0.0, 1.0, ColorOrder::Rgb),
        ]);
        let mut mapper = mapper_with(leds, MappingType::MulticolorMean);
        let colors = mapper.map(&Image::filled(20, 20, WHITE), BlackBorder::UNKNOWN);
        assert_eq!(colors, vec![WHITE, BLACK]);
    }

    #[test]
    fn test_border_is_excluded_from_sampling() {
        let mut image = Image::filled(100, 100, BLACK);
        image.fill_rect(0, 10, 100, 90, BLUE);
        let mut mapper = mapper_with(full_frame_led(), MappingType::MulticolorMean);

        let with_bars = mapper.map(&image, BlackBorder::UNKNOWN);
        assert_eq!(with_bars, vec![Rgb { r: 0, g: 0, b: 204 }]);

        let without_bars = mapper.map(&image, BlackBorder::known(10, 0));
        assert_eq!(without_bars, vec![BLUE]);
        let map = mapper.cached_map().expect("mapping built");
        assert_eq!(map.horizontal_border(), 10);
    }

    #[test]
    fn test_border_eating_the_frame_is_ignored() {
        let mut mapper = mapper_with(full_frame_led(), MappingType::MulticolorMean);
        let colors = mapper.map(&Image::filled(10, 10, GREEN), BlackBorder::known(5, 0));
        assert_eq!(colors, vec![GREEN]);
        assert_eq!(mapper.cached_map().map(|map| map.horizontal_border()), Some(0));
    }

    #[test]
    fn test_mean_squared_favours_bright_pixels() {
        let mut image = Image::filled(10, 10, BLACK);
        image.fill_rect(0, 0, 5, 10, WHITE);

        let mut mean = mapper_with(full_frame_led(), MappingType::MulticolorMean);
        assert_eq!(
            mean.map(&image, BlackBorder::UNKNOWN),
            vec![Rgb {
                r: 127,
                g: 127,
                b: 127
            }]
        );

        let mut squared = mapper_with(full_frame_led(), MappingType::MulticolorMeanSquared);
        assert_eq!(
            squared.map(&image, BlackBorder::UNKNOWN),
            vec![Rgb {
                r: 180,
                g: 180,
                b: 180
            }]
        );
    }

    #[test]
    fn test_dominant_color() {
        let mut image = Image::filled(8, 8, RED);
        image.fill_rect(0, 0, 8, 2, GREEN);
        let mut mapper = mapper_with(full_frame_led(), MappingType::DominantColor);
        assert_eq!(mapper.map(&image, BlackBorder::UNKNOWN), vec![RED]);
    }

    #[test]
    fn test_dominant_color_advanced_picks_largest_cluster() {
        let mut image = Image::filled(10, 10, Rgb { r: 200, g: 10, b: 10 });
        image.fill_rect(0, 0, 10, 1, Rgb { r: 204, g: 14, b: 10 });
        image.fill_rect(0, 8, 10, 10, BLUE);
        let mut mapper = mapper_with(full_frame_led(), MappingType::DominantColorAdvanced);
        let colors = mapper.map(&image, BlackBorder::UNKNOWN);
        assert_eq!(colors.len(), 1);
        assert!(colors[0].r >= 200 && colors[0].b <= 10, "{:?}", colors[0]);
    }

    #[test]
    fn test_unicolor_broadcasts_frame_mean() {
        let mut image = Image::filled(10, 10, RED);
        image.fill_rect(5, 0, 10, 10, BLUE);
        let mut mapper = mapper_with(LedString::horizontal_strip(2), MappingType::UnicolorMean);
        let purple = Rgb { r: 127, g: 0, b: 127 };
        assert_eq!(mapper.map(&image, BlackBorder::UNKNOWN), vec![purple, purple]);

        mapper.set_mapping_type(MappingType::MulticolorMean);
        assert_eq!(mapper.map(&image, BlackBorder::UNKNOWN), vec![RED, BLUE]);
    }

    #[test]
    fn test_hard_override_restores_user_choice() {
        let mut mapper = mapper_with(full_frame_led(), MappingType::MulticolorMean);
        mapper.set_hard_mapping_type(Some(MappingType::UnicolorMean));
        mapper.set_mapping_type(MappingType::DominantColor);
        assert_eq!(mapper.mapping_type(), MappingType::UnicolorMean);

        mapper.set_hard_mapping_type(Some(MappingType::MulticolorMeanSquared));
        mapper.set_hard_mapping_type(None);
        assert_eq!(mapper.mapping_type(), MappingType::DominantColor);
    }

    #[test]
    fn test_unknown_mapping_name_falls_back() {
        let mut mapper = mapper_with(full_frame_led(), MappingType::DominantColor);
        assert!(mapper.set_mapping_type_str("rainbow_average").is_err());
        assert_eq!(mapper.mapping_type(), MappingType::MulticolorMean);

        assert!(mapper.set_mapping_type_str("unicolor_dominant").is_ok());
        assert_eq!(mapper.mapping_type(), MappingType::UnicolorDominant);
    }

    #[test]
    fn test_mapping_names_round_trip() {
        for mapping in MappingType::ALL {
            assert_eq!(MappingType::parse_from_str(mapping.as_str()), Ok(mapping));
        }
    }

    #[test]
    fn test_rebuild_on_geometry_change() {
        let mut mapper = mapper_with(LedString::horizontal_strip(2), MappingType::MulticolorMean);
        mapper.map(&Image::filled(40, 20, RED), BlackBorder::UNKNOWN);
        assert!(mapper.take_mapping_changed());
        mapper.map(&Image::filled(40, 20, RED), BlackBorder::UNKNOWN);
        assert!(!mapper.take_mapping_changed());

        mapper.map(&Image::filled(80, 40, RED), BlackBorder::UNKNOWN);
        assert!(mapper.take_mapping_changed());

        mapper.set_led_string(LedString::horizontal_strip(5));
        assert!(mapper.take_mapping_changed());
        assert_eq!(mapper.cached_map().map(|map| map.led_count()), Some(5));
        assert_eq!(mapper.map(&Image::filled(80, 40, RED), BlackBorder::UNKNOWN).len(), 5);
    }

    #[test]
    fn test_reduced_pixel_set() {
        let config = MappingConfig {
            reduced_pixel_set_factor: 4,
            ..MappingConfig::default()
        };
        let mut mapper = LedMapper::new(full_frame_led(), &config);
        mapper.map(&Image::filled(16, 16, RED), BlackBorder::UNKNOWN);
        let pixels = mapper
            .cached_map()
            .and_then(|map| map.led_pixels(0))
            .map(<[usize]>::len);
        assert_eq!(pixels, Some(16));
    }

    #[test]
    fn test_scan_parameters() {
        let mapper = mapper_with(LedString::horizontal_strip(4), MappingType::MulticolorMean);
        let rect = mapper.get_scan_parameters(1).expect("led exists");
        assert!((rect.min_x - 0.25).abs() < 1e-9);
        assert!((rect.max_x - 0.5).abs() < 1e-9);
        assert!(mapper.get_scan_parameters(4).is_none());
    }
}
