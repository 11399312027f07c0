#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rand::Rng;
    use rayon::ThreadPoolBuilder;
    use unitmatch::composite::CompositeRegex;
    use unitmatch::config::{EngineOptions, MeasuresConfig};
    use unitmatch::errors::MatchError;
    use unitmatch::measures_engine::{concat_regex, MeasuresEngine};
    use unitmatch::progress::Reporter;

    fn create_engine() -> MeasuresEngine {
        let config = MeasuresConfig::builtin().unwrap();
        MeasuresEngine::from_config(&config, EngineOptions::default()).unwrap()
    }

    fn composite_for(engine: &MeasuresEngine, text: &str) -> CompositeRegex {
        let regexes = engine.composite_regexes(&[text.to_string()], None).unwrap();
        CompositeRegex::new(&regexes[0]).unwrap()
    }

    #[test]
    fn test_builtin_measures_loaded() {
        let engine = create_engine();
        let names: Vec<&str> = engine.measures().iter().map(|measure| measure.name()).collect();
        assert!(names.contains(&"weight"));
        assert!(names.contains(&"length"));
        assert!(names.contains(&"color"));
    }

    #[test]
    fn test_weight_equivalence_across_units() {
        let engine = create_engine();
        let composite = composite_for(&engine, "Сахар 1кг");

        assert!(composite.is_match("Сахар 1000 г").unwrap());
        assert!(composite.is_match("сахар 1 КГ").unwrap());
        assert!(!composite.is_match("Сахар 2кг").unwrap());
    }

    #[test]
    fn test_decimal_comma_and_point() {
        let engine = create_engine();
        let composite = composite_for(&engine, "Сок 0,5л");

        assert!(composite.is_match("Сок 500 мл").unwrap());
        assert!(composite.is_match("Juice 0.5 l").unwrap());
        assert!(!composite.is_match("Сок 5 л").unwrap());
    }

    #[test]
    fn test_length_window_limits_siblings() {
        let engine = create_engine();
        let composite = composite_for(&engine, "Длина 1м");

        assert!(composite.is_match("Длина 100см").unwrap());
        assert!(!composite.is_match("Длина 1000мм").unwrap());
    }

    #[test]
    fn test_memory_capacity() {
        let engine = create_engine();
        let composite = composite_for(&engine, "Память 1тб");
        assert!(composite.is_match("Память 1000гигабайтов").unwrap());
    }

    #[test]
    fn test_quantity_exclusion_guard() {
        let engine = create_engine();
        let texts = vec!["Коробка".to_string(), "Коробка 5 шт".to_string()];

        let quantity = engine.extract_measure(&texts, "quantity", None).unwrap();
        assert!(quantity[0].starts_with("^(?!.*("));
        assert!(!quantity[1].contains("(?!.*("));

        let guard = CompositeRegex::new(&quantity[0]).unwrap();
        assert!(guard.is_match("Коробка большая").unwrap());
        assert!(!guard.is_match("Коробка 12 шт").unwrap());
    }

    #[test]
    fn test_size_is_not_a_piece_count() {
        let engine = create_engine();
        let table = engine
            .extract_all(&["Коврик 60 x 90 см".to_string()], None)
            .unwrap();

        assert!(table
            .columns
            .iter()
            .filter(|column| column.measure == "quantity" && !column.is_exclusion())
            .all(|column| column.values[0].is_empty()));
        assert!(!table.column("length: centimeter").unwrap().values[0].is_empty());

        let composite = composite_for(&engine, "Коврик 60 x 90 см");
        assert!(composite.is_match("Коврик 60 x 900 мм").unwrap());
    }

    #[test]
    fn test_composite_anchors_exclusions() {
        let engine = create_engine();
        let composite = composite_for(&engine, "Сахар 1кг");

        assert!(composite.pattern().starts_with("^(?!.*("));
        assert_eq!(composite.pattern().matches("^").count(), 1);
        assert!(!composite.is_match("Сахар 1000 г 12 шт").unwrap());
    }

    #[test]
    fn test_text_without_measures() {
        let engine = create_engine();
        let mut table = engine.extract_all(&["просто текст".to_string()], None).unwrap();

        assert!(table
            .columns
            .iter()
            .filter(|column| !column.is_exclusion())
            .all(|column| column.values[0].is_empty()));

        let composites = concat_regex(&mut table, false);
        assert!(!table.columns.is_empty());
        let composite = CompositeRegex::new(&composites[0]).unwrap();
        assert!(composite.is_match("другой текст").unwrap());
    }

    #[test]
    fn test_extraction_table_columns() {
        let engine = create_engine();
        let table = engine.extract_all(&["Сахар 1кг".to_string()], None).unwrap();

        assert_eq!(table.rows, 1);
        let kilogram = table.column("weight: kilogram").unwrap();
        assert!(kilogram.values[0].starts_with("(?=.*("));
        assert!(table.column("exclude: quantity").is_some());
        assert!(table.column("exclude: weight").is_none());
    }

    #[test]
    fn test_randomized_spacing() {
        let engine = create_engine();
        let mut rng = rand::thread_rng();

        for _ in 0..25 {
            let kilograms: u32 = rng.gen_range(1..500);
            let client = format!("Товар {}{}кг", kilograms, " ".repeat(rng.gen_range(0..=3)));
            let source = format!("Товар {}{}г", kilograms * 1000, " ".repeat(rng.gen_range(0..=3)));

            let composite = composite_for(&engine, &client);
            assert!(composite.is_match(&source).unwrap(), "{client} vs {source}");
        }
    }

    #[test]
    fn test_pool_matches_sequential() {
        let engine = create_engine();
        let pool = ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let texts: Vec<String> = (1..40).map(|n| format!("Товар {n} кг, {n} шт")).collect();

        let sequential = engine.extract_all(&texts, None).unwrap();
        let pooled = engine.extract_all(&texts, Some(&pool)).unwrap();
        assert_eq!(sequential, pooled);
    }

    #[test]
    fn test_progress_reported_per_measure() {
        let percents = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&percents);
        let engine = create_engine()
            .with_reporter(Reporter::new().with_progress(move |percent| sink.lock().unwrap().push(percent)));

        engine.extract_all(&["Сахар 1кг".to_string()], None).unwrap();

        let percents = percents.lock().unwrap();
        assert_eq!(percents.len(), engine.measures().len());
        assert_eq!(percents.last(), Some(&100));
    }

    #[test]
    fn test_stop_discards_extraction() {
        let engine = create_engine();
        engine.stop_flag().stop();

        let result = engine.extract_all(&["Сахар 1кг".to_string()], None);
        assert!(matches!(result, Err(MatchError::Cancelled)));

        engine.stop_flag().reset();
        assert!(engine.extract_all(&["Сахар 1кг".to_string()], None).is_ok());
    }

    #[test]
    fn test_strip_extracted_measures() {
        let engine = create_engine();
        let composite = composite_for(&engine, "Сахар 1кг");
        assert_eq!(composite.strip("Сахар 1000 г").unwrap().trim(), "Сахар");
    }
}
