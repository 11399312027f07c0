#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;
    use unitmatch::config::{EngineOptions, MeasuresConfig};
    use unitmatch::errors::ConfigError;
    use unitmatch::feature_flow::FeatureValidator;
    use unitmatch::measure_types::MergeMode;
    use unitmatch::measures_engine::MeasuresEngine;

    const VOLUME_CONFIG: &str = r#"{
        "config_name": "volume only",
        "numeric_measures": {
            "use_it": true,
            "measures": [
                {
                    "measure_name": "volume",
                    "measure_data": {
                        "common_prefix": "",
                        "common_postfix": "(?!\\w)",
                        "common_max_count": 2,
                        "units": [
                            {"unit_name": "milliliter", "symbol": "мл|ml", "relative_weight": "0.001", "prefix": "common", "postfix": "common", "max_count": "common", "search_mode": "behind"},
                            {"unit_name": "liter", "symbol": "л|l", "relative_weight": 1, "prefix": "common", "postfix": "common", "max_count": "common", "search_mode": "behind"},
                            {"unit_name": "barrel", "symbol": "bbl", "relative_weight": 159, "use_it": false}
                        ]
                    },
                    "autosem": {"merge_mode": "sideways", "exclude_rx": false, "use_it": true},
                    "feature_flow": {"use_it": true, "validation_mode": "lenient", "not_found_mode": "strict", "priority": 5}
                }
            ]
        }
    }"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn with_unit(symbol: &str, weight: &str) -> String {
        format!(
            r#"{{"numeric_measures": {{"use_it": true, "measures": [{{
                "measure_name": "broken",
                "measure_data": {{"units": [{{"unit_name": "u", "symbol": "{symbol}", "relative_weight": {weight}}}]}},
                "autosem": {{"use_it": true}},
                "feature_flow": {{"use_it": true}}
            }}]}}}}"#
        )
    }

    #[test]
    fn test_load_config_from_file() {
        let file = write_config(VOLUME_CONFIG);
        let config = MeasuresConfig::from_path(file.path()).unwrap();

        assert_eq!(config.config_name.as_deref(), Some("volume only"));
        assert_eq!(config.numeric_measures.measures.len(), 1);
        assert!(!config.string_measures.use_it);
    }

    #[test]
    fn test_disabled_units_are_skipped() {
        let config = MeasuresConfig::from_json_str(VOLUME_CONFIG).unwrap();
        let engine = MeasuresEngine::from_config(&config, EngineOptions::default()).unwrap();

        let volume = &engine.measures()[0];
        let names: Vec<&str> = volume.units().iter().map(|unit| unit.name()).collect();
        assert_eq!(names, vec!["milliliter", "liter"]);
        assert_eq!(volume.units()[0].max_count(), Some(2));
    }

    #[test]
    fn test_unknown_modes_fall_back() {
        let config = MeasuresConfig::from_json_str(VOLUME_CONFIG).unwrap();
        let engine = MeasuresEngine::from_config(&config, EngineOptions::default()).unwrap();
        assert_eq!(engine.measures()[0].merge_mode(), MergeMode::Overall);

        let validator = FeatureValidator::from_config(&config).unwrap();
        let row = validator.validate_pair("Вода 1 л", "Вода 1000 мл").unwrap();
        assert!(row.validated);
    }

    #[test]
    fn test_disabled_group_builds_nothing() {
        let config = MeasuresConfig::from_json_str(
            &VOLUME_CONFIG.replacen(r#""use_it": true,"#, r#""use_it": false,"#, 1),
        )
        .unwrap();

        let engine = MeasuresEngine::from_config(&config, EngineOptions::default()).unwrap();
        assert!(engine.measures().is_empty());
        assert!(FeatureValidator::from_config(&config).unwrap().features().is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = MeasuresConfig::from_path("/nonexistent/unitmatch/measures.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let file = write_config("{\"numeric_measures\": ");
        assert!(matches!(
            MeasuresConfig::from_path(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_non_positive_weight_is_fatal() {
        let config = MeasuresConfig::from_json_str(&with_unit("g", "0")).unwrap();
        assert!(matches!(
            MeasuresEngine::from_config(&config, EngineOptions::default()),
            Err(ConfigError::NonPositiveWeight { .. })
        ));
        assert!(matches!(
            FeatureValidator::from_config(&config),
            Err(ConfigError::NonPositiveWeight { .. })
        ));
    }

    #[test]
    fn test_invalid_symbol_is_fatal() {
        let config = MeasuresConfig::from_json_str(&with_unit("(g", "1")).unwrap();
        assert!(matches!(
            MeasuresEngine::from_config(&config, EngineOptions::default()),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let config = MeasuresConfig::from_json_str(VOLUME_CONFIG).unwrap();
        let options = EngineOptions {
            chunk_size: 0,
            ..Default::default()
        };

        assert!(matches!(
            MeasuresEngine::from_config(&config, options.clone()),
            Err(ConfigError::InvalidOption { option: "chunk_size", .. })
        ));
        assert!(FeatureValidator::from_config(&config)
            .unwrap()
            .with_options(options)
            .is_err());
    }
}
