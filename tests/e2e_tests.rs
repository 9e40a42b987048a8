//! End-to-end integration tests
//!
//! These tests validate the complete analysis pipeline using predefined log
//! fixtures. Each test:
//! 1. Compresses every `*.log` file of a fixture directory into a temporary
//!    input directory
//! 2. Runs the selected strategy over that directory
//! 3. Compares every written table with the fixture's `expected_<table>.csv`
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - A single overdraft transaction
//! - A transaction with a missing balance field
//! - Balance ranges across several transactions of one user
//! - Malformed and filtered lines
//! - A realistic service log spread over two files
//!
//! Each fixture is run twice: once with the sync strategy and once with the
//! async strategy.

#[cfg(test)]
mod tests {
    use balance_log_analyzer::cli::StrategyType;
    use balance_log_analyzer::config::AnalyzerConfig;
    use balance_log_analyzer::io::Table;
    use balance_log_analyzer::strategy::{create_strategy, BatchConfig, ProcessingStrategy};
    use balance_log_analyzer::types::AnalyzerError;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    const PREFIX: &str = "log_analysis";

    fn strategy_for(strategy_type: StrategyType) -> Box<dyn ProcessingStrategy> {
        let batch_config = match strategy_type {
            StrategyType::Sync => None,
            // Small batches so fixtures span several tasks
            StrategyType::Async => Some(BatchConfig::new(3, 2)),
        };
        create_strategy(strategy_type, AnalyzerConfig::default(), batch_config)
    }

    fn gzip_file(path: &Path, content: &[u8]) {
        let file = fs::File::create(path).expect("Failed to create gz file");
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(content).expect("Failed to compress");
        encoder.finish().expect("Failed to finish gz stream");
    }

    /// Compress the fixture's `*.log` files into `input_dir` as `*.log.gz`
    fn stage_inputs(fixture_dir: &Path, input_dir: &Path) {
        let mut staged = 0;
        for entry in fs::read_dir(fixture_dir).expect("Failed to read fixture dir") {
            let path = entry.expect("Failed to read fixture entry").path();
            if path.extension().and_then(|e| e.to_str()) != Some("log") {
                continue;
            }
            let content = fs::read(&path).expect("Failed to read fixture log");
            let name = format!(
                "{}.gz",
                path.file_name().and_then(|n| n.to_str()).expect("Non UTF-8 name")
            );
            gzip_file(&input_dir.join(name), &content);
            staged += 1;
        }
        assert!(staged > 0, "No .log inputs in {}", fixture_dir.display());
    }

    /// Run a fixture and compare each table that has an expected file
    ///
    /// # Panics
    ///
    /// Panics if the run fails, a table is missing, or a table differs from
    /// its expected file.
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType) {
        let fixture_dir = Path::new("tests/fixtures").join(fixture_name);
        assert!(
            fixture_dir.is_dir(),
            "Fixture not found: {}",
            fixture_dir.display()
        );

        let input = TempDir::new().expect("Failed to create input dir");
        let output = TempDir::new().expect("Failed to create output dir");
        stage_inputs(&fixture_dir, input.path());

        strategy_for(strategy_type)
            .process(input.path(), output.path())
            .unwrap_or_else(|e| panic!("Failed to process fixture {}: {}", fixture_name, e));

        let mut compared = 0;
        for table in Table::ALL {
            let actual_path = output.path().join(table.file_name(PREFIX));
            assert!(actual_path.is_file(), "Table not written: {}", table);

            let expected_path = fixture_dir.join(format!("expected_{}.csv", table.name()));
            if !expected_path.exists() {
                continue;
            }

            let actual = fs::read_to_string(&actual_path)
                .unwrap_or_else(|e| panic!("Failed to read {}: {}", actual_path.display(), e));
            let expected = fs::read_to_string(&expected_path)
                .unwrap_or_else(|e| panic!("Failed to read {}: {}", expected_path.display(), e));

            assert_eq!(
                actual, expected,
                "\n\nTable mismatch for fixture: {} table: {} (strategy: {:?})\n\nActual:\n{}\n\nExpected:\n{}\n",
                fixture_name, table, strategy_type, actual, expected
            );
            compared += 1;
        }
        assert!(compared > 0, "Fixture {} has no expected tables", fixture_name);
    }

    /// End-to-end test for all fixtures with both strategies
    #[rstest]
    #[case("overdraft_single")]
    #[case("missing_balance")]
    #[case("balance_range")]
    #[case("malformed_lines")]
    #[case("mixed_service_log")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy);
    }

    #[rstest]
    fn test_missing_input_dir_writes_nothing(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let root = TempDir::new().unwrap();
        let output_dir = root.path().join("out");

        let result = strategy_for(strategy).process(&root.path().join("missing"), &output_dir);

        assert!(matches!(result, Err(AnalyzerError::SourceNotFound { .. })));
        assert!(!output_dir.exists());
    }

    #[rstest]
    fn test_no_gz_files_writes_nothing(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let input = TempDir::new().unwrap();
        fs::write(input.path().join("plain.log"), "2024-01-01\tS\tINFO\tx\n").unwrap();
        let output = TempDir::new().unwrap();
        let output_dir = output.path().join("out");

        let result = strategy_for(strategy).process(input.path(), &output_dir);

        assert!(matches!(result, Err(AnalyzerError::NoLogFiles { .. })));
        assert!(!output_dir.exists());
    }

    #[rstest]
    fn test_no_matching_lines_writes_nothing(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let input = TempDir::new().unwrap();
        gzip_file(
            &input.path().join("debug.log.gz"),
            b"2024-01-01T00:00:00Z\tS1\tDEBUG\tProcessing message 1\n",
        );
        let output = TempDir::new().unwrap();
        let output_dir = output.path().join("out");

        let result = strategy_for(strategy).process(input.path(), &output_dir);

        assert!(matches!(result, Err(AnalyzerError::NoMatchingLines { .. })));
        assert!(!output_dir.exists());
    }

    #[test]
    fn test_strategies_write_identical_files() {
        let input = TempDir::new().unwrap();
        stage_inputs(Path::new("tests/fixtures/mixed_service_log"), input.path());

        let sync_out = TempDir::new().unwrap();
        let async_out = TempDir::new().unwrap();
        strategy_for(StrategyType::Sync)
            .process(input.path(), sync_out.path())
            .unwrap();
        strategy_for(StrategyType::Async)
            .process(input.path(), async_out.path())
            .unwrap();

        for table in Table::ALL {
            let name = table.file_name(PREFIX);
            assert_eq!(
                fs::read(sync_out.path().join(&name)).unwrap(),
                fs::read(async_out.path().join(&name)).unwrap(),
                "{} differs between strategies",
                name
            );
        }
    }

    #[test]
    fn test_rerun_overwrites_with_same_content() {
        let input = TempDir::new().unwrap();
        stage_inputs(Path::new("tests/fixtures/mixed_service_log"), input.path());
        let output = TempDir::new().unwrap();
        let strategy = strategy_for(StrategyType::Sync);

        let first = strategy.process(input.path(), output.path()).unwrap();
        let first_files: Vec<Vec<u8>> = Table::ALL
            .iter()
            .map(|t| fs::read(output.path().join(t.file_name(PREFIX))).unwrap())
            .collect();

        let second = strategy.process(input.path(), output.path()).unwrap();
        let second_files: Vec<Vec<u8>> = Table::ALL
            .iter()
            .map(|t| fs::read(output.path().join(t.file_name(PREFIX))).unwrap())
            .collect();

        assert_eq!(first, second);
        assert_eq!(first_files, second_files);
    }
}
