//! Integration test: Full run (load → train → save → reload → evaluate → predict)

use std::io::Write;
use std::path::Path;
use taxi_fare::cli::run;
use taxi_fare::config::AppConfig;
use taxi_fare::export::{read_metadata, ModelSerializer};
use taxi_fare::preprocessing::TransformMode;
use taxi_fare::training::{BoostingConfig, TrainedModel};
use taxi_fare::TaxiFareError;

const HEADER: &str =
    "vendor_id,rate_code,passenger_count,trip_time_in_secs,trip_distance,payment_type,fare_amount";

/// Deterministic trips with fares close to 2.5 + 2.5 per mile
fn write_trips(path: &Path, n: usize, offset: usize) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for i in offset..offset + n {
        let vendor = if i % 2 == 0 { "VTS" } else { "CMT" };
        let rate = if i % 17 == 0 { "2" } else { "1" };
        let payment = if i % 3 == 0 { "CSH" } else { "CRD" };
        let passengers = 1 + i % 4;
        let distance = 0.2 + (i % 97) as f64 * 0.15;
        let seconds = (distance * 180.0) as u64 + 60;
        let fare = if rate == "2" {
            52.0
        } else {
            2.5 + 2.5 * distance + (i % 5) as f64 * 0.1
        };
        writeln!(
            file,
            "{},{},{},{},{:.2},{},{:.2}",
            vendor, rate, passengers, seconds, distance, payment, fare
        )
        .unwrap();
    }
}

fn fixture_config(dir: &Path) -> AppConfig {
    write_trips(&dir.join("taxi-fare-train.csv"), 800, 0);
    write_trips(&dir.join("taxi-fare-test.csv"), 200, 5000);
    AppConfig::default()
        .with_data_dir(dir)
        .with_booster(BoostingConfig::default().with_num_trees(40))
}

fn parse_value(line: &str, prefix: &str) -> f64 {
    line.strip_prefix(prefix)
        .unwrap_or_else(|| panic!("line '{}' does not start with '{}'", line, prefix))
        .trim()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn test_run_prints_three_result_lines() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());

    let mut out = Vec::new();
    run(&config, &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "unexpected output: {}", text);

    let rms = parse_value(lines[0], "Rms = ");
    let r_squared = parse_value(lines[1], "RSquared = ");
    assert!(rms >= 0.0 && rms.is_finite());
    assert!(r_squared <= 1.0);
    assert!(r_squared > 0.8, "model should explain most of the variance, got {}", r_squared);

    let prediction_line = lines[2];
    assert!(prediction_line.starts_with("Predicted fare: "));
    assert!(prediction_line.ends_with(", actual fare: 29.5"));
    let fare: f64 = prediction_line
        .trim_start_matches("Predicted fare: ")
        .trim_end_matches(", actual fare: 29.5")
        .parse()
        .unwrap();
    assert!(fare.is_finite() && fare > 0.0);

    assert!(config.model_path().exists());
}

#[tokio::test]
async fn test_saved_model_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    run(&config, &mut Vec::new()).await.unwrap();

    let records = taxi_fare::data::DataLoader::default()
        .load_all(config.train_path())
        .unwrap();
    let refit = config.pipeline().fit(&records).unwrap();
    let loaded = TrainedModel::load(config.model_path()).unwrap();
    assert_eq!(loaded.transforms(), refit.transforms());
    assert_eq!(loaded.config(), refit.config());

    let test_records = taxi_fare::data::DataLoader::default()
        .load_all(config.test_path())
        .unwrap();
    let from_disk = loaded
        .score(&loaded.featurize(&test_records, TransformMode::Labeled).unwrap())
        .unwrap();
    let refitted = refit
        .score(&refit.featurize(&test_records, TransformMode::Labeled).unwrap())
        .unwrap();
    for (a, b) in from_disk.iter().zip(refitted.iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }

    let metadata = read_metadata(config.model_path()).unwrap();
    assert_eq!(metadata.training_rows, 800);
    assert_eq!(metadata.target_name, "fare_amount");
    assert_eq!(metadata.feature_names.len(), loaded.feature_names().len());
}

#[tokio::test]
async fn test_missing_training_file_fails_before_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::default().with_data_dir(dir.path());
    let mut out = Vec::new();
    let err = run(&config, &mut out).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TaxiFareError>(),
        Some(TaxiFareError::FileAccess { .. })
    ));
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_corrupted_model_file_detected() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    run(&config, &mut Vec::new()).await.unwrap();

    let path = config.model_path();
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 20;
    bytes[last] ^= 0xff;
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        TrainedModel::load(&path),
        Err(TaxiFareError::Serialization(_))
    ));
}
