//! Integration tests for the feature pipeline, trainer and persistence

use taxi_fare::data::{test_trips, TripRecord};
use taxi_fare::export::ModelSerializer;
use taxi_fare::inference::Predictor;
use taxi_fare::preprocessing::{HandleUnknown, LearningPipeline, PipelineStep, TransformMode};
use taxi_fare::training::{BoostingConfig, RegressionMetrics, TrainedModel};
use taxi_fare::TaxiFareError;

fn create_trips(n: usize) -> Vec<TripRecord> {
    (0..n)
        .map(|i| {
            let vendor = if i % 3 == 0 { "CMT" } else { "VTS" };
            let payment = if i % 4 == 0 { "CSH" } else { "CRD" };
            let distance = 0.3 + (i % 40) as f64 * 0.4;
            TripRecord::new(vendor, "1", 1 + (i % 3) as u32, distance, payment)
                .with_fare(3.0 + 2.4 * distance + (i % 7) as f64 * 0.05)
        })
        .collect()
}

fn unlabeled(records: &[TripRecord]) -> Vec<TripRecord> {
    records
        .iter()
        .map(|r| TripRecord {
            fare_amount: None,
            ..r.clone()
        })
        .collect()
}

fn booster() -> BoostingConfig {
    BoostingConfig::default().with_num_trees(30)
}

fn training_metrics(model: &TrainedModel, records: &[TripRecord]) -> RegressionMetrics {
    let features = model.featurize(records, TransformMode::Labeled).unwrap();
    let predictions = model.score(&features).unwrap();
    RegressionMetrics::compute(features.labels().unwrap(), &predictions).unwrap()
}

#[test]
fn test_training_metrics_are_bounded() {
    let records = create_trips(400);
    let model = LearningPipeline::taxi_fare(HandleUnknown::Ignore, booster())
        .fit(&records)
        .unwrap();
    let metrics = training_metrics(&model, &records);
    assert!(metrics.rms >= 0.0);
    assert!((0.0..=1.0).contains(&metrics.r_squared));
    assert!(metrics.r_squared > 0.9);
    assert!(metrics.mae <= metrics.rms + 1e-12);
}

#[test]
fn test_seeded_training_is_deterministic() {
    let records = create_trips(300);
    let pipeline = LearningPipeline::taxi_fare(HandleUnknown::Ignore, booster().with_seed(7));
    let a = pipeline.fit(&records).unwrap();
    let b = pipeline.fit(&records).unwrap();
    assert_eq!(a.regressor().base_score().to_bits(), b.regressor().base_score().to_bits());

    let pa = Predictor::new(&a).predict_batch(&unlabeled(&records)).unwrap();
    let pb = Predictor::new(&b).predict_batch(&unlabeled(&records)).unwrap();
    for (x, y) in pa.iter().zip(&pb) {
        assert_eq!(x.fare_amount.to_bits(), y.fare_amount.to_bits());
    }

    let trip = test_trips::trip1();
    let pa = Predictor::new(&a).predict(&trip).unwrap();
    let pb = Predictor::new(&b).predict(&trip).unwrap();
    assert_eq!(pa.fare_amount.to_bits(), pb.fare_amount.to_bits());
}

#[test]
fn test_round_trip_predictions_are_identical() {
    let records = create_trips(300);
    let model = LearningPipeline::taxi_fare(HandleUnknown::Ignore, booster())
        .fit(&records)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Model.bin");
    model.save(&path).unwrap();
    let loaded = TrainedModel::load(&path).unwrap();
    assert_eq!(loaded.metadata(), model.metadata());
    assert_eq!(loaded.transforms(), model.transforms());
    assert_eq!(loaded.config(), model.config());

    let unlabeled = unlabeled(&records);
    let before = Predictor::new(&model).predict_batch(&unlabeled).unwrap();
    let after = Predictor::new(&loaded).predict_batch(&unlabeled).unwrap();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.fare_amount.to_bits(), a.fare_amount.to_bits());
    }
}

#[test]
fn test_unknown_category_prediction_is_finite() {
    let model = LearningPipeline::taxi_fare(HandleUnknown::Ignore, booster())
        .fit(&create_trips(200))
        .unwrap();
    let unseen = TripRecord::new("DDS", "6", 4, 12.0, "UNK");
    let prediction = Predictor::new(&model).predict(&unseen).unwrap();
    assert!(prediction.fare_amount.is_finite());
}

#[test]
fn test_missing_label_column_is_reported() {
    let unlabeled: Vec<TripRecord> = create_trips(50)
        .into_iter()
        .map(|mut r| {
            r.fare_amount = None;
            r
        })
        .collect();
    let result = LearningPipeline::default().fit(&unlabeled);
    assert!(matches!(result, Err(TaxiFareError::ColumnNotFound(ref c)) if c == "fare_amount"));
}

#[test]
fn test_invalid_booster_options_rejected() {
    let config = BoostingConfig::default().with_learning_rate(-0.1);
    let result = LearningPipeline::taxi_fare(HandleUnknown::Ignore, config).fit(&create_trips(50));
    assert!(matches!(result, Err(TaxiFareError::InvalidParameter { .. })));
}

#[test]
fn test_custom_pipeline_from_json() {
    let json = r#"[
        {"kind": "copy_column", "source": "fare_amount", "target": "Label"},
        {"kind": "one_hot_encode", "columns": ["payment_type"]},
        {"kind": "concatenate", "output": "Features", "columns": ["trip_distance", "payment_type"]},
        {"kind": "train", "num_trees": 10, "max_depth": 3, "min_samples_leaf": 5}
    ]"#;
    let steps: Vec<PipelineStep> = serde_json::from_str(json).unwrap();
    let pipeline = steps
        .into_iter()
        .fold(LearningPipeline::new(), |p, step| p.with_step(step));

    let model = pipeline.fit(&create_trips(120)).unwrap();
    assert_eq!(
        model.feature_names(),
        &["trip_distance", "payment_type_CSH", "payment_type_CRD"]
    );
    assert_eq!(model.regressor().n_trees(), 10);
    assert_eq!(model.config().max_depth, 3);
}
