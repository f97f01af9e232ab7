use bizscope_analytics::{
    AnalysisConfig, AnalysisEngine, AnalysisResult, Direction, Priority, RecommendationCategory,
    SignificanceMode,
};
use bizscope_core::{Dataset, Value};
use bizscope_funnel::{Outcome, PipelineRecord, Severity};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

fn numbers(xs: &[f64]) -> Vec<Value> {
    xs.iter().copied().map(Value::from).collect()
}

fn dataset(columns: Vec<(&str, Vec<Value>)>) -> Dataset {
    Dataset::from_columns(columns.into_iter().map(|(n, v)| (n.to_string(), v)).collect()).unwrap()
}

#[test]
fn revenue_and_cost_report_gross_margin() {
    let ds = dataset(vec![
        ("revenue", numbers(&[100.0, 200.0, 300.0])),
        ("cost", numbers(&[70.0, 80.0, 90.0])),
    ]);
    let result = AnalysisEngine::default().analyze(&ds).unwrap();

    assert_eq!(result.metrics.get("total_revenue"), Some(600.0));
    assert_eq!(result.metrics.get("total_cost"), Some(240.0));
    assert_eq!(result.metrics.get("gross_profit"), Some(360.0));
    assert_eq!(result.metrics.get("gross_margin_percent"), Some(60.0));
}

#[test]
fn dataset_without_numbers_still_analyzes() {
    let ds = dataset(vec![
        ("customer", vec![Value::from("acme"), Value::from("globex")]),
        ("city", vec![Value::from("Oslo"), Value::Missing]),
    ]);
    let result = AnalysisEngine::default().analyze(&ds).unwrap();

    assert!(!result.metrics.has_numeric_data());
    assert!(result.trends.is_empty());
    assert!(result.anomalies.is_empty());
    assert!(result.patterns.correlations.is_empty());
    assert_eq!(result.text_summary.columns, vec!["customer", "city"]);
    let city = result.text_summary.sample("city").unwrap();
    assert_eq!(city.values, vec!["Oslo"]);
}

#[test]
fn steady_growth_is_a_strong_rising_trend() {
    let ys: Vec<f64> = (1..=20).map(f64::from).collect();
    let result = AnalysisEngine::default()
        .analyze(&dataset(vec![("orders", numbers(&ys))]))
        .unwrap();

    let trend = &result.trends[0];
    assert_eq!(trend.direction, Direction::Rising);
    assert!((trend.r_squared - 1.0).abs() < 1e-9);
}

#[test]
fn constant_column_has_collapsed_bounds() {
    let result = AnalysisEngine::default()
        .analyze(&dataset(vec![("fee", numbers(&[7.5; 15]))]))
        .unwrap();

    let anomaly = &result.anomalies[0];
    assert_eq!(anomaly.outlier_count, 0);
    assert_eq!((anomaly.lower_bound, anomaly.upper_bound), (7.5, 7.5));
}

#[test]
fn sparse_column_gets_single_high_priority_advisory() {
    let mut notes: Vec<Value> = (0..7).map(|i| Value::from(format!("n{i}"))).collect();
    notes.extend([Value::Missing, Value::Missing, Value::Missing]);
    let ds = dataset(vec![
        ("notes", notes),
        ("amount", numbers(&[3.0, 4.0, 3.5, 4.2, 3.9, 4.1, 3.7, 3.8, 4.0, 3.6])),
    ]);

    let result = AnalysisEngine::default().analyze(&ds).unwrap();
    let quality: Vec<_> = result
        .recommendations
        .iter()
        .filter(|r| r.category == RecommendationCategory::DataQuality)
        .collect();

    assert_eq!(quality.len(), 1);
    assert_eq!(quality[0].priority, Priority::High);
    assert!(quality[0].text.contains("notes"));
}

#[test]
fn funnel_bottleneck_with_closure_classifier() {
    bizscope_observability::init();
    let engine = AnalysisEngine::default();
    let records: Vec<PipelineRecord> = [("A", 100), ("B", 50), ("C", 10)]
        .iter()
        .flat_map(|(stage, n)| {
            (0..*n).map(move |i| {
                PipelineRecord::new(format!("{stage}{i}"))
                    .with_stage(*stage, *stage)
                    .with_status(if *stage == "C" { "closed" } else { "open" })
            })
        })
        .collect();
    let classifier = |r: &PipelineRecord| match r.status.as_deref() {
        Some("closed") => Outcome::Successful,
        _ => Outcome::Open,
    };

    let funnel = engine.analyze_funnel(&records, &classifier, None);

    assert_eq!(funnel.transitions[0].conversion_rate, 50.0);
    assert_eq!(funnel.bottlenecks.len(), 1);
    let bottleneck = &funnel.bottlenecks[0];
    assert_eq!((bottleneck.from_stage.as_str(), bottleneck.to_stage.as_str()), ("B", "C"));
    assert_eq!(bottleneck.conversion_rate, 20.0);
    assert_eq!(bottleneck.lost_count, 40);
    assert_eq!(bottleneck.severity, Severity::High);
    assert_eq!(funnel.summary.successful_count, 10);
}

#[test]
fn result_survives_json_round_trip() {
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let ds = dataset(vec![
        ("day", (0..12).map(|d| Value::from(t0 + Duration::days(d))).collect()),
        ("sales", numbers(&[5.0, 6.0, 7.0, 6.0, 8.0, 9.0, 8.0, 10.0, 11.0, 12.0, 11.0, 90.0])),
        ("expense", numbers(&[4.0, 4.0, 5.0, 5.0, 6.0, 6.0, 7.0, 7.0, 8.0, 8.0, 9.0, 9.0])),
    ]);
    let result = AnalysisEngine::default().analyze(&ds).unwrap();

    let json = serde_json::to_string(&result).unwrap();
    let back: AnalysisResult = serde_json::from_str(&json).unwrap();

    assert_eq!(back.summary, result.summary);
    assert_eq!(back.recommendations, result.recommendations);
    assert_eq!(back.patterns.date_range, result.patterns.date_range);
    assert_eq!(back.text_summary, result.text_summary);
    assert_eq!(back.metrics.len(), result.metrics.len());
    assert_eq!(back.anomalies[0].outlier_count, result.anomalies[0].outlier_count);
    let names: Vec<_> = back.trends.iter().map(|t| (t.metric.clone(), t.direction)).collect();
    let expected: Vec<_> = result.trends.iter().map(|t| (t.metric.clone(), t.direction)).collect();
    assert_eq!(names, expected);
}

#[test]
fn configuration_file_drives_the_engine() {
    let path = std::env::temp_dir().join(format!("bizscope-config-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{ "trends": { "significance": "correlation_proxy" }, "anomalies": { "min_values": 3 } }"#,
    )
    .unwrap();
    let config = AnalysisConfig::from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.trends.significance, SignificanceMode::CorrelationProxy);
    let result = AnalysisEngine::new(config)
        .analyze(&dataset(vec![("x", numbers(&[1.0, 3.0, 2.0, 5.0, 4.0]))]))
        .unwrap();
    assert!(result.trends[0].significance_estimated);
    assert_eq!(result.anomalies.len(), 1);
}

fn cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        6 => (-1.0e6f64..1.0e6).prop_map(Value::from),
        1 => Just(Value::Missing),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Property: analysis is a pure function of the dataset.
    #[test]
    fn analysis_is_idempotent(
        columns in prop::collection::vec(prop::collection::vec(cell(), 12), 1..6)
    ) {
        let ds = Dataset::from_columns(
            columns
                .into_iter()
                .enumerate()
                .map(|(i, values)| (format!("col{i}"), values))
                .collect(),
        )
        .unwrap();
        let engine = AnalysisEngine::default();

        let first = engine.analyze(&ds).unwrap();
        let second = engine.analyze(&ds).unwrap();

        prop_assert_eq!(&first.metrics, &second.metrics);
        prop_assert_eq!(&first.trends, &second.trends);
        prop_assert_eq!(&first.anomalies, &second.anomalies);
        prop_assert_eq!(&first.recommendations, &second.recommendations);
    }
}
