mod common;

use common::{StubServer, FLOW_BODY};
use smart_city_engine::{
    live_source, load_feedback_csv, Advisory, DashboardRow, EngineConfig, Error, LocationRegistry,
    Pipeline, PipelineReport, Priority,
};
use std::io::Write;
use std::sync::Arc;

const FEEDBACK_CSV: &str = "\
timestamp,location,feedback_text,source
2024-05-01T08:30:00Z,Bengaluru,\"Huge traffic jam near the flyover, it's been an hour!\",Twitter
2024-05-01T08:35:00Z,Bengaluru,Potholes on this road are damaging our vehicles.,MobileApp
2024-05-01T08:40:00Z,Pune,\"The metro is so convenient and clean, love it!\",MobileApp
2024-05-01T08:45:00Z,Chennai,Water logging after just a little rain is unacceptable.,Twitter
";

fn write_feedback(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("feedback.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn seeded_offline() -> EngineConfig {
    let mut config = EngineConfig {
        seed: Some(2024),
        ..Default::default()
    };
    config.traffic.enabled = false;
    config
}

#[tokio::test]
async fn test_offline_run_from_csv_feedback() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(LocationRegistry::with_default_locations());
    let feedback = load_feedback_csv(&write_feedback(&dir, FEEDBACK_CSV), &registry).unwrap();
    assert_eq!(feedback.len(), 4);

    let config = seeded_offline();
    let source = live_source(&config, Some("unused".to_string())).unwrap();
    let pipeline = Pipeline::new(&config, registry.clone(), source).unwrap();

    let report = pipeline.run(&feedback).await.unwrap();

    assert_eq!(report.rows.len(), registry.len());
    assert_eq!(report.live_count(), 0);

    let bengaluru = report.row("Bengaluru").unwrap();
    assert_eq!(bengaluru.feedback_count, 2);
    assert!(bengaluru.avg_sentiment_polarity.unwrap() < -0.2);

    let delhi = report.row("Delhi").unwrap();
    assert_eq!(delhi.feedback_count, 0);
    assert_eq!(delhi.avg_sentiment_polarity, None);
    assert_ne!(delhi.advisory, Advisory::DispatchWarden);
    assert_ne!(delhi.advisory, Advisory::ReviewFeedback);

    // Chennai: "unacceptable" alone is strongly negative
    let chennai = report.row("Chennai").unwrap();
    assert!(chennai.avg_sentiment_polarity.unwrap() < -0.4);
    assert_eq!(chennai.priority, Priority::High);
}

#[tokio::test]
async fn test_live_run_through_http_stub() {
    let server = StubServer::ok(FLOW_BODY).await;
    let mut config = EngineConfig {
        seed: Some(9),
        ..Default::default()
    };
    config.traffic.base_url = server.base_url.clone();
    config.traffic.timeout_ms = 500;

    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(LocationRegistry::with_default_locations());
    let feedback = load_feedback_csv(&write_feedback(&dir, FEEDBACK_CSV), &registry).unwrap();

    let source = live_source(&config, Some("stub-key".to_string())).unwrap();
    let pipeline = Pipeline::new(&config, registry.clone(), source).unwrap();
    let report = pipeline.run(&feedback).await.unwrap();

    assert_eq!(report.live_count(), registry.len());
    for row in &report.rows {
        // 1 - 18 / 50
        assert!((row.congestion_score - 0.64).abs() < 1e-9);
        assert_eq!(row.vehicle_count, 290);
        assert_eq!(row.traffic_source, "live");
    }

    // 0.64 is below both congestion thresholds, so only sentiment can escalate
    assert_eq!(report.row("Chennai").unwrap().advisory, Advisory::ReviewFeedback);
    assert_eq!(report.row("Pune").unwrap().priority, Priority::Low);
    assert_eq!(report.row("Delhi").unwrap().priority, Priority::Low);
}

#[tokio::test]
async fn test_exports_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(LocationRegistry::with_default_locations());
    let feedback = load_feedback_csv(&write_feedback(&dir, FEEDBACK_CSV), &registry).unwrap();

    let config = seeded_offline();
    let pipeline = Pipeline::new(&config, registry.clone(), live_source(&config, None).unwrap()).unwrap();
    let report = pipeline.run(&feedback).await.unwrap();

    let csv_path = dir.path().join("recommendations.csv");
    let json_path = dir.path().join("report.json");
    report.write_csv(&csv_path).unwrap();
    report.write_json(&json_path).unwrap();

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let rows: Vec<DashboardRow> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), registry.len());

    // CSV is in ranked order: priorities never increase down the file
    for pair in rows.windows(2) {
        assert!(pair[0].priority >= pair[1].priority);
    }

    let parsed: PipelineReport =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed.run_id, report.run_id);
    assert_eq!(parsed.fingerprint().unwrap(), report.fingerprint().unwrap());
}

#[test]
fn test_feedback_for_unknown_location_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let registry = LocationRegistry::with_default_locations();
    let csv = "timestamp,location,feedback_text,source\n\
               2024-05-01T08:30:00Z,Gotham,Streets are dark,Twitter\n";

    let result = load_feedback_csv(&write_feedback(&dir, csv), &registry);
    assert!(matches!(result, Err(Error::InvalidRecord(message)) if message.contains("row 2")));
}

#[test]
fn test_config_file_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(
        &path,
        r#"
seed = 11

[traffic]
enabled = false

[rules]
severe_congestion = 0.6

[fallback]
hotspots = ["Mumbai", "Delhi"]
"#,
    )
    .unwrap();

    let config = EngineConfig::from_file(&path).unwrap();
    let registry = Arc::new(LocationRegistry::with_default_locations());
    let pipeline = Pipeline::new(&config, registry, live_source(&config, None).unwrap());

    assert!(pipeline.is_ok());
    assert_eq!(config.seed, Some(11));
    assert_eq!(config.rules.severe_congestion, 0.6);
    assert_eq!(config.fallback.hotspots.len(), 2);
}
