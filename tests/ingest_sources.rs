// tests/ingest_sources.rs
//
// Snapshot acquisition: file source, envelope decoding, error typing.

use std::fs;

use crypto_signal_desk::ingest::{
    fetch_once, parse_envelope, AcquireError, FileSource, SnapshotSource,
};

const FIXTURE: &str = include_str!("fixtures/snapshot.json");

#[tokio::test]
async fn file_source_reads_bare_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("snap.json");
    fs::write(&p, FIXTURE).unwrap();

    let snap = FileSource::new(&p).fetch_snapshot().await.unwrap();
    assert_eq!(snap.crypto_signals.len(), 7);
    assert_eq!(snap.macro_events.len(), 6);
}

#[tokio::test]
async fn file_source_reads_string_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("envelope.json");
    let envelope = serde_json::json!({ "result": FIXTURE });
    fs::write(&p, envelope.to_string()).unwrap();

    let snap = fetch_once(&FileSource::new(&p)).await.unwrap();
    assert_eq!(snap.policy_signals.len(), 2);
}

#[tokio::test]
async fn missing_file_is_io_error() {
    let err = FileSource::new("/definitely/not/here.json")
        .fetch_snapshot()
        .await
        .unwrap_err();
    assert!(matches!(err, AcquireError::Io(_)));
}

#[test]
fn envelope_edge_cases() {
    assert!(matches!(
        parse_envelope(r#"{"error":"WRONGPASS"}"#),
        Err(AcquireError::MissingResult)
    ));
    assert!(matches!(
        parse_envelope(r#"["result"]"#),
        Err(AcquireError::Malformed(_))
    ));
    assert!(matches!(
        parse_envelope(r#"{"result":"{not json"}"#),
        Err(AcquireError::Json(_))
    ));
    // all-null fields degrade, they do not fail
    let snap = parse_envelope(
        r#"{"result":{"cryptoSignals":null,"marketOverview":null,"macroEvents":[{"country":"DE","eventType":"gdp","importance":"extreme"}]}}"#,
    )
    .unwrap();
    assert!(snap.crypto_signals.is_empty());
    assert_eq!(snap.macro_events.len(), 1);
}

#[test]
fn stringly_numbers_do_not_sink_the_snapshot() {
    let snap = parse_envelope(
        r#"{"result":{"cryptoSignals":[{"title":"x","mergedCount":"3"},{"title":"y","mergedCount":-1}],"whaleTrend":{"bull":"5","bear":2.0},"rateCutData":{"mode":"concrete","probability":"62"}}}"#,
    )
    .unwrap();
    assert_eq!(snap.crypto_signals[0].merged_count(), 3);
    assert_eq!(snap.crypto_signals[1].merged_count(), 1);
    assert_eq!(
        (snap.whale_trend.bull, snap.whale_trend.bear),
        (Some(5), Some(2))
    );
    assert_eq!(snap.rate_cut_data.unwrap().probability, Some(62.0));
}
