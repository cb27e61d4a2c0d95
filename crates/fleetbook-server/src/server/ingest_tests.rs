//! Tests for batch metric ingestion.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use super::ingest::{IngestOutcome, SERVER_NOT_FOUND, ingest_batch};
use super::test_helpers::{seed_server, test_db};

#[tokio::test]
async fn resolves_by_name_and_rejects_unknown_id() {
    let db = test_db().await;
    seed_server(&db, "11111111-1111-4111-8111-111111111111", "X").await;

    let missing = json!({"server_id": "nonexistent", "metric": "cpu", "value": 2.0});
    let outcomes = ingest_batch(
        &db,
        vec![
            json!({"server_name": "X", "metric": "cpu", "ts": "2026-03-31T10:00:00Z", "value": 1.5}),
            missing.clone(),
        ],
    )
    .await;

    assert_eq!(
        outcomes,
        vec![
            IngestOutcome::Stored,
            IngestOutcome::Rejected {
                error: SERVER_NOT_FOUND.into(),
                item: missing,
            },
        ]
    );
    assert_eq!(
        serde_json::to_value(&outcomes).unwrap(),
        json!([
            {"success": true},
            {"success": false, "error": "Server not found",
             "item": {"server_id": "nonexistent", "metric": "cpu", "value": 2.0}}
        ])
    );

    let latest = db
        .latest_metrics("11111111-1111-4111-8111-111111111111")
        .await
        .unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].ts, 1_774_951_200_000);
}

#[tokio::test]
async fn server_id_takes_precedence_over_name() {
    let db = test_db().await;
    seed_server(&db, "a", "alpha").await;
    seed_server(&db, "b", "bravo").await;

    let outcomes = ingest_batch(
        &db,
        vec![json!({"server_id": "b", "server_name": "alpha", "metric": "cpu", "value": 1})],
    )
    .await;

    assert!(outcomes[0].is_stored());
    assert_eq!(db.count_metrics("b").await.unwrap(), 1);
    assert_eq!(db.count_metrics("a").await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_items_do_not_stop_the_batch() {
    let db = test_db().await;
    seed_server(&db, "s1", "srv").await;

    let outcomes = ingest_batch(
        &db,
        vec![
            json!({"server_id": "s1", "value": 1.0}),
            json!({"server_id": "s1", "metric": "cpu"}),
            json!({"server_id": "s1", "metric": "cpu", "value": 1.0, "ts": "yesterday"}),
            json!({"server_id": "s1", "metric": "cpu", "value": "high"}),
            json!("not an object"),
            json!({"server_id": "s1", "metric": "cpu", "value": 3.0, "ts": 1_700_000_000_000_i64}),
        ],
    )
    .await;

    let errors: Vec<Option<&str>> = outcomes
        .iter()
        .map(|o| match o {
            IngestOutcome::Stored => None,
            IngestOutcome::Rejected { error, .. } => Some(error.as_str()),
        })
        .collect();

    assert_eq!(errors[0], Some("metric is required"));
    assert_eq!(errors[1], Some("value is required"));
    assert!(errors[2].unwrap().starts_with("Invalid ts"));
    assert!(errors[3].unwrap().starts_with("Malformed item"));
    assert_eq!(errors[4], Some("Item must be an object"));
    assert_eq!(errors[5], None);

    let history = db.metric_history("s1", "cpu", None, None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].ts, 1_700_000_000_000);
}

#[tokio::test]
async fn missing_ts_defaults_to_now() {
    let db = test_db().await;
    seed_server(&db, "s1", "srv").await;
    let before = fleetbook_core::db::unix_timestamp_millis();

    let outcomes = ingest_batch(
        &db,
        vec![json!({"server_id": "s1", "metric": "mem", "value": 42})],
    )
    .await;
    assert!(outcomes[0].is_stored());

    let latest = db.latest_metrics("s1").await.unwrap();
    assert!(latest[0].ts >= before);
}

#[tokio::test]
async fn empty_batch_yields_no_outcomes() {
    let db = test_db().await;
    assert!(ingest_batch(&db, Vec::new()).await.is_empty());
}
