//! Route tests driving the full router in-process.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use super::test_helpers::TestApp;

const SERVER_A: &str = "a0000000-0000-4000-8000-000000000001";

async fn create(app: &TestApp, body: Value) -> Value {
    let (status, json) = app.post("/api/servers", body).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json
}

fn tag_names(server: &Value) -> Vec<String> {
    let mut names: Vec<String> = server["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["tag"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

// === Registry ===

#[tokio::test]
async fn create_applies_defaults_and_generates_id() {
    let app = TestApp::new().await;
    let server = create(&app, json!({"name": "srv-app-001"})).await;

    assert_eq!(server["environment"], "dev");
    assert_eq!(server["attributes"], json!({}));
    assert_eq!(server["tags"], json!([]));
    assert!(uuid::Uuid::parse_str(server["id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn create_then_get_embeds_recent_metrics() {
    let app = TestApp::new().await;
    create(
        &app,
        json!({"id": SERVER_A, "name": "srv-db-001", "environment": "prod",
               "ipAddress": "10.0.2.10", "tags": ["postgresql", "primary"]}),
    )
    .await;
    for ts in [1_000, 3_000, 2_000] {
        app.state.db.insert_metric(SERVER_A, "cpu", ts, 1.0).await.unwrap();
    }

    let (status, server) = app.get(&format!("/api/servers/{SERVER_A}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server["ipAddress"], "10.0.2.10");
    assert_eq!(tag_names(&server), vec!["postgresql", "primary"]);
    let ts: Vec<&str> = server["metrics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["ts"].as_str().unwrap())
        .collect();
    assert_eq!(
        ts,
        vec![
            "1970-01-01T00:00:03Z",
            "1970-01-01T00:00:02Z",
            "1970-01-01T00:00:01Z"
        ]
    );
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let app = TestApp::new().await;
    let cases = [
        json!({"name": ""}),
        json!({"name": "x", "environment": "qa"}),
        json!({"name": "x", "id": "not-a-uuid"}),
        json!({"os": "no name"}),
    ];
    for body in cases {
        let (status, json) = app.post("/api/servers", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {json}");
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn duplicate_id_is_conflict() {
    let app = TestApp::new().await;
    create(&app, json!({"id": SERVER_A, "name": "one"})).await;
    let (status, _) = app
        .post("/api/servers", json!({"id": SERVER_A, "name": "two"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn patch_semantics() {
    let app = TestApp::new().await;
    create(
        &app,
        json!({"id": SERVER_A, "name": "web", "os": "Debian 12", "role": "Web",
               "tags": ["a", "b"]}),
    )
    .await;
    let uri = format!("/api/servers/{SERVER_A}");

    let (status, server) = app.patch(&uri, json!({"os": null, "name": "web-01"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server["name"], "web-01");
    assert_eq!(server["os"], Value::Null);
    assert_eq!(server["role"], "Web");
    assert_eq!(tag_names(&server), vec!["a", "b"]);

    let (_, server) = app.patch(&uri, json!({"tags": []})).await;
    assert_eq!(server["tags"], json!([]));
}

#[tokio::test]
async fn patch_missing_server_is_404() {
    let app = TestApp::new().await;
    let (status, json) = app
        .patch(&format!("/api/servers/{SERVER_A}"), json!({"name": "x"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], format!("Server {SERVER_A} not found"));
}

#[tokio::test]
async fn delete_returns_record_and_then_404s() {
    let app = TestApp::new().await;
    create(&app, json!({"id": SERVER_A, "name": "gone"})).await;
    let uri = format!("/api/servers/{SERVER_A}");

    let (status, server) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server["name"], "gone");

    assert_eq!(app.get(&uri).await.0, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_sorts_and_pages() {
    let app = TestApp::new().await;
    create(&app, json!({"name": "charlie", "environment": "prod", "tags": ["etl"]})).await;
    create(&app, json!({"name": "alpha", "environment": "prod", "role": "ETL worker"})).await;
    create(&app, json!({"name": "bravo", "environment": "dev", "tags": ["etl"]})).await;

    let (status, page) = app
        .get("/api/servers?sort=name:desc&perPage=2&page=1")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["perPage"], 2);
    assert_eq!(page["totalPages"], 2);
    let names: Vec<&str> = page["servers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["charlie", "bravo"]);

    let (_, by_env) = app.get("/api/servers?env=prod&tags=etl").await;
    assert_eq!(by_env["total"], 1);
    assert_eq!(by_env["servers"][0]["name"], "charlie");

    let (_, search) = app.get("/api/servers?search=etl").await;
    assert_eq!(search["total"], 1);
    assert_eq!(search["servers"][0]["name"], "alpha");

    let (_, fallback) = app.get("/api/servers?page=abc&perPage=0").await;
    assert_eq!(fallback["page"], 1);
    assert_eq!(fallback["perPage"], 30);
}

#[tokio::test]
async fn huge_page_numbers_return_an_empty_page() {
    let app = TestApp::new().await;
    create(&app, json!({"name": "only"})).await;

    let (status, page) = app
        .get("/api/servers?page=4294967295&perPage=4294967295")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 4_294_967_295_u32);
    assert_eq!(page["total"], 1);
    assert_eq!(page["servers"], json!([]));
}

#[tokio::test]
async fn search_matches_accented_names_in_any_case() {
    let app = TestApp::new().await;
    create(&app, json!({"name": "ÉCOLE-web"})).await;
    create(&app, json!({"name": "plain-web"})).await;

    let (status, found) = app.get("/api/servers?search=%C3%A9cole").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["total"], 1);
    assert_eq!(found["servers"][0]["name"], "ÉCOLE-web");
}

#[tokio::test]
async fn uppercase_id_is_usable_after_create() {
    let app = TestApp::new().await;
    let upper = SERVER_A.to_uppercase();
    let created = create(&app, json!({"id": upper, "name": "shouty"})).await;
    assert_eq!(created["id"], SERVER_A);

    let uri = format!("/api/servers/{upper}");
    assert_eq!(app.get(&uri).await.0, StatusCode::OK);
    let (status, patched) = app.patch(&uri, json!({"role": "db"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["role"], "db");

    let (_, latest) = app.get(&format!("{uri}/metrics/latest")).await;
    assert_eq!(latest, json!([]));
    let (_, audit) = app.get(&format!("/api/audit?serverId={upper}")).await;
    assert_eq!(audit["total"], 2);

    assert_eq!(app.delete(&uri).await.0, StatusCode::OK);
    assert_eq!(app.get(&uri).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_sort_field_is_400() {
    let app = TestApp::new().await;
    let (status, json) = app.get("/api/servers?sort=attributes:asc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("attributes"));
}

// === Attribute enforcement ===

#[tokio::test]
async fn enforcement_rejects_type_mismatch_and_writes_nothing() {
    let app = TestApp::enforcing().await;
    app.post(
        "/api/server-fields",
        json!({"key": "cpu_cores", "label": "CPU", "type": "number"}),
    )
    .await;

    let (status, json) = app
        .post(
            "/api/servers",
            json!({"name": "x", "attributes": {"cpu_cores": "eight"}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("cpu_cores"));

    let (_, list) = app.get("/api/servers").await;
    assert_eq!(list["total"], 0);
    let (_, audit) = app.get("/api/audit").await;
    assert_eq!(audit["total"], 0);
}

#[tokio::test]
async fn enforcement_checks_required_on_create_only() {
    let app = TestApp::enforcing().await;
    app.post(
        "/api/server-fields",
        json!({"key": "owner", "label": "Owner", "type": "string", "required": true}),
    )
    .await;

    let (status, _) = app.post("/api/servers", json!({"name": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let server = create(&app, json!({"name": "x", "attributes": {"owner": "ops"}})).await;
    let uri = format!("/api/servers/{}", server["id"].as_str().unwrap());
    let (status, _) = app.patch(&uri, json!({"attributes": {"rack": 4}})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn without_enforcement_attributes_are_free_form() {
    let app = TestApp::new().await;
    app.post(
        "/api/server-fields",
        json!({"key": "cpu_cores", "label": "CPU", "type": "number"}),
    )
    .await;
    let server = create(&app, json!({"name": "x", "attributes": {"cpu_cores": "eight"}})).await;
    assert_eq!(server["attributes"]["cpu_cores"], "eight");
}

// === Field catalog ===

#[tokio::test]
async fn field_catalog_flow() {
    let app = TestApp::new().await;
    let (status, field) = app
        .post(
            "/api/server-fields",
            json!({"key": "backup_policy", "label": "Backup", "type": "enum",
                   "options": {"values": ["Daily", "Weekly"]}, "orderIndex": 5}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = field["id"].as_i64().unwrap();
    assert_eq!(field["options"]["values"][1], "Weekly");
    assert_eq!(field["visible"], true);

    let (status, dup) = app
        .post(
            "/api/server-fields",
            json!({"key": "backup_policy", "label": "Other", "type": "string"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(dup["error"].as_str().unwrap().contains("backup_policy"));

    let (_, fetched) = app.get(&format!("/api/server-fields/{id}")).await;
    assert_eq!(fetched["label"], "Backup");
    assert_eq!(fetched["type"], "enum");

    let (status, patched) = app
        .patch(
            &format!("/api/server-fields/{id}"),
            json!({"label": "Backups", "options": null}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["label"], "Backups");
    assert_eq!(patched["options"], Value::Null);

    let (status, _) = app.delete(&format!("/api/server-fields/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = app.get("/api/server-fields").await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn field_ids_must_be_numeric() {
    let app = TestApp::new().await;
    assert_eq!(app.get("/api/server-fields/abc").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(app.get("/api/server-fields/99").await.0, StatusCode::NOT_FOUND);
}

// === Metrics ===

#[tokio::test]
async fn metric_latest_and_history() {
    let app = TestApp::new().await;
    create(&app, json!({"id": SERVER_A, "name": "m"})).await;

    let (status, outcomes) = app
        .post(
            "/api/metrics/ingest",
            json!({"items": [
                {"server_id": SERVER_A, "metric": "cpu", "ts": "2026-01-01T00:00:00Z", "value": 10},
                {"server_id": SERVER_A, "metric": "cpu", "ts": "2026-01-02T00:00:00Z", "value": 20},
                {"server_id": SERVER_A, "metric": "cpu", "ts": "2026-01-03T00:00:00Z", "value": 30},
                {"server_name": "m", "metric": "mem", "ts": "2026-01-01T00:00:00Z", "value": 50}
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(outcomes.as_array().unwrap().iter().all(|o| o["success"] == true));

    let (_, latest) = app
        .get(&format!("/api/servers/{SERVER_A}/metrics/latest"))
        .await;
    assert_eq!(
        latest,
        json!([
            {"metric": "cpu", "ts": "2026-01-03T00:00:00Z", "value": 30.0},
            {"metric": "mem", "ts": "2026-01-01T00:00:00Z", "value": 50.0}
        ])
    );

    let (_, history) = app
        .get(&format!(
            "/api/servers/{SERVER_A}/metrics/cpu?from=2026-01-02&to=2026-01-03T00:00:00Z"
        ))
        .await;
    let values: Vec<f64> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["value"].as_f64().unwrap())
        .collect();
    assert_eq!(values, vec![20.0, 30.0]);
    assert_eq!(history[0]["serverId"], SERVER_A);

    let (status, _) = app
        .get(&format!("/api/servers/{SERVER_A}/metrics/cpu?from=soon"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn latest_for_unknown_server_is_empty() {
    let app = TestApp::new().await;
    let (status, latest) = app.get("/api/servers/nope/metrics/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest, json!([]));
}

// === Audit ===

#[tokio::test]
async fn audit_records_each_mutation() {
    let app = TestApp::new().await;
    create(&app, json!({"id": SERVER_A, "name": "audited"})).await;
    let uri = format!("/api/servers/{SERVER_A}");
    app.patch(&uri, json!({"role": "DB"})).await;
    app.delete(&uri).await;

    let (status, audit) = app
        .get(&format!("/api/audit?serverId={SERVER_A}&actor=ALI"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit["total"], 3);
    let logs = audit["logs"].as_array().unwrap();
    let actions: Vec<&str> = logs.iter().map(|l| l["action"].as_str().unwrap()).collect();
    assert_eq!(actions, vec!["delete", "update", "create"]);
    assert!(logs.iter().all(|l| l["actor"] == "alice"));
    assert_eq!(logs[0]["payload"], json!({}));
    assert_eq!(logs[1]["payload"], json!({"changes": {"role": "DB"}}));
    assert_eq!(logs[2]["payload"]["server"]["name"], "audited");
    assert_eq!(logs[2]["server"], Value::Null);
}

#[tokio::test]
async fn audit_bad_range_is_400() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/api/audit?from=whenever").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
