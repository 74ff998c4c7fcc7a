// POST /v3/commands against a mock backend

use super::common::*;
use axum::http::StatusCode;
use chrono::DateTime;
use puppetdb_proxy::api::create_router;
use puppetdb_proxy::config::Config;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

fn command(name: &str, payload: serde_json::Value) -> serde_json::Value {
    json!({"command": name, "version": 3, "payload": payload})
}

#[tokio::test]
async fn test_deactivate_node_params() {
    let backend = Arc::new(MockPuppetDb::default());
    let response = send(
        mock_router(backend.clone()),
        post_json("/v3/commands", &command("deactivate node", json!("\"host1.example.com\""))),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type(), "application/json;charset=utf-8");
    assert_eq!(response.json()["uuid"], "a8f0c6f4-0d6a-4c58-9a0b-1b2c3d4e5f60");

    let submitted = backend.last_command();
    assert_eq!(submitted.param("certname"), Some("host1.example.com"));
    assert_eq!(submitted.param("command"), Some("deactivate_node"));
    assert_eq!(submitted.param("version"), Some("3"));

    let timestamp = submitted.param("producer-timestamp").unwrap();
    assert!(timestamp.ends_with(".000Z"));
    assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());

    assert_eq!(submitted.body["certname"], "host1.example.com");
    let keys: Vec<&String> = submitted.body.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
}

#[tokio::test]
async fn test_param_order() {
    let backend = Arc::new(MockPuppetDb::default());
    send(
        mock_router(backend.clone()),
        post_json("/v3/commands", &command("deactivate node", json!("host1.example.com"))),
    )
    .await;

    let keys: Vec<String> = backend.last_command().params.into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["certname", "producer-timestamp", "command", "version"]);
}

#[tokio::test]
async fn test_unsupported_command_fails_fast() {
    let backend = Arc::new(MockPuppetDb::default());
    let response = send(
        mock_router(backend.clone()),
        post_json("/v3/commands", &command("configure expiration", json!({"certname": "a"}))),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().contains("unsupported command: configure expiration"));
    assert_eq!(backend.command_count(), 0);
}

#[tokio::test]
async fn test_malformed_envelope() {
    let backend = Arc::new(MockPuppetDb::default());
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v3/commands")
        .body(axum::body::Body::from("{\"command\": "))
        .unwrap();

    let response = send(mock_router(backend.clone()), request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().starts_with("malformed payload"));
    assert_eq!(backend.command_count(), 0);
}

#[tokio::test]
async fn test_malformed_facts_payload() {
    let backend = Arc::new(MockPuppetDb::default());
    let response = send(
        mock_router(backend.clone()),
        post_json("/v3/commands", &command("replace facts", json!({"values": "not-an-identity"}))),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(backend.command_count(), 0);
}

#[tokio::test]
async fn test_replace_facts_restamps_producer_timestamp() {
    let backend = Arc::new(MockPuppetDb::default());
    let payload = json!({
        "name": "web01.example.com",
        "environment": "staging",
        "values": {"kernel": "Linux", "memorysize": "7.80 GB"},
        "producer-timestamp": "2001-01-01T00:00:00+00:00"
    });

    let response = send(mock_router(backend.clone()), post_json("/v3/commands", &command("replace facts", payload))).await;
    assert_eq!(response.status, StatusCode::OK);

    let submitted = backend.last_command();
    assert_eq!(submitted.param("version"), Some("5"));
    assert_eq!(submitted.param("command"), Some("replace_facts"));
    assert_eq!(submitted.body["certname"], "web01.example.com");
    assert_eq!(submitted.body["environment"], "production");
    assert_eq!(submitted.body["producer"], "puppet.example.com");
    assert_eq!(submitted.body["values"]["memorysize"], "7.80 GB");
    assert_ne!(submitted.body["producer_timestamp"], "2001-01-01T00:00:00+00:00");
}

#[tokio::test]
async fn test_replace_catalog_gets_fresh_uuid() {
    let backend = Arc::new(MockPuppetDb::default());
    let payload = json!({
        "name": "web01.example.com",
        "version": "1553785600",
        "transaction-uuid": "2e0a2c58-6f4d-4b7e-9d6e-3a4b5c6d7e8f",
        "edges": [],
        "resources": [{"type": "Class", "title": "Main", "tags": ["class"], "exported": false, "parameters": {}}]
    });

    for _ in 0..2 {
        send(
            mock_router(backend.clone()),
            post_json("/v3/commands", &command("replace catalog", payload.clone())),
        )
        .await;
    }

    let commands = backend.commands.lock().unwrap().clone();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].param("version"), Some("9"));
    assert_ne!(commands[0].body["catalog_uuid"], commands[1].body["catalog_uuid"]);
    assert_eq!(commands[0].body["transaction_uuid"], "2e0a2c58-6f4d-4b7e-9d6e-3a4b5c6d7e8f");
    assert!(commands[0].body["code_id"].is_null());
}

#[tokio::test]
async fn test_store_report_expansion() {
    let backend = Arc::new(MockPuppetDb::default());
    let statuses = ["success", "success", "failure", "noop", "success"];

    let response = send(
        mock_router(backend.clone()),
        post_json("/v3/commands", &command("store report", legacy_report(&statuses))),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let submitted = backend.last_command();
    let report = &submitted.body;
    assert_eq!(submitted.param("version"), Some("8"));
    assert_eq!(report["report_format"], 8);
    assert_eq!(report["cached_catalog_status"], "not_used");

    let resources = report["resources"].as_array().unwrap();
    assert_eq!(resources.len(), statuses.len());
    assert!(resources.iter().all(|r| r["events"].as_array().unwrap().len() == 1));

    let distinct: BTreeSet<&str> = statuses.iter().copied().collect();
    let metrics = report["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), distinct.len() + 1);
    let total = metrics.iter().find(|m| m["name"] == "total").unwrap();
    assert_eq!(total["value"], 5.0);
    assert_eq!(total["category"], "events");

    assert_eq!(report["logs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_store_report_without_events() {
    let backend = Arc::new(MockPuppetDb::default());
    send(
        mock_router(backend.clone()),
        post_json("/v3/commands", &command("store report", legacy_report(&[]))),
    )
    .await;

    let report = backend.last_command().body;
    assert!(report["resources"].as_array().unwrap().is_empty());
    assert!(report["metrics"].as_array().unwrap().is_empty());
    assert_eq!(report["logs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_backend_rejection_relayed_with_200() {
    let backend = Arc::new(MockPuppetDb::answering_commands(400, json!({"error": "bad certname"})));
    let response = send(
        mock_router(backend),
        post_json("/v3/commands", &command("deactivate node", json!("host1.example.com"))),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["error"], "bad certname");
}

#[tokio::test]
async fn test_backend_unreachable() {
    let backend = Arc::new(MockPuppetDb::unreachable());
    let response = send(
        mock_router(backend),
        post_json("/v3/commands", &command("deactivate node", json!("host1.example.com"))),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.content_type(), "text/plain; charset=utf-8");
}

fn dumping_config(dir: &std::path::Path) -> Config {
    let mut config = Config::test_config();
    config.dump_hostname = Some("web01.example.com".to_string());
    config.dump_dir = dir.to_path_buf();
    config
}

#[tokio::test]
async fn test_dump_written_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = dumping_config(dir.path());
    config.dump_facts = true;

    let backend = Arc::new(MockPuppetDb::default());
    let router = create_router(test_state(backend.clone(), config));
    let payload = r#"{"values": {"zeta": 1, "alpha": 2}, "name": "web01.example.com",  "environment": "production"}"#;
    let body = format!(r#"{{"command": "replace facts", "version": 3, "payload": {}}}"#, payload);

    let response = send(router, post_raw("/v3/commands", &body)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.command_count(), 1);

    let dumped = std::fs::read_to_string(dir.path().join("web01.example.com-facts.json")).unwrap();
    assert_eq!(dumped, format!("{}\n", payload));
    assert!(!dir.path().join("web01.example.com-report.json").exists());
}

#[tokio::test]
async fn test_dump_written_when_translation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = dumping_config(dir.path());
    config.dump_catalog = true;

    let backend = Arc::new(MockPuppetDb::default());
    let router = create_router(test_state(backend.clone(), config));
    let payload = r#"{"name": "web01.example.com", "version": "1", "edges": "not-a-list"}"#;
    let body = format!(r#"{{"command": "replace catalog", "version": 5, "payload": {}}}"#, payload);

    let response = send(router, post_raw("/v3/commands", &body)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(backend.command_count(), 0);

    let dumped = std::fs::read_to_string(dir.path().join("web01.example.com-catalog.json")).unwrap();
    assert_eq!(dumped, format!("{}\n", payload));
}

#[tokio::test]
async fn test_dump_skips_other_hosts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = dumping_config(dir.path());
    config.dump_report = true;

    let backend = Arc::new(MockPuppetDb::default());
    let router = create_router(test_state(backend, config));
    let mut report = legacy_report(&["success"]);
    report["certname"] = json!("db01.example.com");

    send(router, post_json("/v3/commands", &command("store report", report))).await;

    assert!(!dir.path().join("web01.example.com-report.json").exists());
}

#[tokio::test]
async fn test_deactivate_numeric_certname() {
    let backend = Arc::new(MockPuppetDb::default());
    let response = send(
        mock_router(backend.clone()),
        post_raw("/v3/commands", r#"{"command":"deactivate node","version":2,"payload":"12345"}"#),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let submitted = backend.last_command();
    assert_eq!(submitted.param("certname"), Some("12345"));
    assert_eq!(submitted.body["certname"], "12345");
}

#[tokio::test]
async fn test_command_body_over_limit() {
    let mut config = Config::test_config();
    config.body_size_limit_bytes = 64;

    let backend = Arc::new(MockPuppetDb::default());
    let router = create_router(test_state(backend.clone(), config));
    let response = send(router, post_json("/v3/commands", &command("store report", legacy_report(&["success"])))).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(backend.command_count(), 0);
}
