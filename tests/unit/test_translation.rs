// Record translation through the public schema and engine APIs

use chrono::{DateTime, TimeZone, Utc};
use puppetdb_proxy::core::time::to_backend_time;
use puppetdb_proxy::engine::dispatcher::{CommandDispatcher, CommandKind};
use puppetdb_proxy::engine::remapper::remap;
use puppetdb_proxy::engine::report_expander::ReportExpander;
use puppetdb_proxy::schema::event_counts::{BackendEventCount, LegacyEventCount};
use puppetdb_proxy::schema::events::{BackendEvent, LegacyEvent};
use puppetdb_proxy::schema::facts::{facts_to_modern, LegacyFacts};
use puppetdb_proxy::schema::nodes::{BackendNode, LegacyNode};
use puppetdb_proxy::schema::reports::LegacyReport;
use puppetdb_proxy::schema::TranslationContext;
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn keys(value: &Value) -> BTreeSet<String> {
    value.as_object().unwrap().keys().cloned().collect()
}

#[test]
fn test_time_normalizer_is_utc_equivalent() {
    for input in [
        "2019-03-01T10:15:30+03:00",
        "2019-12-31T23:59:59-08:00",
        "2020-02-29T00:00:00+00:00",
        "2021-06-15T05:30:00+05:30",
    ] {
        let output = to_backend_time(input);

        assert!(output.ends_with(".000Z"), "{}", output);
        let original = DateTime::parse_from_rfc3339(input).unwrap();
        let normalized = DateTime::parse_from_rfc3339(&output).unwrap();
        assert_eq!(original, normalized);
    }
}

#[test]
fn test_facts_identity_preserved() {
    let context = TranslationContext::at("production", "puppet.example.com", Utc.with_ymd_and_hms(2022, 5, 4, 3, 2, 1).unwrap());

    for name in ["web01.example.com", "db-01", "UPPER.example.com"] {
        let legacy: LegacyFacts = serde_json::from_value(json!({
            "name": name,
            "environment": "production",
            "values": {},
            "producer_timestamp": "1999-01-01T00:00:00+00:00"
        }))
        .unwrap();
        let modern = facts_to_modern(legacy, &context);

        assert_eq!(modern.certname, name);
        assert_eq!(modern.producer_timestamp, "2022-05-04T03:02:01+00:00");
    }
}

#[test]
fn test_node_key_set() {
    let backend = json!({
        "certname": "web01",
        "deactivated": "2019-03-28T15:06:51.000Z",
        "catalog_timestamp": "2019-03-28T15:06:40.000Z",
        "facts_timestamp": null,
        "report_timestamp": "2019-03-28T15:06:51.000Z"
    });
    let legacy = serde_json::to_value(remap::<BackendNode, LegacyNode>(backend.to_string().as_bytes()).unwrap()).unwrap();

    let expected: BTreeSet<String> = ["name", "deactivated", "catalog_timestamp", "facts_timestamp", "report_timestamp"]
        .iter()
        .map(|k| k.to_string())
        .collect();
    assert_eq!(keys(&legacy), expected);
    assert_eq!(legacy["deactivated"], backend["deactivated"]);
    assert_eq!(legacy["name"], backend["certname"]);
}

#[test]
fn test_event_key_set_values_unchanged() {
    let backend = json!({
        "certname": "web01",
        "old_value": {"mode": "0644"},
        "property": "mode",
        "timestamp": "2019-03-28T15:06:45.000Z",
        "resource_type": "File",
        "resource_title": "/etc/motd",
        "new_value": {"mode": "0600"},
        "message": "mode changed",
        "report": "4b9f1c",
        "status": "success",
        "file": null,
        "line": null,
        "containment_path": ["Stage[main]"],
        "containing_class": null,
        "run_start_time": "2019-03-28T15:06:40.000Z",
        "run_end_time": "2019-03-28T15:06:50.000Z",
        "report_receive_time": "2019-03-28T15:06:51.000Z"
    });

    let legacy = serde_json::to_value(
        remap::<BackendEvent, LegacyEvent>(json!([backend.clone()]).to_string().as_bytes()).unwrap(),
    )
    .unwrap();
    let legacy = &legacy[0];

    assert_eq!(keys(legacy).len(), keys(&backend).len());
    for (key, value) in backend.as_object().unwrap() {
        assert_eq!(&legacy[key.replace('_', "-")], value, "{}", key);
    }
}

#[test]
fn test_event_count_key_set() {
    let backend = json!({"subject_type": "resource", "subject": {"type": "File", "title": "/etc/motd"}, "failures": 1, "successes": 0, "noops": 0, "skips": 0});
    let legacy = serde_json::to_value(
        remap::<BackendEventCount, LegacyEventCount>(backend.to_string().as_bytes()).unwrap(),
    )
    .unwrap();

    assert!(legacy.get("subject-type").is_some());
    assert!(legacy.get("subject_type").is_none());
    assert_eq!(legacy["subject"], backend["subject"]);
}

#[test]
fn test_report_metric_invariants() {
    let context = TranslationContext::new("production", "puppet.example.com");
    let cases: [&[&str]; 4] = [
        &[],
        &["success"],
        &["success", "failure", "success", "skipped"],
        &["noop", "noop", "noop"],
    ];

    for statuses in cases {
        let events: Vec<Value> = statuses
            .iter()
            .map(|s| json!({"resource-type": "Exec", "resource-title": "x", "timestamp": "2019-03-28T15:06:45+03:00", "status": s}))
            .collect();
        let legacy: LegacyReport = serde_json::from_value(json!({
            "certname": "web01",
            "transaction-uuid": "t",
            "resource-events": events
        }))
        .unwrap();

        let modern = ReportExpander::expand(legacy, &context);
        let distinct: BTreeSet<&str> = statuses.iter().copied().collect();

        assert_eq!(modern.logs.len(), 1);
        assert_eq!(modern.resources.len(), statuses.len());
        if statuses.is_empty() {
            assert!(modern.metrics.is_empty());
        } else {
            assert_eq!(modern.metrics.len(), distinct.len() + 1);
            let total = modern.metrics.iter().find(|m| m.name == "total").unwrap();
            assert_eq!(total.value, statuses.len() as f64);
        }
    }
}

#[test]
fn test_translated_command_params() {
    let context = TranslationContext::at("production", "puppet.example.com", Utc.with_ymd_and_hms(2020, 1, 1, 23, 0, 0).unwrap());
    let payload = json!({"name": "web01", "version": "1", "edges": [], "resources": []});

    let translated = CommandDispatcher::translate(CommandKind::ReplaceCatalog, payload, &context).unwrap();
    let params = translated.query_params();

    assert_eq!(params[0], ("certname", "web01".to_string()));
    assert_eq!(params[1], ("producer-timestamp", "2020-01-01T23:00:00.000Z".to_string()));
    assert_eq!(params[2], ("command", "replace_catalog".to_string()));
    assert_eq!(params[3], ("version", "9".to_string()));
}
