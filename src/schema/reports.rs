// Report shapes: flat legacy events vs. nested backend resources

use crate::schema::{null_to_default, Envelope, TranslationContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `report-format` stamped on reports handed back to legacy clients
pub const LEGACY_REPORT_FORMAT: i64 = 4;

/// `report_format` stamped on reports submitted to the backend
pub const MODERN_REPORT_FORMAT: i64 = 8;

/// One flat event from a v3 agent's `resource-events` list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LegacyResourceEvent {
    #[serde(default, deserialize_with = "null_to_default")]
    pub resource_type: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub resource_title: String,
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub status: String,
    #[serde(default)]
    pub old_value: Value,
    #[serde(default)]
    pub new_value: Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<i64>,
    #[serde(default)]
    pub containment_path: Option<Vec<String>>,
}

/// Report in the legacy shape, both as submitted by agents and as served back
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LegacyReport {
    pub certname: String,
    #[serde(default, deserialize_with = "null_to_default", skip_serializing_if = "String::is_empty")]
    pub hash: String,
    #[serde(default, deserialize_with = "null_to_default", skip_serializing_if = "String::is_empty")]
    pub environment: String,
    #[serde(default, deserialize_with = "null_to_default", skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub puppet_version: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub report_format: i64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub configuration_version: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub start_time: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub end_time: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub receive_time: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub transaction_uuid: String,
    #[serde(default, deserialize_with = "null_to_default", skip_serializing_if = "Vec::is_empty")]
    pub resource_events: Vec<LegacyResourceEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModernResourceEvent {
    pub status: String,
    pub timestamp: String,
    pub property: Option<String>,
    pub old_value: Value,
    pub new_value: Value,
    pub message: Option<String>,
    pub corrective_change: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModernResource {
    pub resource_type: String,
    pub resource_title: String,
    pub timestamp: String,
    pub skipped: bool,
    pub file: Option<String>,
    pub line: Option<i64>,
    pub events: Vec<ModernResourceEvent>,
    pub containment_path: Option<Vec<String>>,
    pub corrective_change: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub category: String,
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub file: Option<String>,
    pub line: Option<i64>,
    pub level: String,
    pub message: String,
    pub source: String,
    pub tags: Vec<String>,
    pub time: String,
}

/// `store report` version 8 payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModernReport {
    pub certname: String,
    pub environment: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    pub puppet_version: String,
    pub report_format: i64,
    pub configuration_version: String,
    pub start_time: String,
    pub end_time: String,
    pub producer_timestamp: String,
    pub producer: String,
    pub corrective_change: bool,
    pub resources: Vec<ModernResource>,
    pub noop: bool,
    pub noop_pending: bool,
    pub transaction_uuid: String,
    pub catalog_uuid: String,
    pub code_id: Option<String>,
    pub job_id: Option<String>,
    pub cached_catalog_status: String,
    pub metrics: Vec<Metric>,
    pub logs: Vec<LogEntry>,
}

/// Event nested under a queried report's `resource_events.data`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendReportEvent {
    pub status: Option<String>,
    pub timestamp: Option<String>,
    pub resource_type: Option<String>,
    pub resource_title: Option<String>,
    pub property: Option<String>,
    pub old_value: Value,
    pub new_value: Value,
    pub message: Option<String>,
    pub file: Option<String>,
    pub line: Option<i64>,
    pub containment_path: Option<Vec<String>>,
}

/// Row from `/pdb/query/v4/reports`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendReport {
    pub certname: Option<String>,
    pub hash: Option<String>,
    pub environment: Option<String>,
    pub status: Option<String>,
    pub puppet_version: Option<String>,
    pub report_format: Option<i64>,
    pub configuration_version: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub receive_time: Option<String>,
    pub producer_timestamp: Option<String>,
    pub transaction_uuid: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub resource_events: Envelope<BackendReportEvent>,
}

impl From<BackendReportEvent> for LegacyResourceEvent {
    fn from(event: BackendReportEvent) -> Self {
        Self {
            resource_type: event.resource_type.unwrap_or_default(),
            resource_title: event.resource_title.unwrap_or_default(),
            property: event.property,
            timestamp: event.timestamp.unwrap_or_default(),
            status: event.status.unwrap_or_default(),
            old_value: event.old_value,
            new_value: event.new_value,
            message: event.message,
            file: event.file,
            line: event.line,
            containment_path: event.containment_path,
        }
    }
}

/// Reshape queried backend reports for legacy clients
///
/// `report-format` is always 4 and `environment` comes from the proxy's
/// configuration, whatever the backend recorded. Events expanded inline by the
/// backend are flattened back into `resource-events`.
pub fn reports_to_legacy(reports: Vec<BackendReport>, context: &TranslationContext) -> Vec<LegacyReport> {
    reports
        .into_iter()
        .map(|report| LegacyReport {
            certname: report.certname.unwrap_or_default(),
            hash: report.hash.unwrap_or_default(),
            environment: context.environment.clone(),
            status: report.status.unwrap_or_default(),
            puppet_version: report.puppet_version.unwrap_or_default(),
            report_format: LEGACY_REPORT_FORMAT,
            configuration_version: report.configuration_version.unwrap_or_default(),
            start_time: report.start_time.unwrap_or_default(),
            end_time: report.end_time.unwrap_or_default(),
            receive_time: report.receive_time.unwrap_or_default(),
            transaction_uuid: report.transaction_uuid.unwrap_or_default(),
            resource_events: report
                .resource_events
                .data
                .into_iter()
                .map(LegacyResourceEvent::from)
                .collect(),
        })
        .collect()
}
