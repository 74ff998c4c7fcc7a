// Resource event rows: underscored backend names -> hyphenated legacy names

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Row from `/pdb/query/v4/events`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendEvent {
    pub certname: Value,
    pub old_value: Value,
    pub property: Value,
    pub timestamp: Value,
    pub resource_type: Value,
    pub resource_title: Value,
    pub new_value: Value,
    pub message: Value,
    pub report: Value,
    pub status: Value,
    pub file: Value,
    pub line: Value,
    pub containment_path: Value,
    pub containing_class: Value,
    pub run_start_time: Value,
    pub run_end_time: Value,
    pub report_receive_time: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LegacyEvent {
    pub certname: Value,
    pub old_value: Value,
    pub property: Value,
    pub timestamp: Value,
    pub resource_type: Value,
    pub resource_title: Value,
    pub new_value: Value,
    pub message: Value,
    pub report: Value,
    pub status: Value,
    pub file: Value,
    pub line: Value,
    pub containment_path: Value,
    pub containing_class: Value,
    pub run_start_time: Value,
    pub run_end_time: Value,
    pub report_receive_time: Value,
}

impl From<BackendEvent> for LegacyEvent {
    fn from(event: BackendEvent) -> Self {
        Self {
            certname: event.certname,
            old_value: event.old_value,
            property: event.property,
            timestamp: event.timestamp,
            resource_type: event.resource_type,
            resource_title: event.resource_title,
            new_value: event.new_value,
            message: event.message,
            report: event.report,
            status: event.status,
            file: event.file,
            line: event.line,
            containment_path: event.containment_path,
            containing_class: event.containing_class,
            run_start_time: event.run_start_time,
            run_end_time: event.run_end_time,
            report_receive_time: event.report_receive_time,
        }
    }
}
