// Event count summaries

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Row from `/pdb/query/v4/event-counts`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendEventCount {
    pub subject: Value,
    pub subject_type: Value,
    pub failures: Value,
    pub successes: Value,
    pub noops: Value,
    pub skips: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LegacyEventCount {
    pub subject: Value,
    #[serde(rename = "subject-type")]
    pub subject_type: Value,
    pub failures: Value,
    pub successes: Value,
    pub noops: Value,
    pub skips: Value,
}

impl From<BackendEventCount> for LegacyEventCount {
    fn from(count: BackendEventCount) -> Self {
        Self {
            subject: count.subject,
            subject_type: count.subject_type,
            failures: count.failures,
            successes: count.successes,
            noops: count.noops,
            skips: count.skips,
        }
    }
}

/// `/aggregate-event-counts` row; both protocols spell it the same way
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateEventCount {
    pub successes: Value,
    pub failures: Value,
    pub noops: Value,
    pub skips: Value,
    pub total: Value,
}
