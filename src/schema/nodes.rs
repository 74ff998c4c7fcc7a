// Node records: backend `certname` becomes legacy `name`

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node as returned by `/pdb/query/v4/nodes`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackendNode {
    #[serde(default)]
    pub certname: Value,
    #[serde(default)]
    pub deactivated: Value,
    #[serde(default)]
    pub catalog_timestamp: Value,
    #[serde(default)]
    pub facts_timestamp: Value,
    #[serde(default)]
    pub report_timestamp: Value,
}

/// Node as legacy clients expect it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LegacyNode {
    pub name: Value,
    pub deactivated: Value,
    pub catalog_timestamp: Value,
    pub facts_timestamp: Value,
    pub report_timestamp: Value,
}

impl From<BackendNode> for LegacyNode {
    fn from(node: BackendNode) -> Self {
        Self {
            name: node.certname,
            deactivated: node.deactivated,
            catalog_timestamp: node.catalog_timestamp,
            facts_timestamp: node.facts_timestamp,
            report_timestamp: node.report_timestamp,
        }
    }
}
