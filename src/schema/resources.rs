// Resource and fact query rows whose backend and legacy spellings coincide

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Row from `/pdb/query/v4/resources`
///
/// The backend adds `environment`; legacy clients never saw it, so it is not
/// carried over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRow {
    pub certname: Value,
    pub resource: Value,
    #[serde(rename = "type")]
    pub kind: Value,
    pub title: Value,
    pub tags: Value,
    pub file: Value,
    pub line: Value,
    pub parameters: Value,
    pub exported: Value,
}

/// Row from `/pdb/query/v4/facts` and the node facts paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactRow {
    pub certname: Value,
    pub name: Value,
    pub value: Value,
}
