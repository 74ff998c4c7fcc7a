// `replace catalog` payloads

use crate::schema::{null_to_default, TranslationContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
}

/// Relationship between two catalog resources; same shape in both protocols
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEdge {
    pub relationship: String,
    pub source: ResourceSpec,
    pub target: ResourceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<i64>,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default, deserialize_with = "null_to_default")]
    pub exported: bool,
}

/// Catalog (wire format 5) as submitted by a v3 master
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LegacyCatalog {
    pub name: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default)]
    pub transaction_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer_timestamp: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub edges: Vec<CatalogEdge>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub resources: Vec<CatalogResource>,
}

/// `replace catalog` version 9 payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModernCatalog {
    pub certname: String,
    pub version: String,
    pub environment: String,
    pub transaction_uuid: Option<String>,
    pub producer_timestamp: String,
    pub producer: String,
    pub catalog_uuid: String,
    pub code_id: Option<String>,
    pub edges: Vec<CatalogEdge>,
    pub resources: Vec<CatalogResource>,
}

/// Translate a legacy catalog; `catalog_uuid` is freshly generated every call
pub fn catalog_to_modern(catalog: LegacyCatalog, context: &TranslationContext) -> ModernCatalog {
    ModernCatalog {
        certname: catalog.name,
        version: catalog.version,
        environment: context.environment.clone(),
        transaction_uuid: catalog.transaction_uuid,
        producer_timestamp: context.producer_timestamp(),
        producer: context.producer.clone(),
        catalog_uuid: Uuid::new_v4().to_string(),
        code_id: None,
        edges: catalog.edges,
        resources: catalog.resources,
    }
}
