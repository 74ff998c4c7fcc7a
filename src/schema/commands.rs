// Command envelope and the deactivate payload

use crate::schema::TranslationContext;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

/// `{command, version, payload}` as POSTed by legacy clients
///
/// The legacy `version` is accepted but not used; the backend version is fixed
/// per command. `payload` keeps the exact bytes the client sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyCommand {
    pub command: String,
    #[serde(default)]
    pub version: Value,
    #[serde(default)]
    pub payload: Option<Box<RawValue>>,
}

impl LegacyCommand {
    /// Payload text exactly as received, `null` when absent
    pub fn raw_payload(&self) -> &str {
        self.payload.as_deref().map_or("null", RawValue::get)
    }
}

/// `deactivate node` version 3 payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModernDeactivate {
    pub certname: String,
    pub producer_timestamp: String,
}

pub fn deactivate_to_modern(certname: String, context: &TranslationContext) -> ModernDeactivate {
    ModernDeactivate {
        certname,
        producer_timestamp: context.producer_timestamp(),
    }
}
