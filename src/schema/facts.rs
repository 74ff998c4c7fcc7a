// `replace facts` payloads

use crate::schema::{null_to_default, TranslationContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Facts as submitted by a v3 agent
///
/// Any `producer-timestamp` the agent sends is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyFacts {
    pub name: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub environment: String,
    #[serde(default)]
    pub values: Value,
}

/// `replace facts` version 5 payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModernFacts {
    pub certname: String,
    pub environment: String,
    pub values: Value,
    pub producer_timestamp: String,
    pub producer: String,
}

pub fn facts_to_modern(facts: LegacyFacts, context: &TranslationContext) -> ModernFacts {
    ModernFacts {
        certname: facts.name,
        environment: context.environment.clone(),
        values: facts.values,
        producer_timestamp: context.producer_timestamp(),
        producer: context.producer.clone(),
    }
}
