// Legacy (v3) and backend (v4) record shapes with their conversions
//
// Each submodule owns one entity family. Backend-shaped types are decoded from
// PuppetDB and converted field by field into legacy-shaped types via `From`;
// command payload types go the other way through explicit mapper functions.

pub mod catalogs;
pub mod commands;
pub mod event_counts;
pub mod events;
pub mod facts;
pub mod nodes;
pub mod reports;
pub mod resources;

use crate::core::time::rfc3339;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Values synthesized into every modern command payload
///
/// Captured once per translation so all timestamps inside a single payload agree.
#[derive(Debug, Clone)]
pub struct TranslationContext {
    pub environment: String,
    pub producer: String,
    pub now: DateTime<Utc>,
}

impl TranslationContext {
    /// Context stamped with the current wall-clock time
    pub fn new(environment: impl Into<String>, producer: impl Into<String>) -> Self {
        Self::at(environment, producer, Utc::now())
    }

    pub fn at(environment: impl Into<String>, producer: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            environment: environment.into(),
            producer: producer.into(),
            now,
        }
    }

    /// `producer_timestamp` for payloads built from this context
    pub fn producer_timestamp(&self) -> String {
        rfc3339(self.now)
    }
}

/// Backend query answers are usually arrays, single-entity paths return an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn empty() -> Self {
        OneOrMany::Many(Vec::new())
    }

    /// Convert every element, keeping the outer shape
    pub fn map_into<U: From<T>>(self) -> OneOrMany<U> {
        match self {
            OneOrMany::Many(items) => OneOrMany::Many(items.into_iter().map(U::from).collect()),
            OneOrMany::One(item) => OneOrMany::One(U::from(item)),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OneOrMany::Many(items) => items.len(),
            OneOrMany::One(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `{data, href}` wrapper PuppetDB v4 uses for nested collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_to_default")]
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self { data: Vec::new(), href: None }
    }
}

/// Decode JSON `null` as the type's default
///
/// Legacy agents send `null` for absent strings and numbers.
pub fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
