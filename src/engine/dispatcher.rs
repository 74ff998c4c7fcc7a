// Legacy command dispatch - decode, translate, submit

use crate::api::{BackendReply, PuppetDb};
use crate::config::Config;
use crate::core::errors::ProxyError;
use crate::core::time::to_backend_time;
use crate::engine::report_expander::ReportExpander;
use crate::schema::catalogs::{catalog_to_modern, LegacyCatalog};
use crate::schema::commands::{deactivate_to_modern, LegacyCommand};
use crate::schema::facts::{facts_to_modern, LegacyFacts};
use crate::schema::reports::LegacyReport;
use crate::schema::TranslationContext;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// The four legacy write commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ReplaceFacts,
    ReplaceCatalog,
    StoreReport,
    DeactivateNode,
}

impl CommandKind {
    /// Human-readable name as sent by legacy clients
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::ReplaceFacts => "replace facts",
            CommandKind::ReplaceCatalog => "replace catalog",
            CommandKind::StoreReport => "store report",
            CommandKind::DeactivateNode => "deactivate node",
        }
    }

    /// `command` URL parameter: spaces become underscores
    pub fn wire_name(self) -> String {
        self.name().replace(' ', "_")
    }

    /// Payload version the backend expects for this command
    pub fn backend_version(self) -> u32 {
        match self {
            CommandKind::ReplaceFacts => 5,
            CommandKind::ReplaceCatalog => 9,
            CommandKind::StoreReport => 8,
            CommandKind::DeactivateNode => 3,
        }
    }

    /// Suffix of the dump file; deactivations are never dumped
    fn dump_suffix(self) -> Option<&'static str> {
        match self {
            CommandKind::ReplaceFacts => Some("facts"),
            CommandKind::ReplaceCatalog => Some("catalog"),
            CommandKind::StoreReport => Some("report"),
            CommandKind::DeactivateNode => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CommandKind {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace facts" => Ok(CommandKind::ReplaceFacts),
            "replace catalog" => Ok(CommandKind::ReplaceCatalog),
            "store report" => Ok(CommandKind::StoreReport),
            "deactivate node" => Ok(CommandKind::DeactivateNode),
            other => Err(ProxyError::UnsupportedCommand(other.to_string())),
        }
    }
}

/// A command ready for `/pdb/cmd/v1`
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedCommand {
    pub kind: CommandKind,
    pub certname: String,
    pub producer_timestamp: String,
    pub body: Vec<u8>,
}

impl TranslatedCommand {
    /// Out-of-band URL parameters, in submission order
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("certname", self.certname.clone()),
            ("producer-timestamp", to_backend_time(&self.producer_timestamp)),
            ("command", self.kind.wire_name()),
            ("version", self.kind.backend_version().to_string()),
        ]
    }
}

/// Where and when raw legacy payloads get written for troubleshooting
#[derive(Debug, Clone, Default)]
pub struct DumpSettings {
    pub hostname: Option<String>,
    pub facts: bool,
    pub catalog: bool,
    pub report: bool,
    pub dir: PathBuf,
}

impl DumpSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            hostname: config.dump_hostname.clone(),
            facts: config.dump_facts,
            catalog: config.dump_catalog,
            report: config.dump_report,
            dir: config.dump_dir.clone(),
        }
    }

    fn enabled_for(&self, kind: CommandKind) -> bool {
        if self.hostname.is_none() {
            return false;
        }
        match kind {
            CommandKind::ReplaceFacts => self.facts,
            CommandKind::ReplaceCatalog => self.catalog,
            CommandKind::StoreReport => self.report,
            CommandKind::DeactivateNode => false,
        }
    }

    /// `<dir>/<host>-<kind>.json`
    pub fn path_for(&self, kind: CommandKind) -> Option<PathBuf> {
        let host = self.hostname.as_deref()?;
        let suffix = kind.dump_suffix()?;
        Some(self.dir.join(format!("{}-{}.json", host, suffix)))
    }

    /// Append `payload` verbatim, newline-terminated, if `certname` is the dumped host
    ///
    /// Failures are logged and never abort the command.
    async fn record(&self, kind: CommandKind, certname: &str, payload: &str) {
        if self.hostname.as_deref() != Some(certname) {
            return;
        }
        let Some(path) = self.path_for(kind) else {
            return;
        };

        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            file.write_all(format!("{}\n", payload).as_bytes()).await?;
            file.flush().await
        }
        .await;

        match result {
            Ok(()) => debug!(path = %path.display(), command = %kind, "Dumped legacy payload"),
            Err(e) => warn!(path = %path.display(), command = %kind, error = %e, "Failed to dump legacy payload"),
        }
    }
}

/// Command dispatcher - routes each legacy command to its payload builder
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Decode a `/v3/commands` body, translate it and submit it to the backend
    ///
    /// Nothing reaches the backend when the command is unknown or its payload
    /// cannot be decoded.
    pub async fn dispatch(
        puppetdb: &(dyn PuppetDb + Send + Sync),
        body: &[u8],
        context: &TranslationContext,
        dump: &DumpSettings,
    ) -> Result<BackendReply, ProxyError> {
        let envelope: LegacyCommand = serde_json::from_slice(body).map_err(|e| {
            error!(error = %e, "Failed to decode command envelope");
            ProxyError::MalformedPayload(e.to_string())
        })?;

        let kind: CommandKind = envelope.command.parse().map_err(|e| {
            error!(command = %envelope.command, "Unsupported command");
            e
        })?;

        let raw_payload = envelope.raw_payload();
        let payload = unwrap_payload(kind, serde_json::from_str(raw_payload)?);

        if dump.enabled_for(kind) {
            if let Some(certname) = payload_certname(kind, &payload) {
                dump.record(kind, certname, raw_payload).await;
            }
        }

        let translated = Self::translate(kind, payload, context).map_err(|e| {
            error!(command = %kind, error = %e, "Failed to translate command payload");
            e
        })?;

        info!(
            command = %kind,
            certname = %translated.certname,
            version = kind.backend_version(),
            "Submitting command"
        );

        puppetdb
            .submit_command(&translated.query_params(), translated.body)
            .await
    }

    /// Build the modern payload for `kind`
    pub fn translate(
        kind: CommandKind,
        payload: Value,
        context: &TranslationContext,
    ) -> Result<TranslatedCommand, ProxyError> {
        let (certname, producer_timestamp, body) = match kind {
            CommandKind::ReplaceFacts => {
                let legacy: LegacyFacts = serde_json::from_value(payload)?;
                let modern = facts_to_modern(legacy, context);
                (modern.certname.clone(), modern.producer_timestamp.clone(), serde_json::to_vec(&modern)?)
            }
            CommandKind::ReplaceCatalog => {
                let legacy: LegacyCatalog = serde_json::from_value(payload)?;
                let modern = catalog_to_modern(legacy, context);
                (modern.certname.clone(), modern.producer_timestamp.clone(), serde_json::to_vec(&modern)?)
            }
            CommandKind::StoreReport => {
                let legacy: LegacyReport = serde_json::from_value(payload)?;
                let modern = ReportExpander::expand(legacy, context);
                (modern.certname.clone(), modern.producer_timestamp.clone(), serde_json::to_vec(&modern)?)
            }
            CommandKind::DeactivateNode => {
                let Value::String(certname) = payload else {
                    return Err(ProxyError::MalformedPayload(
                        "deactivate node payload must be a certname string".to_string(),
                    ));
                };
                let modern = deactivate_to_modern(certname, context);
                (modern.certname.clone(), modern.producer_timestamp.clone(), serde_json::to_vec(&modern)?)
            }
        };

        Ok(TranslatedCommand {
            kind,
            certname,
            producer_timestamp,
            body,
        })
    }
}

/// Legacy clients may JSON-encode the payload a second time
///
/// A string is replaced by its decoded contents only when those have the shape
/// `kind` expects: an object, or a certname string for `deactivate node`. A
/// certname such as `"12345"` therefore stays a string.
pub fn unwrap_payload(kind: CommandKind, payload: Value) -> Value {
    match payload {
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(inner) if expected_shape(kind, &inner) => inner,
            _ => Value::String(raw),
        },
        other => other,
    }
}

fn expected_shape(kind: CommandKind, payload: &Value) -> bool {
    match kind {
        CommandKind::DeactivateNode => payload.is_string(),
        _ => payload.is_object(),
    }
}

/// Node the payload belongs to, read before any translation
fn payload_certname(kind: CommandKind, payload: &Value) -> Option<&str> {
    match kind {
        CommandKind::ReplaceFacts | CommandKind::ReplaceCatalog => payload.get("name")?.as_str(),
        CommandKind::StoreReport => payload.get("certname")?.as_str(),
        CommandKind::DeactivateNode => payload.as_str(),
    }
}
