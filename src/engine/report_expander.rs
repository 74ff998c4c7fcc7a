// Legacy report -> `store report` v8 expansion

use crate::schema::reports::{
    LegacyReport, LegacyResourceEvent, LogEntry, Metric, ModernReport, ModernResource, ModernResourceEvent,
    MODERN_REPORT_FORMAT,
};
use crate::schema::TranslationContext;
use std::collections::BTreeMap;
use uuid::Uuid;

pub const EVENTS_METRIC_CATEGORY: &str = "events";
pub const TOTAL_METRIC_NAME: &str = "total";

/// v3 agents never send structured logs, so every expanded report carries this
pub const SYNTHETIC_LOG_MESSAGE: &str = "Puppet agent v3 does not send messages";

/// Report expander - rebuilds the nested modern report from flat legacy events
pub struct ReportExpander;

impl ReportExpander {
    /// Expand a legacy report
    ///
    /// Every legacy event becomes its own resource holding exactly one event;
    /// events are never grouped by resource. Event statuses are counted into
    /// `events` metrics alongside a `total`, emitted in key order.
    pub fn expand(report: LegacyReport, context: &TranslationContext) -> ModernReport {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut resources = Vec::with_capacity(report.resource_events.len());

        for event in report.resource_events {
            *counts.entry(event.status.clone()).or_default() += 1;
            *counts.entry(TOTAL_METRIC_NAME.to_string()).or_default() += 1;
            resources.push(Self::expand_event(event));
        }

        let metrics = counts
            .into_iter()
            .map(|(name, value)| Metric {
                category: EVENTS_METRIC_CATEGORY.to_string(),
                name,
                value: value as f64,
            })
            .collect();

        ModernReport {
            certname: report.certname,
            environment: context.environment.clone(),
            status: report.status,
            puppet_version: report.puppet_version,
            report_format: MODERN_REPORT_FORMAT,
            configuration_version: report.configuration_version,
            start_time: report.start_time,
            end_time: report.end_time,
            producer_timestamp: context.producer_timestamp(),
            producer: context.producer.clone(),
            corrective_change: false,
            resources,
            noop: false,
            noop_pending: false,
            transaction_uuid: report.transaction_uuid,
            catalog_uuid: Uuid::new_v4().to_string(),
            code_id: None,
            job_id: None,
            cached_catalog_status: "not_used".to_string(),
            metrics,
            logs: vec![Self::synthetic_log(context)],
        }
    }

    fn expand_event(event: LegacyResourceEvent) -> ModernResource {
        ModernResource {
            resource_type: event.resource_type,
            resource_title: event.resource_title,
            timestamp: event.timestamp.clone(),
            skipped: false,
            file: event.file,
            line: event.line,
            events: vec![ModernResourceEvent {
                status: event.status,
                timestamp: event.timestamp,
                property: event.property,
                old_value: event.old_value,
                new_value: event.new_value,
                message: event.message,
                corrective_change: false,
            }],
            containment_path: event.containment_path,
            corrective_change: false,
        }
    }

    fn synthetic_log(context: &TranslationContext) -> LogEntry {
        LogEntry {
            file: None,
            line: None,
            level: "notice".to_string(),
            message: SYNTHETIC_LOG_MESSAGE.to_string(),
            source: "Puppet".to_string(),
            tags: vec!["notice".to_string()],
            time: context.producer_timestamp(),
        }
    }
}
