// Read-path forwarding to `/pdb/query/v4`

use crate::api::PuppetDb;
use crate::core::errors::ProxyError;
use crate::core::params::QueryParams;
use crate::engine::remapper::{decode, remap};
use crate::schema::event_counts::AggregateEventCount;
use crate::schema::reports::{reports_to_legacy, BackendReport};
use crate::schema::TranslationContext;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Body served whenever the backend refuses a query
pub const EMPTY_RESULT: &[u8] = b"[]";

/// Query forwarder - one backend round trip per legacy read
pub struct QueryForwarder;

impl QueryForwarder {
    /// Run a query and return the raw body of a 200 answer
    ///
    /// Any other status yields `None`. Legacy clients cannot cope with query
    /// errors, so callers substitute an empty list.
    pub async fn fetch(
        puppetdb: &(dyn PuppetDb + Send + Sync),
        endpoint: &[&str],
        params: &QueryParams,
    ) -> Result<Option<Vec<u8>>, ProxyError> {
        let reply = puppetdb.query(endpoint, params).await?;

        if !reply.is_success() {
            warn!(
                endpoint = %endpoint.join("/"),
                status = reply.status,
                body = %String::from_utf8_lossy(&reply.body),
                "Backend query failed, answering with an empty list"
            );
            return Ok(None);
        }

        debug!(endpoint = %endpoint.join("/"), bytes = reply.body.len(), "Backend query answered");
        Ok(Some(reply.body))
    }

    /// Forward a read whose backend record `B` converts into legacy record `L`
    pub async fn forward<B, L>(
        puppetdb: &(dyn PuppetDb + Send + Sync),
        endpoint: &[&str],
        params: &QueryParams,
    ) -> Result<Vec<u8>, ProxyError>
    where
        B: DeserializeOwned,
        L: From<B> + Serialize,
    {
        match Self::fetch(puppetdb, endpoint, params).await? {
            Some(body) => Ok(serde_json::to_vec(&remap::<B, L>(&body)?)?),
            None => Ok(EMPTY_RESULT.to_vec()),
        }
    }

    /// Reports need structural conversion, not only renaming
    pub async fn forward_reports(
        puppetdb: &(dyn PuppetDb + Send + Sync),
        params: &QueryParams,
        context: &TranslationContext,
    ) -> Result<Vec<u8>, ProxyError> {
        match Self::fetch(puppetdb, &["reports"], params).await? {
            Some(body) => {
                let reports = decode::<BackendReport>(&body)?.into_vec();
                Ok(serde_json::to_vec(&reports_to_legacy(reports, context))?)
            }
            None => Ok(EMPTY_RESULT.to_vec()),
        }
    }

    /// Aggregate counts are served as a single object
    ///
    /// An empty backend result yields `[]`.
    pub async fn forward_aggregate_event_counts(
        puppetdb: &(dyn PuppetDb + Send + Sync),
        params: &QueryParams,
    ) -> Result<Vec<u8>, ProxyError> {
        let Some(body) = Self::fetch(puppetdb, &["aggregate-event-counts"], params).await? else {
            return Ok(EMPTY_RESULT.to_vec());
        };

        match decode::<AggregateEventCount>(&body)?.into_vec().into_iter().next() {
            Some(first) => Ok(serde_json::to_vec(&first)?),
            None => Ok(EMPTY_RESULT.to_vec()),
        }
    }
}
