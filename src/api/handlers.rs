// Request handlers for the legacy `/v3` API

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::api::responses::{legacy_json, ApiError};
use crate::api::AppState;
use crate::core::errors::ProxyError;
use crate::core::params::{extract_params, read_body};
use crate::engine::dispatcher::CommandDispatcher;
use crate::engine::forwarder::QueryForwarder;
use crate::proxy::client::QUERY_ROOT;
use crate::schema::event_counts::{BackendEventCount, LegacyEventCount};
use crate::schema::events::{BackendEvent, LegacyEvent};
use crate::schema::nodes::{BackendNode, LegacyNode};
use crate::schema::resources::{FactRow, ResourceRow};

/// Normalize the request, forward it to `endpoint` and remap `B` into `L`
async fn forward<B, L>(state: &AppState, endpoint: &[&str], request: Request) -> Result<Response, ApiError>
where
    B: DeserializeOwned,
    L: From<B> + Serialize,
{
    let params = extract_params(request, state.config.body_size_limit_bytes).await?;
    let body = QueryForwarder::forward::<B, L>(&*state.puppetdb, endpoint, &params)
        .await
        .map_err(|e| {
            error!(endpoint = %endpoint.join("/"), error = %e, "Query failed");
            e
        })?;
    Ok(legacy_json(body))
}

/// Relay a backend body verbatim with 200, whatever status the backend sent
async fn passthrough(state: &AppState, path: &[&str]) -> Result<Response, ApiError> {
    let reply = state.puppetdb.fetch_raw(path).await.map_err(|e| {
        error!(path = %path.join("/"), error = %e, "Passthrough request failed");
        e
    })?;
    Ok(legacy_json(reply.body))
}

/// GET /v3/nodes
pub async fn nodes_handler(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    forward::<BackendNode, LegacyNode>(&state, &["nodes"], request).await
}

/// GET /v3/nodes/:name
pub async fn node_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<BackendNode, LegacyNode>(&state, &["nodes", name.as_str()], request).await
}

/// GET /v3/nodes/:name/facts
pub async fn node_facts_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<FactRow, FactRow>(&state, &["nodes", name.as_str(), "facts"], request).await
}

/// GET /v3/nodes/:name/facts/:fact
pub async fn node_fact_handler(
    State(state): State<AppState>,
    Path((name, fact)): Path<(String, String)>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<FactRow, FactRow>(
        &state,
        &["nodes", name.as_str(), "facts", fact.as_str()],
        request,
    )
    .await
}

/// GET /v3/nodes/:name/facts/:fact/:value
pub async fn node_fact_value_handler(
    State(state): State<AppState>,
    Path((name, fact, value)): Path<(String, String, String)>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<FactRow, FactRow>(
        &state,
        &["nodes", name.as_str(), "facts", fact.as_str(), value.as_str()],
        request,
    )
    .await
}

/// GET /v3/nodes/:name/resources
pub async fn node_resources_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<ResourceRow, ResourceRow>(
        &state,
        &["nodes", name.as_str(), "resources"],
        request,
    )
    .await
}

/// GET /v3/nodes/:name/resources/:type
pub async fn node_resources_by_type_handler(
    State(state): State<AppState>,
    Path((name, kind)): Path<(String, String)>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<ResourceRow, ResourceRow>(
        &state,
        &["nodes", name.as_str(), "resources", kind.as_str()],
        request,
    )
    .await
}

/// GET /v3/nodes/:name/resources/:type/:title
pub async fn node_resources_by_type_and_title_handler(
    State(state): State<AppState>,
    Path((name, kind, title)): Path<(String, String, String)>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<ResourceRow, ResourceRow>(
        &state,
        &["nodes", name.as_str(), "resources", kind.as_str(), title.as_str()],
        request,
    )
    .await
}

/// GET /v3/facts
pub async fn facts_handler(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    forward::<FactRow, FactRow>(&state, &["facts"], request).await
}

/// GET /v3/facts/:fact
pub async fn fact_handler(
    State(state): State<AppState>,
    Path(fact): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<FactRow, FactRow>(&state, &["facts", fact.as_str()], request).await
}

/// GET /v3/facts/:fact/:value
pub async fn fact_value_handler(
    State(state): State<AppState>,
    Path((fact, value)): Path<(String, String)>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<FactRow, FactRow>(&state, &["facts", fact.as_str(), value.as_str()], request).await
}

/// GET /v3/fact-names
pub async fn fact_names_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let path: Vec<&str> = QUERY_ROOT.iter().copied().chain(["fact-names"]).collect();
    passthrough(&state, &path).await
}

/// GET /v3/resources
pub async fn resources_handler(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    forward::<ResourceRow, ResourceRow>(&state, &["resources"], request).await
}

/// GET /v3/resources/:type
pub async fn resources_by_type_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<ResourceRow, ResourceRow>(&state, &["resources", kind.as_str()], request).await
}

/// GET /v3/resources/:type/:title
pub async fn resources_by_type_and_title_handler(
    State(state): State<AppState>,
    Path((kind, title)): Path<(String, String)>,
    request: Request,
) -> Result<Response, ApiError> {
    forward::<ResourceRow, ResourceRow>(
        &state,
        &["resources", kind.as_str(), title.as_str()],
        request,
    )
    .await
}

/// GET /v3/reports
pub async fn reports_handler(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    let params = extract_params(request, state.config.body_size_limit_bytes).await?;
    let context = state.translation_context();
    let body = QueryForwarder::forward_reports(&*state.puppetdb, &params, &context)
        .await
        .map_err(|e| {
            error!(error = %e, "Reports query failed");
            e
        })?;
    Ok(legacy_json(body))
}

/// GET /v3/events
pub async fn events_handler(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    forward::<BackendEvent, LegacyEvent>(&state, &["events"], request).await
}

/// GET /v3/event-counts
pub async fn event_counts_handler(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    forward::<BackendEventCount, LegacyEventCount>(&state, &["event-counts"], request).await
}

/// GET /v3/aggregate-event-counts
pub async fn aggregate_event_counts_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    let params = extract_params(request, state.config.body_size_limit_bytes).await?;
    let body = QueryForwarder::forward_aggregate_event_counts(&*state.puppetdb, &params)
        .await
        .map_err(|e| {
            error!(error = %e, "Aggregate event counts query failed");
            e
        })?;
    Ok(legacy_json(body))
}

/// GET /v3/server-time
pub async fn server_time_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    passthrough(&state, &["pdb", "meta", "v1", "server-time"]).await
}

/// GET /v3/version
pub async fn version_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    passthrough(&state, &["pdb", "meta", "v1", "version"]).await
}

/// POST /v3/commands
///
/// Request flow:
/// 1. Decode the legacy `{command, version, payload}` envelope
/// 2. Translate the payload for the backend's command version
/// 3. Submit to `/pdb/cmd/v1`
/// 4. Relay the backend's JSON answer with 200, whatever its status
pub async fn commands_handler(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    let body = read_body(request, state.config.body_size_limit_bytes).await?;
    let context = state.translation_context();

    let reply = CommandDispatcher::dispatch(&*state.puppetdb, &body, &context, &state.dump).await?;

    if !reply.is_success() {
        warn!(
            status = reply.status,
            body = %String::from_utf8_lossy(&reply.body),
            "PuppetDB did not accept the command"
        );
    }

    let answer: Value = serde_json::from_slice(&reply.body).map_err(|e| {
        error!(error = %e, body = %String::from_utf8_lossy(&reply.body), "Failed to decode command response");
        ProxyError::BackendResponse(e.to_string())
    })?;

    let relayed = serde_json::to_vec(&answer).map_err(|e| ProxyError::BackendResponse(e.to_string()))?;
    Ok(legacy_json(relayed))
}

/// GET /metrics
///
/// Returns Prometheus metrics in text format
pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let text = state.metrics.render().map_err(|e| {
        error!(error = %e, "Failed to render metrics");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.user_message())
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        text,
    )
        .into_response())
}
