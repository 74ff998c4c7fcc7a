// Axum web server layer

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod middleware;
pub mod responses;

use crate::core::errors::ProxyError;
use crate::core::params::QueryParams;
use crate::engine::dispatcher::DumpSettings;
use crate::schema::TranslationContext;
use middleware::ProxyMetrics;

pub use crate::config::Config;

/// Application state containing all shared dependencies
///
/// All components are wrapped in Arc for shared ownership across async tasks.
#[derive(Clone)]
pub struct AppState {
    pub puppetdb: Arc<dyn PuppetDb + Send + Sync>,
    pub metrics: Arc<ProxyMetrics>,
    pub dump: Arc<DumpSettings>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(puppetdb: Arc<dyn PuppetDb + Send + Sync>, metrics: Arc<ProxyMetrics>, config: Config) -> Self {
        Self {
            puppetdb,
            metrics,
            dump: Arc::new(DumpSettings::from_config(&config)),
            config: Arc::new(config),
        }
    }

    /// Fresh context for one translation, stamped now
    pub fn translation_context(&self) -> TranslationContext {
        TranslationContext::new(self.config.environment.clone(), self.config.producer.clone())
    }
}

/// Status and raw body of one backend round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Operations the proxy needs from PuppetDB
///
/// Non-200 answers are returned as replies, not errors; only transport
/// failures produce `ProxyError::Backend`.
#[async_trait::async_trait]
pub trait PuppetDb: Send + Sync {
    /// GET `/pdb/query/v4/<endpoint...>` with `params` as a form-encoded body
    async fn query(&self, endpoint: &[&str], params: &QueryParams) -> Result<BackendReply, ProxyError>;

    /// POST a translated command to `/pdb/cmd/v1`
    async fn submit_command(
        &self,
        params: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<BackendReply, ProxyError>;

    /// GET an arbitrary backend path, no parameters
    async fn fetch_raw(&self, path: &[&str]) -> Result<BackendReply, ProxyError>;
}

/// Legacy-facing routes, mounted under `/v3`
fn v3_routes() -> Router<AppState> {
    Router::new()
        .route("/nodes", get(handlers::nodes_handler))
        .route("/nodes/:name", get(handlers::node_handler))
        .route("/nodes/:name/facts", get(handlers::node_facts_handler))
        .route("/nodes/:name/facts/:fact", get(handlers::node_fact_handler))
        .route("/nodes/:name/facts/:fact/:value", get(handlers::node_fact_value_handler))
        .route("/nodes/:name/resources", get(handlers::node_resources_handler))
        .route("/nodes/:name/resources/:type", get(handlers::node_resources_by_type_handler))
        .route(
            "/nodes/:name/resources/:type/:title",
            get(handlers::node_resources_by_type_and_title_handler),
        )
        .route("/facts", get(handlers::facts_handler))
        .route("/facts/:fact", get(handlers::fact_handler))
        .route("/facts/:fact/:value", get(handlers::fact_value_handler))
        .route("/fact-names", get(handlers::fact_names_handler))
        .route("/resources", get(handlers::resources_handler))
        .route("/resources/:type", get(handlers::resources_by_type_handler))
        .route("/resources/:type/:title", get(handlers::resources_by_type_and_title_handler))
        .route("/reports", get(handlers::reports_handler))
        .route("/events", get(handlers::events_handler))
        .route("/event-counts", get(handlers::event_counts_handler))
        .route("/aggregate-event-counts", get(handlers::aggregate_event_counts_handler))
        .route("/server-time", get(handlers::server_time_handler))
        .route("/version", get(handlers::version_handler))
        .route("/commands", post(handlers::commands_handler))
}

/// Create the Axum router with all routes and middleware
///
/// Middleware stack (outermost to innermost):
/// - Tracing (tower-http::trace)
/// - Request metrics and access log
/// - Body size limit (tower-http::limit)
pub fn create_router(app_state: AppState) -> Router {
    let body_limit = app_state.config.body_size_limit_bytes;

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::metrics_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(body_limit));

    Router::new()
        .nest("/v3", v3_routes())
        .route("/metrics", get(handlers::metrics_handler))
        .layer(middleware_stack)
        .with_state(app_state)
}
