mod config;
mod error;
mod validate;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Json, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use replybot_classifier::HttpIntentClassifier;
use replybot_core::{ResolutionResult, UnmatchedIntentPolicy};
use replybot_observability::{AppMetrics, MetricsSnapshot};
use replybot_resolver::ReplyResolver;
use replybot_storage::{load_seed_file, seed_replies, Store};
use serde::Serialize;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::AppConfig;
pub use error::ApiError;
pub use validate::{parse_get_reply, GetReplyRequest, ValidationError};

pub type Resolver = ReplyResolver<HttpIntentClassifier, Store>;

#[derive(Clone)]
pub struct ApiState {
    pub resolver: Arc<Resolver>,
    pub metrics: Arc<AppMetrics>,
    pub max_body_bytes: usize,
}

impl ApiState {
    pub fn new(resolver: Resolver, metrics: Arc<AppMetrics>) -> Self {
        Self {
            resolver: Arc::new(resolver),
            metrics,
            max_body_bytes: AppConfig::default().max_body_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    store: &'static str,
    unmatched_policy: UnmatchedIntentPolicy,
    metrics: MetricsSnapshot,
}

pub async fn build_app(config: AppConfig) -> Result<Router> {
    let store = Store::from_database_url(config.database_url.as_deref()).await?;

    if let Some(seed_file) = config.seed_file.as_ref() {
        let records = load_seed_file(seed_file)?;
        let inserted = seed_replies(&store, records)
            .await
            .context("failed seeding reply store")?;
        info!(seed_file = %seed_file.display(), inserted, "reply store seeded");
    }

    let classifier = HttpIntentClassifier::new(config.classifier.clone())?;
    let resolver = ReplyResolver::new(Arc::new(classifier), Arc::new(store))
        .with_unmatched_policy(config.unmatched_policy);

    let state = ApiState {
        resolver: Arc::new(resolver),
        metrics: AppMetrics::shared(),
        max_body_bytes: config.max_body_bytes,
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/getReply", post(get_reply))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        store: state.resolver.store().backend(),
        unmatched_policy: state.resolver.unmatched_policy(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn get_reply(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ResolutionResult>, ApiError> {
    let started = Instant::now();
    state.metrics.inc_request();

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            state.metrics.inc_validation_error();
            return Err(rejection.into());
        }
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let request = match parse_get_reply(content_type, &body) {
        Ok(request) => request,
        Err(err) => {
            state.metrics.inc_validation_error();
            return Err(err.into());
        }
    };

    let resolved = state
        .resolver
        .resolve_detailed(&request.bot_id, &request.message)
        .await;
    state.metrics.observe_latency(started.elapsed());

    let resolution = match resolved {
        Ok(resolution) => resolution,
        Err(err) => {
            state.metrics.record_error(&err);
            return Err(err.into());
        }
    };
    state.metrics.record_outcome(&resolution.outcome);

    info!(
        bot_id = %request.bot_id,
        outcome = resolution.outcome.label(),
        intent = resolution.outcome.intent().unwrap_or("-"),
        latency_ms = started.elapsed().as_millis() as u64,
        "reply resolved"
    );

    Ok(Json(resolution.result))
}

async fn not_found() -> Response {
    error::error_body(StatusCode::NOT_FOUND, "Not found")
}
