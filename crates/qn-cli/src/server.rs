//! Web page and JSON API over one shared topic store.
//!
//! ## Endpoints
//!
//! - `GET /` the page
//! - `GET /api/state` current state
//! - `GET /api/state/wait?since=N` long-poll until the revision passes `N`
//! - `PUT /api/topic` replace the topic
//! - `POST /api/run` start a run in the background
//! - `GET /health`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use qn_core::{Error, NewsState, PipelineRunner, RunPhase, TopicStore};

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// How long `/api/state/wait` holds a request open before answering anyway.
pub const LONG_POLL: Duration = Duration::from_secs(25);

#[derive(Clone)]
pub struct AppState {
    store: TopicStore,
    runner: Arc<PipelineRunner>,
}

impl AppState {
    pub fn new(runner: Arc<PipelineRunner>) -> Self {
        Self {
            store: runner.store().clone(),
            runner,
        }
    }
}

/// State as served to the page: every store field plus the derived phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateView {
    #[serde(flatten)]
    pub state: NewsState,
    pub phase: RunPhase,
}

impl From<NewsState> for StateView {
    fn from(state: NewsState) -> Self {
        let phase = state.phase();
        Self { state, phase }
    }
}

#[derive(Debug, Deserialize)]
pub struct WaitQuery {
    /// Revision the client already has. Values below zero mean "none".
    #[serde(default)]
    pub since: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

/// JSON error body with a status derived from the core error.
pub struct ApiError(Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::RunInProgress => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(get_state))
        .route("/api/state/wait", get(wait_state))
        .route("/api/topic", put(set_topic))
        .route("/api/run", post(start_run))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local = listener.local_addr()?;
    info!(%local, "News page listening");
    println!("Serving on http://{local}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_state(State(app): State<AppState>) -> Json<StateView> {
    Json(app.store.snapshot().into())
}

async fn wait_state(
    State(app): State<AppState>,
    Query(query): Query<WaitQuery>,
) -> Json<StateView> {
    if let Some(since) = query.since.filter(|s| *s >= 0) {
        let since = since as u64;
        let mut rx = app.store.subscribe();
        let changed = matches!(
            tokio::time::timeout(LONG_POLL, rx.wait_for(|s| s.revision > since)).await,
            Ok(Ok(_))
        );
        debug!(since, changed, "Long-poll answered");
    }
    Json(app.store.snapshot().into())
}

async fn set_topic(
    State(app): State<AppState>,
    Json(request): Json<TopicRequest>,
) -> Json<StateView> {
    if app.store.set_topic(request.topic) {
        debug!(topic = %app.store.snapshot().topic, "Topic updated");
    }
    Json(app.store.snapshot().into())
}

async fn start_run(
    State(app): State<AppState>,
) -> Result<(StatusCode, Json<StateView>), ApiError> {
    match app.runner.start() {
        Ok(_) => Ok((StatusCode::ACCEPTED, Json(app.store.snapshot().into()))),
        Err(err) => {
            warn!(error = %err, "Run rejected");
            Err(ApiError(err))
        }
    }
}
