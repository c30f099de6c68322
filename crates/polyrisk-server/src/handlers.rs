//! HTTP handlers for the pipeline and biomedical summary servers

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use polyrisk_core::RunResult;
use polyrisk_runtime::{BiomedError, BiomedSummaryService, RunController, RunRequest, Strategy};

use crate::error::ApiResult;

/// State shared across pipeline handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: RunController,
}

impl AppState {
    pub fn new(controller: RunController) -> Self {
        Self { controller }
    }
}

/// State shared across biomedical summary handlers
#[derive(Clone)]
pub struct BiomedState {
    pub service: Arc<BiomedSummaryService>,
}

impl BiomedState {
    pub fn new(service: BiomedSummaryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Body of `POST /run`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunBody {
    #[serde(alias = "rawInput")]
    pub genome_text: String,

    #[serde(default)]
    pub goal: Option<String>,
}

/// Body of `GET /health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub session_built_at: DateTime<Utc>,
}

/// Body of `POST /summarize`
#[derive(Debug, Deserialize)]
pub struct SummarizeBody {
    #[serde(default = "unknown_rsid", alias = "identifier")]
    pub rsid: String,

    #[serde(default)]
    pub text: String,
}

fn unknown_rsid() -> String {
    "unknown".to_string()
}

/// Response of `POST /summarize`, success or failure
#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// Routes of the pipeline server
pub fn pipeline_router() -> Router<AppState> {
    Router::new()
        .route("/run", post(run))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

/// Routes of the biomedical summary server
pub fn biomed_router() -> Router<BiomedState> {
    Router::new()
        .route("/summarize", post(summarize))
        .layer(TraceLayer::new_for_http())
}

/// POST /run - Run the pipeline on one genome
pub async fn run(
    State(state): State<AppState>,
    Json(body): Json<RunBody>,
) -> ApiResult<Json<RunResult>> {
    info!(bytes = body.genome_text.len(), "Run requested");

    let mut request = RunRequest::new(body.genome_text);
    if let Some(goal) = body.goal {
        request = request.with_goal(goal);
    }

    let result = state.controller.handle(&request).await?;
    Ok(Json(result))
}

/// GET /health - Session information
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let session = state.controller.session();
    Json(HealthResponse {
        status: "ok".to_string(),
        strategy: session.strategy(),
        model: session.model().map(str::to_string),
        session_built_at: session.built_at(),
    })
}

/// POST /summarize - Summarize biomedical text about one variant
pub async fn summarize(
    State(state): State<BiomedState>,
    Json(body): Json<SummarizeBody>,
) -> (StatusCode, Json<SummarizeResponse>) {
    match state.service.summarize(&body.rsid, &body.text).await {
        Ok(summary) => (StatusCode::OK, Json(SummarizeResponse { summary })),
        Err(e @ BiomedError::EmptyInput) => (
            StatusCode::BAD_REQUEST,
            Json(SummarizeResponse {
                summary: e.to_string(),
            }),
        ),
        Err(e) => {
            tracing::error!(rsid = %body.rsid, error = %e, "Biomedical summary failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SummarizeResponse {
                    summary: format!("Error: {}", e),
                }),
            )
        }
    }
}
