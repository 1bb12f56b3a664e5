pub mod error;
pub mod glossary_store;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use error::ApiError;
use glossary_store::GlossaryStore;
use plainly_core::{
    analyze, Document, GlossaryEntry, GlossaryTerm, Orchestrator, ReadabilityReport, SimplificationResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct SimplifyRequest {
    pub text: String,
    /// Defaults to intermediate when absent.
    #[serde(default)]
    pub level: Option<String>,
    /// Extra terms for this request only, laid over the shared glossary.
    #[serde(default)]
    pub glossary: Option<Vec<GlossaryEntry>>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ReadabilityResponse {
    #[serde(flatten)]
    pub report: ReadabilityReport,
    pub grade_interpretation: &'static str,
    pub ease_interpretation: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GlossaryListing {
    pub count: usize,
    pub terms: Vec<GlossaryTerm>,
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub glossary: GlossaryStore,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, glossary: GlossaryStore, admin_token: Option<String>) -> Self {
        Self { orchestrator: Arc::new(orchestrator), glossary, admin_token }
    }
}

/// Build the app, reading `ADMIN_TOKEN` and `CORS_ALLOW_ORIGIN` from the
/// environment.
pub fn build_app(orchestrator: Orchestrator, glossary: GlossaryStore) -> Router {
    let admin_token = std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty());
    let cors_origins = std::env::var("CORS_ALLOW_ORIGIN").ok();
    router(AppState::new(orchestrator, glossary, admin_token), cors_origins.as_deref())
}

pub fn router(state: AppState, cors_origins: Option<&str>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/simplify", post(simplify_handler))
        .route("/readability", post(readability_handler))
        .route("/glossary", get(list_glossary).post(upsert_glossary))
        .route("/glossary/:term", delete(delete_glossary_term))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Comma-separated origins, or any origin when unset or unparseable.
fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let parsed: Vec<_> = origins
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    if parsed.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(parsed))
    }
}

pub async fn simplify_handler(
    State(state): State<AppState>,
    Json(req): Json<SimplifyRequest>,
) -> Result<Json<SimplificationResult>, ApiError> {
    let level = Orchestrator::parse_level(req.level.as_deref())?;
    let glossary = match req.glossary {
        Some(entries) if !entries.is_empty() => Arc::new(state.glossary.snapshot().overlay(entries)),
        _ => state.glossary.snapshot(),
    };
    let mut document = Document::new(req.text);
    if let Some(source) = req.source {
        document = document.with_source(source);
    }
    let result = state.orchestrator.run(&document, level, glossary).await?;
    Ok(Json(result))
}

pub async fn readability_handler(Json(req): Json<TextRequest>) -> Json<ReadabilityResponse> {
    let report = analyze(Document::new(req.text).normalized());
    Json(ReadabilityResponse {
        report,
        grade_interpretation: report.grade_interpretation(),
        ease_interpretation: report.ease_interpretation(),
    })
}

pub async fn list_glossary(State(state): State<AppState>) -> Json<GlossaryListing> {
    let snapshot = state.glossary.snapshot();
    Json(GlossaryListing { count: snapshot.len(), terms: snapshot.terms().to_vec() })
}

async fn upsert_glossary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(entries): Json<Vec<GlossaryEntry>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    if entries.is_empty() {
        return Err(ApiError::BadRequest("no glossary entries given".into()));
    }
    let submitted = entries.len();
    let count = state.glossary.upsert(entries);
    tracing::info!(submitted, count, "glossary updated");
    Ok(Json(serde_json::json!({ "count": count })))
}

async fn delete_glossary_term(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(term): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    match state.glossary.remove(&term) {
        Some(count) => {
            tracing::info!(%term, count, "glossary term removed");
            Ok(Json(serde_json::json!({ "count": count })))
        }
        None => Err(ApiError::NotFound(term)),
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::Unauthorized("ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token".into()))
    }
}
