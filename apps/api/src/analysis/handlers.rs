//! Axum route handlers for the LLM-backed flows.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::flows::{
    analyze_resume_for_improvements, match_resume_to_job_description, parse_resume_from_text,
    resume_chat,
};
use crate::analysis::models::{ChatMessage, ImprovementAnalysis, JobMatchAnalysis};
use crate::errors::AppError;
use crate::ingest::pdf::{ensure_pdf, extract_text_from_pdf, title_from_filename};
use crate::models::resume::Resume;
use crate::resume::handlers::UserIdQuery;
use crate::resume::live::refresh;
use crate::resume::text::full_resume_text;
use crate::state::AppState;

const PASTED_TITLE: &str = "Pasted Resume";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportTextRequest {
    pub resume_text: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub section_to_rewrite: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/import
///
/// Parses pasted resume text with the LLM and saves it as a new resume.
pub async fn handle_import_text(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(request): Json<ImportTextRequest>,
) -> Result<(StatusCode, Json<Resume>), AppError> {
    let title = request
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| PASTED_TITLE.to_string());
    let saved = import(&state, params.user_id, &request.resume_text, title).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// POST /api/v1/resumes/import/pdf (multipart: `file`, optional `title`)
///
/// Extracts text from an uploaded PDF, parses it, and saves a new resume.
pub async fn handle_import_pdf(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Resume>), AppError> {
    let mut upload: Option<(Option<String>, Option<String>, Vec<u8>)> = None;
    let mut title: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                upload = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("title") => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.body_text()))?,
                );
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) = upload.ok_or_else(|| {
        AppError::Validation("Please select a PDF file to upload.".to_string())
    })?;
    ensure_pdf(content_type.as_deref(), &bytes)?;

    let text = extract_text_from_pdf(bytes).await?;
    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| title_from_filename(file_name.as_deref()));
    let saved = import(&state, params.user_id, &text, title).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn import(
    state: &AppState,
    user_id: Uuid,
    resume_text: &str,
    title: String,
) -> Result<Resume, AppError> {
    let content = parse_resume_from_text(&state.llm, resume_text).await?;
    let draft = Resume {
        title,
        content,
        ..Default::default()
    };
    let saved = state.store.create(user_id, &draft).await?;
    info!("Imported resume {:?} for user {user_id}", saved.id);
    refresh(&state.feed, state.store.as_ref(), user_id).await;
    Ok(saved)
}

/// POST /api/v1/resumes/:id/analyze
///
/// Critiques the resume. With `section_to_rewrite`, the reply also carries
/// `rewrittenSection`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<ImprovementAnalysis>, AppError> {
    let resume = state.store.get(params.user_id, id).await?;
    let analysis = analyze_resume_for_improvements(
        &state.llm,
        &full_resume_text(Some(&resume)),
        request.section_to_rewrite.as_deref(),
    )
    .await?;
    Ok(Json(analysis))
}

/// POST /api/v1/resumes/:id/match
pub async fn handle_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<JobMatchAnalysis>, AppError> {
    let resume = state.store.get(params.user_id, id).await?;
    let analysis = match_resume_to_job_description(
        &state.llm,
        &full_resume_text(Some(&resume)),
        &request.job_description,
    )
    .await?;
    Ok(Json(analysis))
}

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let reply = resume_chat(&state.llm, &request.history).await?;
    Ok(Json(ChatResponse { reply }))
}
