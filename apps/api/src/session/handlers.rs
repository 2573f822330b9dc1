use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::engine::validation::{rule_catalog, validate_with, RuleInfo};
use crate::engine::{EditedFields, ValidationReport};
use crate::errors::AppError;
use crate::extraction::{ExtractionError, SourceDocument};
use crate::session::{json_filename, SessionView};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

/// Reads the `file` field of a multipart upload into memory.
async fn read_upload(mut multipart: Multipart) -> Result<SourceDocument, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Uploaded file has no name".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        let document = SourceDocument::new(filename, bytes);
        if document.format().is_none() {
            return Err(ExtractionError::UnsupportedFormat.into());
        }
        return Ok(document);
    }
    Err(AppError::Validation(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// POST /api/v1/validate
/// Stateless validation of an arbitrary candidate object.
pub async fn handle_validate(
    State(state): State<AppState>,
    Json(candidate): Json<Value>,
) -> Json<ValidationReport> {
    Json(validate_with(&candidate, &state.config.validation))
}

/// GET /api/v1/validation/rules
pub async fn handle_rule_catalog() -> Json<Vec<RuleInfo>> {
    Json(rule_catalog())
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let session = state.sessions.create().await;
    (StatusCode::CREATED, Json(session.view()))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.get(id).await?.view()))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/sessions/:id/source
pub async fn handle_put_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let document = read_upload(multipart).await?;
    let session = state
        .sessions
        .transition(id, |s| async move { Ok(s.with_source(document)) })
        .await?;
    Ok(Json(session.view()))
}

/// DELETE /api/v1/sessions/:id/source
pub async fn handle_delete_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .transition(id, |s| async move { Ok(s.without_source()) })
        .await?;
    Ok(Json(session.view()))
}

/// POST /api/v1/sessions/:id/process
/// Extract → parse → validate. Collaborator failures leave the session unchanged.
pub async fn handle_process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let extractor = state.extractor.clone();
    let parser = state.parser.clone();
    let config = state.config.validation.clone();
    let session = state
        .sessions
        .transition(id, |s| async move {
            s.process(extractor.as_ref(), parser.as_ref(), &config).await
        })
        .await?;
    Ok(Json(session.view()))
}

/// GET /api/v1/sessions/:id/edits
/// The edit form, prefilled from the current working copy.
pub async fn handle_get_edits(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditedFields>, AppError> {
    let session = state.sessions.get(id).await?;
    let derived = session.derived.as_ref().ok_or_else(|| {
        AppError::Conflict("No parsed resume yet. Upload and process a resume first.".into())
    })?;
    Ok(Json(EditedFields::from_record(&derived.edited)))
}

/// POST /api/v1/sessions/:id/edits
pub async fn handle_save_edits(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(edits): Json<EditedFields>,
) -> Result<Json<SessionView>, AppError> {
    let config = state.config.validation.clone();
    let session = state
        .sessions
        .transition(id, |s| async move { s.apply_edits(&edits, &config) })
        .await?;
    Ok(Json(session.view()))
}

/// PUT /api/v1/sessions/:id/appendix
pub async fn handle_put_appendix(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let document = read_upload(multipart).await?;
    let session = state
        .sessions
        .transition(id, |s| async move { s.with_appendix(Some(document)) })
        .await?;
    Ok(Json(session.view()))
}

/// DELETE /api/v1/sessions/:id/appendix
pub async fn handle_delete_appendix(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .transition(id, |s| async move { s.with_appendix(None) })
        .await?;
    Ok(Json(session.view()))
}

/// POST /api/v1/sessions/:id/render
/// Blocked while the working copy has validation errors.
pub async fn handle_render(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let renderer = state.renderer.clone();
    let logo = state.config.logo_path.clone();
    let session = state
        .sessions
        .transition(id, |s| async move {
            s.render(renderer.as_ref(), logo.as_deref()).await
        })
        .await?;
    Ok(Json(session.view()))
}

fn attachment(filename: &str) -> String {
    format!("attachment; filename=\"{filename}\"")
}

/// GET /api/v1/sessions/:id/document
pub async fn handle_download_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state.sessions.get(id).await?;
    let rendered = session
        .derived
        .and_then(|d| d.rendered)
        .ok_or_else(|| AppError::NotFound("No rendered document for this session".into()))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, attachment(&rendered.filename)),
    ];
    Ok((headers, rendered.bytes).into_response())
}

/// GET /api/v1/sessions/:id/record
/// The working copy as pretty-printed JSON.
pub async fn handle_download_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state.sessions.get(id).await?;
    let derived = session
        .derived
        .ok_or_else(|| AppError::NotFound("No record for this session".into()))?;

    let body = serde_json::to_string_pretty(&derived.edited.to_value())
        .map_err(|e| AppError::Internal(e.into()))?;
    let headers = [
        (header::CONTENT_TYPE, "application/json".to_string()),
        (header::CONTENT_DISPOSITION, attachment(&json_filename(&derived.edited))),
    ];
    Ok((headers, body).into_response())
}
