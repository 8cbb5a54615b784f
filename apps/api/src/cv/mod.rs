//! Upload-to-record pipeline and saved-resume persistence.
//!
//! `handle_parse` is the entry point of the whole product: multipart upload
//! in, structured `CvRecord` out. Save/load are thin CRUD over the `resumes`
//! table; every save bumps the version counter so concurrent editors lose
//! nothing silently.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{self, DocumentKind};
use crate::ledger::UserIdQuery;
use crate::models::cv::CvRecord;
use crate::models::user::ResumeRow;
use crate::render::TemplateId;
use crate::state::AppState;
use crate::structurer;

const LOW_CONFIDENCE_WARNING: &str =
    "Few fields could be extracted from this document. Please review and complete the result.";

/// Structuring mode requested by the client. Text mode extracts locally and
/// sends plain text to the model; document mode forwards the raw bytes to the
/// multimodal model, for documents with an untrustworthy text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Text,
    Document,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub cv_data: CvRecord,
    pub low_confidence: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// POST /api/v1/cv/parse (multipart: `file`, optional `mode`)
pub async fn handle_parse(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ParseResponse>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut mode = ParseMode::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Unreadable multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .ok_or_else(|| {
                        AppError::Validation("File field is missing a filename".to_string())
                    })?
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable file field: {e}")))?;
                file = Some((filename, data.to_vec()));
            }
            Some("mode") => {
                let value = field.text().await.unwrap_or_default();
                mode = match value.as_str() {
                    "" | "text" => ParseMode::Text,
                    "document" => ParseMode::Document,
                    other => {
                        return Err(AppError::Validation(format!("Unknown parse mode '{other}'")))
                    }
                };
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::Validation("No file was uploaded".to_string()))?;

    let kind = DocumentKind::from_filename(&filename)?;
    info!(
        "Parsing upload '{}' ({} bytes, mode {:?})",
        filename,
        data.len(),
        mode
    );

    let record = match mode {
        ParseMode::Text => {
            let text = extract::extract_text(kind, &data)?;
            extract::ensure_extractable(&text)?;
            structurer::structure_text(&state.llm, &text).await?
        }
        ParseMode::Document => structurer::structure_document(&state.llm, kind, &data).await?,
    };

    let low_confidence = record.is_low_confidence();
    if low_confidence {
        warn!("Low-confidence extraction for upload '{filename}'");
    }

    Ok(Json(ParseResponse {
        cv_data: record,
        low_confidence,
        warning: low_confidence.then(|| LOW_CONFIDENCE_WARNING.to_string()),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SaveCvRequest {
    pub user_id: Uuid,
    /// Present when updating an existing resume.
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    pub cv_data: CvRecord,
    #[serde(default)]
    pub template: Option<String>,
}

/// POST /api/v1/cv/save
///
/// Insert-or-update. Updates bump `version_number`; the stored template id is
/// normalized through the same fallback the renderer uses.
pub async fn handle_save(
    State(state): State<AppState>,
    Json(request): Json<SaveCvRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    let content = serde_json::to_value(&request.cv_data)
        .map_err(|e| AppError::Validation(format!("Unserializable CV record: {e}")))?;
    let template = TemplateId::from_param(request.template.as_deref().unwrap_or_default());

    let row = match request.id {
        Some(id) => sqlx::query_as::<_, ResumeRow>(
            r#"
            UPDATE resumes
            SET content_json = $1,
                template_id = $2,
                title = COALESCE($3, title),
                version_number = version_number + 1,
                updated_at = NOW()
            WHERE id = $4 AND user_id = $5
            RETURNING *
            "#,
        )
        .bind(&content)
        .bind(template.as_str())
        .bind(&request.title)
        .bind(id)
        .bind(request.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?,
        None => {
            let title = request.title.as_deref().unwrap_or("CV").to_string();
            sqlx::query_as::<_, ResumeRow>(
                r#"
                INSERT INTO resumes (user_id, title, content_json, template_id)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(request.user_id)
            .bind(title)
            .bind(&content)
            .bind(template.as_str())
            .fetch_one(&state.db)
            .await?
        }
    };

    info!(
        "Saved resume {} for user {} (version {})",
        row.id, row.user_id, row.version_number
    );
    Ok(Json(row))
}

/// GET /api/v1/cv/:id?user_id=...
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeRow>, AppError> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}
