//! Axum route handlers for preview rendering and static export.

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv::CvRecord;
use crate::render::{render_cv, RenderMode, TemplateId};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub cv_data: CvRecord,
    #[serde(default)]
    pub template: Option<String>,
}

/// POST /api/v1/cv/render
///
/// Interactive preview: returns the rendered HTML for the chosen template.
pub async fn handle_render(
    State(_state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Html<String>, AppError> {
    let template = TemplateId::from_param(request.template.as_deref().unwrap_or_default());
    let html = render_cv(&request.cv_data, template, RenderMode::Preview);
    Ok(Html(html))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub cv_data: CvRecord,
    #[serde(default)]
    pub template: Option<String>,
    pub format: ExportFormat,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

/// POST /api/v1/cv/export
///
/// Static export with fixed page dimensions. `pdf` returns a print-ready
/// document; `docx` is not implemented and says so explicitly rather than
/// producing a malformed file.
pub async fn handle_export(
    State(_state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, AppError> {
    match request.format {
        ExportFormat::Pdf => {
            let template = TemplateId::from_param(request.template.as_deref().unwrap_or_default());
            let html = render_cv(&request.cv_data, template, RenderMode::Export);
            info!(
                "Exported CV (template={}, user={:?})",
                template.as_str(),
                request.user_id
            );
            Ok((
                [
                    (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"cv.html\"",
                    ),
                ],
                html,
            )
                .into_response())
        }
        ExportFormat::Docx => Err(AppError::NotImplemented),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_deserializes_lowercase_only() {
        assert_eq!(
            serde_json::from_str::<ExportFormat>(r#""pdf""#).unwrap(),
            ExportFormat::Pdf
        );
        assert_eq!(
            serde_json::from_str::<ExportFormat>(r#""docx""#).unwrap(),
            ExportFormat::Docx
        );
        assert!(serde_json::from_str::<ExportFormat>(r#""odt""#).is_err());
    }

    #[test]
    fn test_export_request_accepts_legacy_record_shape() {
        let json = r#"{
            "cv_data": {"name": "Ada", "skills": "Rust, SQL"},
            "template": "tech",
            "format": "pdf"
        }"#;
        let request: ExportRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.format, ExportFormat::Pdf);
        assert_eq!(request.cv_data.name.as_deref(), Some("Ada"));
    }
}
