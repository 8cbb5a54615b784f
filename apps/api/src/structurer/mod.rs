//! CV Structurer — turns an uploaded document into a `CvRecord`.
//!
//! Two modes share one response contract:
//! - text mode: extracted document text as the user turn;
//! - document mode: the raw bytes forwarded to the multimodal model as a
//!   base64 data URL, for documents whose text layer is not worth trusting.
//!
//! The model reply may wrap its JSON in prose or fences; the first balanced
//! `{...}` block is what gets parsed. No partial record is ever returned.

pub mod prompts;

use base64::Engine;

use crate::errors::AppError;
use crate::extract::DocumentKind;
use crate::llm_client::{extract_json_object, ContentPart, LlmClient};
use crate::models::cv::CvRecord;

// Extraction wants determinism, not creativity.
const STRUCTURE_TEMPERATURE: f32 = 0.1;

/// Text mode: structure already-extracted document text.
pub async fn structure_text(llm: &LlmClient, text: &str) -> Result<CvRecord, AppError> {
    let raw = llm
        .chat(
            Some(prompts::STRUCTURE_SYSTEM),
            &prompts::structure_user_turn(text),
            STRUCTURE_TEMPERATURE,
        )
        .await
        .map_err(|e| AppError::Llm(format!("CV structuring failed: {e}")))?;

    parse_cv_response(&raw)
}

/// Document mode: send the raw document bytes to the multimodal model.
pub async fn structure_document(
    llm: &LlmClient,
    kind: DocumentKind,
    data: &[u8],
) -> Result<CvRecord, AppError> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    let data_url = format!("data:{};base64,{}", kind.mime_type(), encoded);

    let parts = vec![
        ContentPart::text(prompts::structure_document_prompt()),
        ContentPart::image_url(data_url),
    ];

    let raw = llm
        .chat_multimodal(parts, STRUCTURE_TEMPERATURE)
        .await
        .map_err(|e| AppError::Llm(format!("CV structuring failed: {e}")))?;

    parse_cv_response(&raw)
}

/// Extracts and parses the JSON object from the raw model reply.
fn parse_cv_response(raw: &str) -> Result<CvRecord, AppError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| AppError::LlmFormat("model reply contained no JSON object".to_string()))?;

    serde_json::from_str::<CvRecord>(json)
        .map_err(|e| AppError::LlmFormat(format!("CV record did not match schema: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::SectionValue;

    #[test]
    fn test_parse_plain_json_reply() {
        let raw = r#"{"name": "Ada Lovelace", "title": "Engineer", "skills": ["Rust"]}"#;
        let record = parse_cv_response(raw).unwrap();
        assert_eq!(record.name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_parse_reply_wrapped_in_commentary_and_fences() {
        let raw = "Here is the extracted CV:\n```json\n{\"name\": \"Ada\", \"experience\": [{\"title\": \"Engineer\"}]}\n```\nHope this helps!";
        let record = parse_cv_response(raw).unwrap();
        assert_eq!(record.name.as_deref(), Some("Ada"));
        assert!(matches!(
            record.experience,
            Some(SectionValue::Entries(ref v)) if v.len() == 1
        ));
    }

    #[test]
    fn test_reply_without_json_is_a_format_error() {
        let err = parse_cv_response("I could not read this document, sorry.").unwrap_err();
        assert!(matches!(err, AppError::LlmFormat(_)));
    }

    #[test]
    fn test_reply_with_wrong_shape_is_a_format_error() {
        // `experience` as a number fits neither the array nor the string shape.
        let err = parse_cv_response(r#"{"experience": 42}"#).unwrap_err();
        assert!(matches!(err, AppError::LlmFormat(_)));
    }
}
