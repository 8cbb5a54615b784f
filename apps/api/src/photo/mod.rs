//! Photo Locator — asks the vision model whether a rendered CV page contains
//! a personal portrait, and where.
//!
//! This runs once per uploaded page image, independently of the text pipeline.
//! It is strictly best-effort: any network or parse failure degrades to
//! "no photo" rather than failing the upload.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{extract_json_object, ContentPart, LlmClient};
use crate::models::cv::PhotoRegion;
use crate::state::AppState;

const LOCATE_TEMPERATURE: f32 = 0.1;

const LOCATE_PROMPT: &str = r#"Analyze this CV page and determine whether it contains the candidate's personal profile photo (a portrait of a person — not a company logo, not an icon, not a screenshot of the full page).

If a profile photo is present, respond with exactly:
{"hasPhoto": true, "coordinates": {"x": 0, "y": 0, "width": 0, "height": 0}}
where x, y, width, height are the photo's bounding box as PERCENTAGES of the page width and height (numbers between 0 and 100; x,y is the top-left corner).

If no profile photo is present, respond with exactly:
{"hasPhoto": false}

Respond ONLY with the JSON object, without markdown or additional text."#;

/// Calls the vision model on one page image. Never fails the pipeline.
pub async fn locate_photo(llm: &LlmClient, image_data_url: &str) -> PhotoRegion {
    let parts = vec![
        ContentPart::text(LOCATE_PROMPT),
        ContentPart::image_url(image_data_url.to_string()),
    ];

    let raw = match llm.chat_multimodal(parts, LOCATE_TEMPERATURE).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Photo detection call failed, degrading to no photo: {e}");
            return PhotoRegion::none();
        }
    };

    match parse_photo_response(&raw) {
        Some(region) => region,
        None => {
            warn!("Photo detection reply was unparseable, degrading to no photo");
            PhotoRegion::none()
        }
    }
}

/// Extracts the first balanced JSON object from the reply and clamps
/// coordinates to [0, 100].
fn parse_photo_response(raw: &str) -> Option<PhotoRegion> {
    let json = extract_json_object(raw)?;
    let mut region: PhotoRegion = serde_json::from_str(json).ok()?;
    if !region.has_photo {
        region.coordinates = None;
    }
    region.coordinates = region.coordinates.map(|c| c.clamped());
    Some(region)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatePhotoRequest {
    pub image_data_url: String,
}

/// POST /api/v1/cv/photo
///
/// Takes a data-URL-encoded bitmap of page 1 and returns the detected
/// portrait region, if any.
pub async fn handle_locate_photo(
    State(state): State<AppState>,
    Json(request): Json<LocatePhotoRequest>,
) -> Result<Json<PhotoRegion>, AppError> {
    if request.image_data_url.is_empty() {
        return Err(AppError::Validation("Image data is required".to_string()));
    }

    let region = locate_photo(&state.llm, &request.image_data_url).await;
    info!("Photo detection result: has_photo={}", region.has_photo);
    Ok(Json(region))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_detection() {
        let raw = r#"{"hasPhoto": true, "coordinates": {"x": 4.5, "y": 6.0, "width": 18.0, "height": 22.0}}"#;
        let region = parse_photo_response(raw).unwrap();
        assert!(region.has_photo);
        let coords = region.coordinates.unwrap();
        assert_eq!(coords.x, 4.5);
        assert_eq!(coords.height, 22.0);
    }

    #[test]
    fn test_parse_negative_detection() {
        let region = parse_photo_response(r#"{"hasPhoto": false}"#).unwrap();
        assert!(!region.has_photo);
        assert!(region.coordinates.is_none());
    }

    #[test]
    fn test_parse_reply_embedded_in_prose() {
        let raw = "Looking at the page, I can see a portrait in the top-left corner.\n\
                   {\"hasPhoto\": true, \"coordinates\": {\"x\": 2, \"y\": 3, \"width\": 15, \"height\": 20}}";
        let region = parse_photo_response(raw).unwrap();
        assert!(region.has_photo);
    }

    #[test]
    fn test_out_of_range_coordinates_are_clamped() {
        let raw = r#"{"hasPhoto": true, "coordinates": {"x": -5, "y": 110, "width": 30, "height": 30}}"#;
        let coords = parse_photo_response(raw).unwrap().coordinates.unwrap();
        assert_eq!(coords.x, 0.0);
        assert_eq!(coords.y, 100.0);
    }

    #[test]
    fn test_coordinates_dropped_when_no_photo() {
        let raw = r#"{"hasPhoto": false, "coordinates": {"x": 1, "y": 1, "width": 1, "height": 1}}"#;
        let region = parse_photo_response(raw).unwrap();
        assert!(region.coordinates.is_none());
    }

    #[test]
    fn test_garbage_reply_is_none() {
        assert!(parse_photo_response("no portrait, sorry").is_none());
        assert!(parse_photo_response(r#"{"hasPhoto": "maybe"}"#).is_none());
    }
}
