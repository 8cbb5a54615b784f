//! Section Enhancer — credit-gated AI rewrites of individual CV sections.
//!
//! Ordering is the contract here: the balance gate runs before the paid model
//! call, and the debit runs after a successful call. A debit failure at that
//! point cannot un-spend the model tokens, so the improved text is still
//! returned and the inconsistency is logged for manual reconciliation.

pub mod prompts;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ledger::{self, ENHANCE_COST};
use crate::llm_client::LlmClient;
use crate::state::AppState;

// Rewrites want some creative range, unlike extraction.
const ENHANCE_TEMPERATURE: f32 = 0.7;

/// The four enhanceable CV sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Summary,
    Experience,
    Education,
    Skills,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Summary => "summary",
            Section::Experience => "experience",
            Section::Education => "education",
            Section::Skills => "skills",
        }
    }

    /// Feature tag recorded on the usage transaction.
    pub fn feature(&self) -> String {
        format!("cv_improve_{}", self.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    pub user_id: Uuid,
    pub section: Section,
    /// Current section content: free text or the structured value.
    pub content: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub improved: String,
    pub credits_used: i32,
}

/// POST /api/v1/cv/improve
pub async fn handle_enhance(
    State(state): State<AppState>,
    Json(request): Json<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>, AppError> {
    if request.content.is_null() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let response = enhance_section(
        &state.db,
        &state.llm,
        request.user_id,
        request.section,
        &request.content,
    )
    .await?;

    Ok(Json(response))
}

/// Runs the gated enhancement pipeline for one section.
pub async fn enhance_section(
    pool: &sqlx::PgPool,
    llm: &LlmClient,
    user_id: Uuid,
    section: Section,
    content: &serde_json::Value,
) -> Result<EnhanceResponse, AppError> {
    // Gate before spending anything externally billable.
    let available = ledger::get_balance(pool, user_id).await?;
    if available < ENHANCE_COST {
        return Err(AppError::InsufficientCredits {
            required: ENHANCE_COST,
            available,
        });
    }

    let content_text = content_as_text(content);
    let improved = llm
        .chat(
            Some(prompts::system_instruction(section)),
            &content_text,
            ENHANCE_TEMPERATURE,
        )
        .await
        .map_err(|e| AppError::Llm(format!("Section enhancement failed: {e}")))?;

    // The model call already happened and was billed externally. If the debit
    // fails now, the improved text is still delivered; the mismatch must be
    // reconciled manually.
    let feature = section.feature();
    let credits_used = match ledger::try_debit(pool, user_id, ENHANCE_COST, &feature, None).await {
        Ok(true) => ENHANCE_COST,
        Ok(false) => {
            error!(
                "Debit failed AFTER model call: user {user_id} balance dropped below {ENHANCE_COST} \
                 mid-request (feature {feature}); needs manual reconciliation"
            );
            0
        }
        Err(e) => {
            error!(
                "Debit errored AFTER model call for user {user_id} (feature {feature}): {e}; \
                 needs manual reconciliation"
            );
            0
        }
    };

    info!("Enhanced section {} for user {user_id}", section.as_str());
    Ok(EnhanceResponse {
        improved,
        credits_used,
    })
}

/// Turns the section content into the user turn. Free text passes through;
/// structured values are serialized readably.
fn content_as_text(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
