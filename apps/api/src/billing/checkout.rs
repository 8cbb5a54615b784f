//! Checkout creation — maps a credit pack to a hosted Stripe Checkout session.
//!
//! The session carries `user_id`, `pack_id`, and `credits` as opaque metadata;
//! the webhook reads them back after payment, so nothing about the purchase is
//! trusted from the client at fulfillment time.

use axum::{extract::State, Json};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::billing::packs::{self, CreditPack};
use crate::errors::AppError;
use crate::state::AppState;

const STRIPE_CHECKOUT_URL: &str = "https://api.stripe.com/v1/checkout/sessions";

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    url: String,
}

/// Thin Stripe API client. Only the checkout-session endpoint is used;
/// webhook verification needs no API access at all.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            secret_key,
        }
    }

    /// Creates a payment-mode checkout session and returns its hosted URL.
    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        pack: &CreditPack,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<String, AppError> {
        let product_name = format!("{} — {} credits", pack.name, pack.credits);
        let params: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
            (
                "line_items[0][price_data][currency]",
                packs::CURRENCY.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                product_name,
            ),
            (
                "line_items[0][price_data][unit_amount]",
                pack.price_cents.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[user_id]", user_id.to_string()),
            ("metadata[pack_id]", pack.id.to_string()),
            ("metadata[credits]", pack.credits.to_string()),
        ];

        let response = self
            .client
            .post(STRIPE_CHECKOUT_URL)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("Checkout session request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Payment(format!(
                "Checkout session creation returned {status}: {body}"
            )));
        }

        let session: CheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Payment(format!("Unreadable checkout session reply: {e}")))?;

        Ok(session.url)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub user_id: Uuid,
    pub pack_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    pub url: String,
}

/// POST /api/v1/checkout
pub async fn handle_create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>, AppError> {
    let pack = packs::find_pack(&request.pack_id)
        .ok_or_else(|| AppError::Validation(format!("Unknown credit pack '{}'", request.pack_id)))?;

    let url = state
        .stripe
        .create_checkout_session(
            request.user_id,
            pack,
            &state.config.checkout_success_url,
            &state.config.checkout_cancel_url,
        )
        .await?;

    info!(
        "Created checkout session for user {} (pack {})",
        request.user_id, pack.id
    );
    Ok(Json(CreateCheckoutResponse { url }))
}
