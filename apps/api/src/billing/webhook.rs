//! Stripe webhook receipt — the asynchronous, provider-initiated half of the
//! purchase flow and the sole non-interactive writer to the credit ledger.
//!
//! Nothing in the payload is trusted before the signature verifies against the
//! shared webhook secret. Fulfillment is idempotent: the purchase insert is
//! keyed by the session id, and credits are only added when that insert lands,
//! inside the same transaction. A redelivered event acks without side effects.

use std::collections::HashMap;

use axum::{extract::State, http::HeaderMap, Json};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ledger;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of a signed payload, to blunt replay.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Verifies a `Stripe-Signature` header (`t=<unix>,v1=<hex hmac>`) against the
/// raw payload. The signed message is `"{t}.{payload}"`; comparison is
/// constant-time via the Mac verifier.
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), AppError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::WebhookRejected("Malformed signature header".to_string()))?;
    if candidates.is_empty() {
        return Err(AppError::WebhookRejected(
            "Signature header carries no v1 signature".to_string(),
        ));
    }

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::WebhookRejected(
            "Signature timestamp outside tolerance".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::WebhookRejected("Invalid webhook secret".to_string()))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());

    for candidate in candidates {
        let Ok(decoded) = hex::decode(candidate) else {
            continue;
        };
        if mac.clone().verify_slice(&decoded).is_ok() {
            return Ok(());
        }
    }

    Err(AppError::WebhookRejected(
        "Signature verification failed".to_string(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: Value,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// The metadata this service embedded at checkout-creation time.
#[derive(Debug, PartialEq, Eq)]
pub struct PurchaseMetadata {
    pub user_id: Uuid,
    pub pack_id: String,
    pub credits: i32,
}

/// Missing or malformed required metadata is a hard rejection — never a
/// partial credit.
fn extract_metadata(session: &CheckoutSession) -> Result<PurchaseMetadata, AppError> {
    let user_id = session
        .metadata
        .get("user_id")
        .ok_or_else(|| AppError::WebhookRejected("Session metadata missing user_id".to_string()))?;
    let user_id = Uuid::parse_str(user_id)
        .map_err(|_| AppError::WebhookRejected("Session metadata user_id is invalid".to_string()))?;

    let credits = session
        .metadata
        .get("credits")
        .ok_or_else(|| AppError::WebhookRejected("Session metadata missing credits".to_string()))?;
    let credits: i32 = credits.parse().map_err(|_| {
        AppError::WebhookRejected("Session metadata credits is not a number".to_string())
    })?;
    if credits <= 0 {
        return Err(AppError::WebhookRejected(
            "Session metadata credits must be positive".to_string(),
        ));
    }

    let pack_id = session
        .metadata
        .get("pack_id")
        .cloned()
        .unwrap_or_else(|| "unknown".to_string());

    Ok(PurchaseMetadata {
        user_id,
        pack_id,
        credits,
    })
}

/// POST /api/v1/webhooks/stripe
///
/// The body must stay raw: the signature covers the exact bytes received.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::WebhookRejected("Missing signature header".to_string()))?;

    verify_signature(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        chrono::Utc::now().timestamp(),
    )?;

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::WebhookRejected(format!("Unparseable event payload: {e}")))?;

    info!("Webhook received: {}", event.event_type);

    if event.event_type != CHECKOUT_COMPLETED {
        debug!("Ignoring webhook event type {}", event.event_type);
        return Ok(Json(json!({ "received": true })));
    }

    let session: CheckoutSession = serde_json::from_value(event.data.object)
        .map_err(|e| AppError::WebhookRejected(format!("Unparseable checkout session: {e}")))?;
    let metadata = extract_metadata(&session)?;

    process_completed_checkout(&state.db, &session, &metadata).await?;

    Ok(Json(json!({ "received": true })))
}

/// Records the purchase and adds credits, atomically and exactly once per
/// session id.
async fn process_completed_checkout(
    pool: &PgPool,
    session: &CheckoutSession,
    metadata: &PurchaseMetadata,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO purchases
            (user_id, stripe_session_id, stripe_payment_intent_id, pack_name,
             credits_purchased, amount_cents, currency, status, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'completed', NOW())
        ON CONFLICT (stripe_session_id) DO NOTHING
        "#,
    )
    .bind(metadata.user_id)
    .bind(&session.id)
    .bind(&session.payment_intent)
    .bind(&metadata.pack_id)
    .bind(metadata.credits)
    .bind(session.amount_total.unwrap_or(0))
    .bind(session.currency.as_deref().unwrap_or("eur"))
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if inserted == 0 {
        // Redelivered webhook for an already-fulfilled session.
        info!(
            "Duplicate webhook delivery for session {} — skipping",
            session.id
        );
        tx.commit().await?;
        return Ok(());
    }

    ledger::credit(
        &mut *tx,
        metadata.user_id,
        metadata.credits,
        "purchase",
        Some(&session.id),
    )
    .await?;

    tx.commit().await?;

    info!(
        "Fulfilled purchase: {} credits for user {} (session {})",
        metadata.credits, metadata.user_id, session.id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &str, timestamp: i64, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={signature}")
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = r#"{"type":"checkout.session.completed"}"#;
        let header = sign(payload, 1_700_000_000, SECRET);
        assert!(verify_signature(payload, &header, SECRET, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign(r#"{"credits":"350"}"#, 1_700_000_000, SECRET);
        let err =
            verify_signature(r#"{"credits":"999350"}"#, &header, SECRET, 1_700_000_000).unwrap_err();
        assert!(matches!(err, AppError::WebhookRejected(_)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = "{}";
        let header = sign(payload, 1_700_000_000, "whsec_other");
        assert!(verify_signature(payload, &header, SECRET, 1_700_000_000).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = "{}";
        let header = sign(payload, 1_700_000_000, SECRET);
        let err = verify_signature(
            payload,
            &header,
            SECRET,
            1_700_000_000 + SIGNATURE_TOLERANCE_SECS + 1,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::WebhookRejected(_)));
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(verify_signature("{}", "", SECRET, 0).is_err());
        assert!(verify_signature("{}", "t=notanumber,v1=ab", SECRET, 0).is_err());
        assert!(verify_signature("{}", "v1=deadbeef", SECRET, 0).is_err());
        assert!(verify_signature("{}", "t=1700000000", SECRET, 1_700_000_000).is_err());
    }

    #[test]
    fn test_second_v1_candidate_can_match() {
        // Stripe sends multiple v1 entries during secret rotation.
        let payload = "{}";
        let timestamp = 1_700_000_000;
        let good = sign(payload, timestamp, SECRET);
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={timestamp},v1={},v1={good_sig}", "00".repeat(32));
        assert!(verify_signature(payload, &header, SECRET, timestamp).is_ok());
    }

    fn session_with_metadata(metadata: &[(&str, &str)]) -> CheckoutSession {
        CheckoutSession {
            id: "cs_test_123".to_string(),
            payment_intent: Some("pi_test_123".to_string()),
            amount_total: Some(2400),
            currency: Some("eur".to_string()),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_metadata_extraction() {
        let user = Uuid::new_v4();
        let user_str = user.to_string();
        let session = session_with_metadata(&[
            ("user_id", user_str.as_str()),
            ("pack_id", "pro"),
            ("credits", "350"),
        ]);
        let metadata = extract_metadata(&session).unwrap();
        assert_eq!(
            metadata,
            PurchaseMetadata {
                user_id: user,
                pack_id: "pro".to_string(),
                credits: 350,
            }
        );
    }

    #[test]
    fn test_missing_required_metadata_is_rejected() {
        let session = session_with_metadata(&[("pack_id", "pro"), ("credits", "350")]);
        assert!(matches!(
            extract_metadata(&session),
            Err(AppError::WebhookRejected(_))
        ));

        let user = Uuid::new_v4().to_string();
        let session = session_with_metadata(&[("user_id", user.as_str())]);
        assert!(matches!(
            extract_metadata(&session),
            Err(AppError::WebhookRejected(_))
        ));
    }

    #[test]
    fn test_invalid_metadata_values_are_rejected() {
        let session = session_with_metadata(&[("user_id", "not-a-uuid"), ("credits", "350")]);
        assert!(extract_metadata(&session).is_err());

        let user = Uuid::new_v4().to_string();
        let session =
            session_with_metadata(&[("user_id", user.as_str()), ("credits", "three fifty")]);
        assert!(extract_metadata(&session).is_err());

        let session = session_with_metadata(&[("user_id", user.as_str()), ("credits", "-5")]);
        assert!(extract_metadata(&session).is_err());
    }

    #[test]
    fn test_missing_pack_id_defaults_to_unknown() {
        let user = Uuid::new_v4().to_string();
        let session = session_with_metadata(&[("user_id", user.as_str()), ("credits", "100")]);
        assert_eq!(extract_metadata(&session).unwrap().pack_id, "unknown");
    }

    async fn seed_user(pool: &PgPool) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO profiles (id, email) VALUES ($1, $2)")
            .bind(id)
            .bind(format!("{id}@example.org"))
            .execute(pool)
            .await
            .unwrap();
        id
    }

    #[sqlx::test]
    async fn test_redelivered_session_credits_exactly_once(pool: PgPool) {
        let user = seed_user(&pool).await;
        let session = CheckoutSession {
            id: "cs_test_redelivered".to_string(),
            payment_intent: Some("pi_test_1".to_string()),
            amount_total: Some(900),
            currency: Some("eur".to_string()),
            metadata: HashMap::new(),
        };
        let metadata = PurchaseMetadata {
            user_id: user,
            pack_id: "starter".to_string(),
            credits: 100,
        };

        process_completed_checkout(&pool, &session, &metadata)
            .await
            .unwrap();
        // At-least-once delivery: the same event arrives again.
        process_completed_checkout(&pool, &session, &metadata)
            .await
            .unwrap();

        assert_eq!(ledger::get_balance(&pool, user).await.unwrap(), 100);
        let purchases = ledger::purchase_history(&pool, user).await.unwrap();
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].stripe_session_id, "cs_test_redelivered");
        assert_eq!(purchases[0].credits_purchased, 100);
        assert_eq!(purchases[0].status, "completed");
    }

    #[test]
    fn test_event_decoding() {
        let body = r#"{
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_abc",
                    "payment_intent": "pi_test_abc",
                    "amount_total": 900,
                    "currency": "eur",
                    "metadata": {"user_id": "0c9c306b-7d96-4a9b-9a52-c5f6ad7a6dd1", "pack_id": "starter", "credits": "100"}
                }
            }
        }"#;
        let event: WebhookEvent = serde_json::from_str(body).unwrap();
        assert_eq!(event.event_type, CHECKOUT_COMPLETED);
        let session: CheckoutSession = serde_json::from_value(event.data.object).unwrap();
        assert_eq!(session.id, "cs_test_abc");
        assert_eq!(extract_metadata(&session).unwrap().credits, 100);
    }
}
