use sqlx::PgPool;

use crate::billing::checkout::StripeClient;
use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    pub stripe: StripeClient,
    pub config: Config,
}
