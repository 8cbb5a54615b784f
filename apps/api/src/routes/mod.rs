pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::billing::{checkout, webhook};
use crate::cv;
use crate::enhance;
use crate::ledger;
use crate::photo;
use crate::render::handlers as render_handlers;
use crate::state::AppState;

// Uploaded CVs are small; 10 MiB leaves room for photo-heavy PDFs.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // CV pipeline
        .route("/api/v1/cv/parse", post(cv::handle_parse))
        .route("/api/v1/cv/photo", post(photo::handle_locate_photo))
        .route("/api/v1/cv/improve", post(enhance::handle_enhance))
        .route("/api/v1/cv/render", post(render_handlers::handle_render))
        .route("/api/v1/cv/export", post(render_handlers::handle_export))
        .route("/api/v1/cv/save", post(cv::handle_save))
        .route("/api/v1/cv/:id", get(cv::handle_get))
        // Credits
        .route("/api/v1/credits/balance", get(ledger::handle_get_balance))
        .route("/api/v1/credits/wallet", get(ledger::handle_get_wallet))
        .route("/api/v1/credits/history", get(ledger::handle_get_history))
        .route(
            "/api/v1/credits/purchases",
            get(ledger::handle_get_purchases),
        )
        // Billing
        .route("/api/v1/checkout", post(checkout::handle_create_checkout))
        .route(
            "/api/v1/webhooks/stripe",
            post(webhook::handle_stripe_webhook),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
