//! Credit Ledger — the only shared mutable state in the system.
//!
//! Mutations go exclusively through the two stored procedures defined in the
//! migrations: `add_credits` and `deduct_credits`. The debit guard
//! (`balance >= amount`) and the decrement are one atomic row update inside
//! the procedure, so two concurrent enhancement requests cannot double-spend.
//! Nothing in this module holds an in-process lock.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::wallet::{CreditTransactionRow, PurchaseRow, WalletRow};
use crate::state::AppState;

/// Fixed price of one section enhancement. Checked client-side for UX;
/// enforced here before any paid model call is made.
pub const ENHANCE_COST: i32 = 10;

/// Side-effect-free balance read. A user without a wallet row reads as 0.
pub async fn get_balance(pool: &PgPool, user_id: Uuid) -> Result<i32, AppError> {
    let balance: Option<i32> =
        sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(balance.unwrap_or(0))
}

/// Full wallet view: balance plus lifetime counters.
pub async fn get_wallet(pool: &PgPool, user_id: Uuid) -> Result<WalletRow, AppError> {
    let wallet: Option<WalletRow> = sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(wallet.unwrap_or_else(|| WalletRow::empty(user_id)))
}

/// Completed and pending external payments, newest first.
pub async fn purchase_history(pool: &PgPool, user_id: Uuid) -> Result<Vec<PurchaseRow>, AppError> {
    Ok(sqlx::query_as::<_, PurchaseRow>(
        "SELECT * FROM purchases WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Attempts an atomic debit via the `deduct_credits` stored procedure.
/// Returns `false` (with no state change) when the balance is insufficient.
pub async fn try_debit(
    pool: &PgPool,
    user_id: Uuid,
    amount: i32,
    feature: &str,
    reference_id: Option<&str>,
) -> Result<bool, AppError> {
    let applied: bool = sqlx::query_scalar("SELECT deduct_credits($1, $2, $3, $4)")
        .bind(user_id)
        .bind(amount)
        .bind(feature)
        .bind(reference_id)
        .fetch_one(pool)
        .await?;

    if applied {
        info!("Debited {amount} credits from user {user_id} for {feature}");
    }
    Ok(applied)
}

/// Adds credits via the `add_credits` stored procedure.
/// Used for purchases, bonuses, and refunds. Accepts any executor so that
/// webhook fulfillment can run it inside its purchase transaction.
pub async fn credit<'e, E>(
    executor: E,
    user_id: Uuid,
    amount: i32,
    transaction_type: &str,
    reference_id: Option<&str>,
) -> Result<(), AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>("SELECT add_credits($1, $2, $3::credit_transaction_type, $4)")
        .bind(user_id)
        .bind(amount)
        .bind(transaction_type)
        .bind(reference_id)
        .fetch_one(executor)
        .await?;

    info!("Credited {amount} credits to user {user_id} ({transaction_type})");
    Ok(())
}

/// Append-only transaction log, newest first.
pub async fn history(pool: &PgPool, user_id: Uuid) -> Result<Vec<CreditTransactionRow>, AppError> {
    Ok(sqlx::query_as::<_, CreditTransactionRow>(
        r#"
        SELECT id, user_id, amount, balance_after,
               transaction_type::text AS transaction_type,
               feature, reference_id, created_at
        FROM credit_transactions
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub balance: i32,
}

/// GET /api/v1/credits/balance
pub async fn handle_get_balance(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = get_balance(&state.db, params.user_id).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// GET /api/v1/credits/history
pub async fn handle_get_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<CreditTransactionRow>>, AppError> {
    let transactions = history(&state.db, params.user_id).await?;
    Ok(Json(transactions))
}

/// GET /api/v1/credits/wallet
pub async fn handle_get_wallet(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<WalletRow>, AppError> {
    let wallet = get_wallet(&state.db, params.user_id).await?;
    Ok(Json(wallet))
}

/// GET /api/v1/credits/purchases
pub async fn handle_get_purchases(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PurchaseRow>>, AppError> {
    let purchases = purchase_history(&state.db, params.user_id).await?;
    Ok(Json(purchases))
}

#[cfg(test)]
mod tests {
    use super::*;

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
    async fn test_balance_of_unknown_user_is_zero(pool: PgPool) {
        assert_eq!(get_balance(&pool, Uuid::new_v4()).await.unwrap(), 0);
    }

    #[sqlx::test]
    async fn test_credit_then_debit_keeps_a_verifiable_running_total(pool: PgPool) {
        let user = seed_user(&pool).await;

        credit(&pool, user, 100, "purchase", Some("cs_test_1"))
            .await
            .unwrap();
        assert_eq!(get_balance(&pool, user).await.unwrap(), 100);

        let applied = try_debit(&pool, user, ENHANCE_COST, "cv_improve_summary", None)
            .await
            .unwrap();
        assert!(applied);
        assert_eq!(get_balance(&pool, user).await.unwrap(), 90);

        let log = history(&pool, user).await.unwrap();
        assert_eq!(log.len(), 2);
        // Newest first: the debit, then the purchase.
        assert_eq!(log[0].amount, -ENHANCE_COST);
        assert_eq!(log[0].balance_after, 90);
        assert_eq!(log[0].transaction_type, "usage");
        assert_eq!(log[0].feature.as_deref(), Some("cv_improve_summary"));
        assert_eq!(log[1].amount, 100);
        assert_eq!(log[1].balance_after, 100);
        assert_eq!(log[1].transaction_type, "purchase");
    }

    #[sqlx::test]
    async fn test_insufficient_debit_leaves_wallet_and_log_unchanged(pool: PgPool) {
        let user = seed_user(&pool).await;
        credit(&pool, user, 5, "bonus", None).await.unwrap();

        let applied = try_debit(&pool, user, ENHANCE_COST, "cv_improve_skills", None)
            .await
            .unwrap();
        assert!(!applied);

        assert_eq!(get_balance(&pool, user).await.unwrap(), 5);
        let log = history(&pool, user).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].transaction_type, "bonus");
    }

    #[sqlx::test]
    async fn test_wallet_view_tracks_lifetime_counters(pool: PgPool) {
        let user = seed_user(&pool).await;

        // Never-credited user reads as an empty wallet, not an error.
        let wallet = get_wallet(&pool, user).await.unwrap();
        assert_eq!(wallet.balance, 0);

        credit(&pool, user, 100, "purchase", Some("cs_test_2"))
            .await
            .unwrap();
        try_debit(&pool, user, ENHANCE_COST, "cv_improve_experience", None)
            .await
            .unwrap();

        let wallet = get_wallet(&pool, user).await.unwrap();
        assert_eq!(wallet.balance, 90);
        assert_eq!(wallet.total_purchased, 100);
        assert_eq!(wallet.total_used, ENHANCE_COST);
    }
}
