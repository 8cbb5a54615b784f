use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One credit wallet per user.
/// Invariant: `balance = total_purchased - total_used + adjustments`,
/// and balance never goes negative (enforced by the `deduct_credits`
/// stored procedure).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WalletRow {
    pub user_id: Uuid,
    pub balance: i32,
    pub total_purchased: i32,
    pub total_used: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WalletRow {
    /// Wallet rows are created lazily on the first credit. A user without one
    /// is presented as an empty wallet, not a missing one.
    pub fn empty(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance: 0,
            total_purchased: 0,
            total_used: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only ledger entry. `balance_after` must equal the wallet balance
/// immediately following the transaction, making the log a verifiable
/// running total.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditTransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i32,
    pub balance_after: i32,
    pub transaction_type: String,
    pub feature: Option<String>,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Immutable record of one completed external payment. Keyed uniquely by the
/// Stripe session id so redelivered webhooks are no-ops.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stripe_session_id: String,
    pub stripe_payment_intent_id: Option<String>,
    pub pack_name: String,
    pub credits_purchased: i32,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_wallet_has_zeroed_counters() {
        let user = Uuid::new_v4();
        let wallet = WalletRow::empty(user);
        assert_eq!(wallet.user_id, user);
        assert_eq!(wallet.balance, 0);
        assert_eq!(wallet.total_purchased, 0);
        assert_eq!(wallet.total_used, 0);
    }
}
