// Checkout/Webhook bridge: the only writer to the ledger for purchases.
// Checkout creation is interactive; webhook processing is provider-initiated
// and must stay idempotent under at-least-once delivery.

pub mod checkout;
pub mod packs;
pub mod webhook;
