//! Merchant read model and balance aggregate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::MerchantId;

/// A merchant as seen by the accounting engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    /// Merchant identifier.
    pub id: MerchantId,
    /// Currency the merchant's net revenue settles in.
    pub royalty_currency: String,
}

/// Aggregated merchant balance, recomputed from persisted entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantBalance {
    /// Merchant the balance belongs to.
    pub merchant_id: MerchantId,
    /// Settlement currency of the balance.
    pub currency: String,
    /// Net rolling reserve currently withheld (created minus released).
    pub rolling_reserve: Decimal,
}
