//! Refund read model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{OrderId, RefundId};

/// A refund as seen by the accounting engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    /// Refund identifier.
    pub id: RefundId,
    /// The order this refund reverses.
    pub original_order_id: OrderId,
    /// Refunded amount.
    pub amount: Decimal,
    /// Currency of the refunded amount.
    pub currency: String,
    /// True when the refund was forced by a chargeback.
    pub is_chargeback: bool,
    /// When the refund was confirmed.
    pub created_at: DateTime<Utc>,
}
