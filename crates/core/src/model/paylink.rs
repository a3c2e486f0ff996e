//! Paylink read/write model.
//!
//! Paylink statistics are a derived aggregate recomputed after ledger
//! writes for orders attributed to a paylink.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{MerchantId, PaylinkId};

/// A shareable checkout link with rolling sales statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paylink {
    /// Paylink identifier.
    pub id: PaylinkId,
    /// Merchant owning the link.
    pub merchant_id: MerchantId,
    /// Number of recorded visits.
    pub visits: u64,
    /// Total transactions attributed to the link.
    pub total_transactions: u64,
    /// Number of successful sales.
    pub sales_count: u64,
    /// Number of returns (refunds and chargebacks).
    pub returns_count: u64,
    /// Gross value of sales.
    pub gross_sales_amount: Decimal,
    /// Gross value of returns.
    pub gross_returns_amount: Decimal,
    /// Gross sales minus gross returns.
    pub gross_total_amount: Decimal,
}

/// Sales aggregate for a paylink, derived from its orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaylinkSalesSummary {
    /// Total transactions attributed to the link.
    pub total_transactions: u64,
    /// Number of successful sales.
    pub sales_count: u64,
    /// Number of returns.
    pub returns_count: u64,
    /// Gross value of sales.
    pub gross_sales_amount: Decimal,
    /// Gross value of returns.
    pub gross_returns_amount: Decimal,
}

impl PaylinkSalesSummary {
    /// Gross sales minus gross returns.
    #[must_use]
    pub fn gross_total(&self) -> Decimal {
        self.gross_sales_amount - self.gross_returns_amount
    }
}
