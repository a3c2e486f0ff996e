//! Order read model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{MerchantId, OperatingCompanyId, OrderId, PaylinkId};

/// Public lifecycle status of an order, as reported to merchants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPublicStatus {
    /// Order created, payment not confirmed yet.
    Created,
    /// Payment confirmed and settled.
    Processed,
    /// Order fully or partially refunded.
    Refunded,
    /// Order charged back by the issuing bank.
    Chargeback,
    /// Order canceled before payment.
    Canceled,
}

impl OrderPublicStatus {
    /// Returns true if the order participates in accounting.
    ///
    /// Payment and refund notifications for orders in any other status are
    /// no-ops.
    #[must_use]
    pub fn allows_accounting(self) -> bool {
        matches!(self, Self::Processed | Self::Refunded | Self::Chargeback)
    }
}

/// Tax block resolved on an order at payment time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTax {
    /// Tax rate as a fraction, e.g. `0.20` for 20% VAT.
    pub rate: Decimal,
    /// Tax amount in the charge currency.
    pub amount: Decimal,
}

/// An order as seen by the accounting engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub id: OrderId,
    /// Merchant the order belongs to.
    pub merchant_id: MerchantId,
    /// ISO 3166-1 alpha-2 code of the buyer's country.
    pub country_code: String,
    /// Amount charged to the buyer.
    pub charge_amount: Decimal,
    /// Currency the buyer was charged in.
    pub charge_currency: String,
    /// Currency the merchant's net revenue settles in.
    pub royalty_currency: String,
    /// Tax resolved for this order.
    pub tax: OrderTax,
    /// Public lifecycle status.
    pub public_status: OrderPublicStatus,
    /// Payment method name, e.g. "card" or "qiwi".
    pub payment_method_name: String,
    /// Merchant category code used in commission lookups.
    pub mcc_code: String,
    /// Operating company handling this transaction.
    pub operating_company_id: OperatingCompanyId,
    /// Paylink this order was created through, if any.
    pub paylink_id: Option<PaylinkId>,
    /// True when refunds of this order deduct VAT instead of reversing it.
    pub vat_deduction: bool,
    /// Timestamp the payment was finalized; pins historical rates.
    pub closed_at: DateTime<Utc>,
}
