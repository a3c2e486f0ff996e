//! Billing events and the manual correction request.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use tally_shared::types::{MerchantId, OrderId, RefundId};

use crate::model::{Order, Refund};

/// A billing event, routed to exactly one pipeline.
///
/// The variant set is closed; there is no string-keyed dispatch and no
/// unknown-event case to handle at runtime.
#[derive(Debug, Clone)]
pub enum BillingEvent {
    /// Payment confirmed for an order.
    Payment(Order),
    /// Refund confirmed.
    Refund {
        /// The refund being accounted.
        refund: Refund,
        /// The order the refund reverses, resolved by the caller.
        order: Order,
    },
    /// Operator-issued manual correction.
    Correction(CorrectionRequest),
}

/// The record a manual correction is scoped to.
#[derive(Debug, Clone, Copy)]
pub enum CorrectionTarget {
    /// Correction against an order.
    Order(OrderId),
    /// Correction against a refund.
    Refund(RefundId),
    /// Merchant-scoped correction with no order or refund.
    Merchant(MerchantId),
}

/// An operator-issued request to post one correction entry.
///
/// The entry type arrives as text and is checked against the catalog
/// before any lookup runs.
#[derive(Debug, Clone)]
pub struct CorrectionRequest {
    /// Business name of the entry kind to post.
    pub entry_type: String,
    /// Correction value.
    pub amount: Decimal,
    /// Currency of the correction value.
    pub currency: String,
    /// Operator-supplied reason.
    pub reason: Option<String>,
    /// Effective date; defaults to now.
    pub date: Option<DateTime<Utc>>,
    /// The record the correction is scoped to.
    pub target: CorrectionTarget,
    /// Country code for merchant-scoped corrections.
    pub country: Option<String>,
}
