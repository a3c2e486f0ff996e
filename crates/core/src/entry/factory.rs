//! Blank entry construction from the active pipeline context.

use chrono::Utc;
use rust_decimal::Decimal;

use tally_shared::types::EntryId;

use super::types::{
    AccountingEntry, EntrySource, EntryStatus, EntryType, SourceType, ENTRY_OBJECT_TYPE,
};
use crate::model::{Merchant, Order, Refund};

/// The context a pipeline is running for. Determines the source reference,
/// merchant, currency and country pre-filled into every entry.
#[derive(Debug, Clone, Copy)]
pub enum EntryScope<'a> {
    /// Payment pipeline: entries reference the paid order.
    Order(&'a Order),
    /// Refund pipeline: entries reference the refund; currency and country
    /// still come from the originating order.
    Refund {
        /// The refund being accounted.
        refund: &'a Refund,
        /// The order the refund reverses.
        order: &'a Order,
    },
    /// Merchant-scoped manual correction without an order or refund.
    Merchant {
        /// The merchant being corrected.
        merchant: &'a Merchant,
        /// Country code from the correction request.
        country: &'a str,
    },
}

/// Builds blank ledger entries pre-populated from the active scope.
pub struct EntryFactory;

impl EntryFactory {
    /// Creates a blank entry of the given kind.
    ///
    /// Amount fields start at zero; original and local fields start unset
    /// and are backfilled or computed by the validator.
    #[must_use]
    pub fn blank(scope: &EntryScope<'_>, entry_type: EntryType) -> AccountingEntry {
        let (source, merchant_id, country, operating_company_id, currency) = match scope {
            EntryScope::Order(order) => (
                EntrySource {
                    source_type: SourceType::Order,
                    id: order.id.to_string(),
                },
                order.merchant_id,
                order.country_code.clone(),
                Some(order.operating_company_id),
                order.royalty_currency.clone(),
            ),
            EntryScope::Refund { refund, order } => (
                EntrySource {
                    source_type: SourceType::Refund,
                    id: refund.id.to_string(),
                },
                order.merchant_id,
                order.country_code.clone(),
                Some(order.operating_company_id),
                order.royalty_currency.clone(),
            ),
            EntryScope::Merchant { merchant, country } => (
                EntrySource {
                    source_type: SourceType::Merchant,
                    id: merchant.id.to_string(),
                },
                merchant.id,
                (*country).to_string(),
                None,
                merchant.royalty_currency.clone(),
            ),
        };

        AccountingEntry {
            id: EntryId::new(),
            object_type: ENTRY_OBJECT_TYPE.to_string(),
            entry_type,
            source,
            merchant_id,
            country,
            operating_company_id,
            amount: Decimal::ZERO,
            currency,
            original_amount: Decimal::ZERO,
            original_currency: String::new(),
            local_amount: Decimal::ZERO,
            local_currency: String::new(),
            status: EntryStatus::Available,
            reason: None,
            created_at: Utc::now(),
        }
    }
}
