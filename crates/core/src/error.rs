//! Error types for the accounting entry engine.
//!
//! Every failure a pipeline can produce maps to one stable business error
//! code; hosts translate these into their transport of choice.

use thiserror::Error;

use tally_shared::types::{MerchantId, OrderId, RefundId};

/// Errors that can occur while deriving or persisting accounting entries.
#[derive(Debug, Error)]
pub enum AccountingError {
    // ========== Not Found ==========
    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Refund not found.
    #[error("Refund not found: {0}")]
    RefundNotFound(RefundId),

    /// Merchant not found.
    #[error("Merchant not found: {0}")]
    MerchantNotFound(MerchantId),

    /// Country not found.
    #[error("Country not found: {0}")]
    CountryNotFound(String),

    /// Price group not found for a country.
    #[error("Price group not found for country {0}")]
    PriceGroupNotFound(String),

    /// No matching commission record in the cost sheets.
    #[error("Commission not found for method {method} in {country}")]
    CommissionNotFound {
        /// Payment method name used for the lookup.
        method: String,
        /// Country code used for the lookup.
        country: String,
    },

    /// The original order has no persisted tax entry to reverse.
    #[error("Original tax entry not found for order {0}")]
    OriginalTaxNotFound(OrderId),

    // ========== Validation ==========
    /// Entry type is not in the allowed set.
    #[error("Unknown accounting entry type: {0}")]
    UnknownEntryType(String),

    /// Source type is not in the allowed set.
    #[error("Unknown entry source type: {0}")]
    UnknownSourceType(String),

    /// Entry source id is empty.
    #[error("Entry source id must not be empty")]
    InvalidSourceId,

    /// Refund amount exceeds the original order charge amount.
    #[error("Refund amount {refund} exceeds order charge amount {charge}")]
    RefundExceedsOrderAmount {
        /// Refund amount.
        refund: rust_decimal::Decimal,
        /// Original order charge amount.
        charge: rust_decimal::Decimal,
    },

    // ========== Conflict ==========
    /// Entries already exist for this source.
    #[error("Accounting entries already created for {source_type} {source_id}")]
    AlreadyCreated {
        /// Source type of the existing entries.
        source_type: String,
        /// Source id of the existing entries.
        source_id: String,
    },

    // ========== External Service ==========
    /// A currency-exchange operation failed.
    #[error("Currency exchange failed: {from} -> {to} ({rate_type}): {message}")]
    ExchangeFailed {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
        /// Rate regime used for the request.
        rate_type: String,
        /// Failure detail from the rate service.
        message: String,
    },

    // ========== Configuration ==========
    /// Country has VAT enabled but no VAT settlement currency configured.
    #[error("VAT currency not set for country {0}")]
    VatCurrencyNotSet(String),

    /// The configured duplicate policy has no implemented semantics.
    #[error("Duplicate policy 'update' is not implemented")]
    DuplicatePolicyNotImplemented,

    // ========== Infrastructure ==========
    /// Entry store failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Tax correction finished with per-record failures.
    #[error("Tax correction failed for {failed} of {total} entries: {details}")]
    TaxCorrectionFailed {
        /// Number of entries that could not be recomputed.
        failed: usize,
        /// Total number of entries examined.
        total: usize,
        /// Aggregated per-record failure detail.
        details: String,
    },
}

impl AccountingError {
    /// Returns the stable business error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::RefundNotFound(_) => "REFUND_NOT_FOUND",
            Self::MerchantNotFound(_) => "MERCHANT_NOT_FOUND",
            Self::CountryNotFound(_) => "COUNTRY_NOT_FOUND",
            Self::PriceGroupNotFound(_) => "PRICE_GROUP_NOT_FOUND",
            Self::CommissionNotFound { .. } => "COMMISSION_NOT_FOUND",
            Self::OriginalTaxNotFound(_) => "ORIGINAL_TAX_NOT_FOUND",
            Self::UnknownEntryType(_) => "UNKNOWN_ENTRY_TYPE",
            Self::UnknownSourceType(_) => "UNKNOWN_SOURCE_TYPE",
            Self::InvalidSourceId => "INVALID_SOURCE_ID",
            Self::RefundExceedsOrderAmount { .. } => "REFUND_EXCEEDS_ORDER_AMOUNT",
            Self::AlreadyCreated { .. } => "ALREADY_CREATED",
            Self::ExchangeFailed { .. } => "EXCHANGE_FAILED",
            Self::VatCurrencyNotSet(_) => "VAT_CURRENCY_NOT_SET",
            Self::DuplicatePolicyNotImplemented => "DUPLICATE_POLICY_NOT_IMPLEMENTED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::TaxCorrectionFailed { .. } => "TAX_CORRECTION_FAILED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::UnknownEntryType(_)
            | Self::UnknownSourceType(_)
            | Self::InvalidSourceId
            | Self::RefundExceedsOrderAmount { .. } => 400,

            Self::OrderNotFound(_)
            | Self::RefundNotFound(_)
            | Self::MerchantNotFound(_)
            | Self::CountryNotFound(_)
            | Self::PriceGroupNotFound(_)
            | Self::CommissionNotFound { .. }
            | Self::OriginalTaxNotFound(_) => 404,

            Self::AlreadyCreated { .. } => 409,

            Self::VatCurrencyNotSet(_) | Self::DuplicatePolicyNotImplemented => 500,

            Self::ExchangeFailed { .. }
            | Self::Storage(_)
            | Self::TaxCorrectionFailed { .. } => 500,
        }
    }

    /// Returns true if retrying the whole event may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ExchangeFailed { .. } | Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AccountingError::OrderNotFound(OrderId::new()).error_code(),
            "ORDER_NOT_FOUND"
        );
        assert_eq!(
            AccountingError::AlreadyCreated {
                source_type: "order".into(),
                source_id: "x".into(),
            }
            .error_code(),
            "ALREADY_CREATED"
        );
        assert_eq!(
            AccountingError::InvalidSourceId.error_code(),
            "INVALID_SOURCE_ID"
        );
        assert_eq!(
            AccountingError::VatCurrencyNotSet("DE".into()).error_code(),
            "VAT_CURRENCY_NOT_SET"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            AccountingError::RefundExceedsOrderAmount {
                refund: dec!(120),
                charge: dec!(100),
            }
            .http_status_code(),
            400
        );
        assert_eq!(
            AccountingError::MerchantNotFound(MerchantId::new()).http_status_code(),
            404
        );
        assert_eq!(
            AccountingError::AlreadyCreated {
                source_type: "order".into(),
                source_id: "x".into(),
            }
            .http_status_code(),
            409
        );
        assert_eq!(
            AccountingError::Storage("down".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(AccountingError::Storage("down".into()).is_retryable());
        assert!(AccountingError::ExchangeFailed {
            from: "EUR".into(),
            to: "USD".into(),
            rate_type: "system".into(),
            message: "timeout".into(),
        }
        .is_retryable());
        assert!(!AccountingError::InvalidSourceId.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = AccountingError::RefundExceedsOrderAmount {
            refund: dec!(150.00),
            charge: dec!(100.00),
        };
        assert_eq!(
            err.to_string(),
            "Refund amount 150.00 exceeds order charge amount 100.00"
        );
    }
}
