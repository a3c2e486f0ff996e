//! Accounting entry types.
//!
//! The entry kind catalog and the source-type set are closed: they are
//! compile-time enumerations, not runtime-mutable allow-lists.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_shared::types::{EntryId, MerchantId, OperatingCompanyId};

use crate::error::AccountingError;

/// Object type tag marking an entry as a balance-affecting transaction.
pub const ENTRY_OBJECT_TYPE: &str = "balance_transaction";

/// Macro defining the closed entry-kind catalog with its business names.
macro_rules! entry_types {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal, )+) => {
        /// Kind of an accounting entry.
        ///
        /// The catalog is closed; a string that does not match one of these
        /// business names is rejected before any lookup runs.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum EntryType {
            $( $(#[$meta])* $variant, )+
        }

        impl EntryType {
            /// Every kind in the catalog.
            pub const ALL: &'static [Self] = &[ $(Self::$variant,)+ ];

            /// Business name of the kind.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl std::str::FromStr for EntryType {
            type Err = AccountingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(AccountingError::UnknownEntryType(s.to_string())),
                }
            }
        }
    };
}

entry_types! {
    // Payment pipeline.
    /// Gross revenue at the system rate.
    RealGrossRevenue => "real_gross_revenue",
    /// Tax at the system rate.
    RealTaxFee => "real_tax_fee",
    /// Central-bank tax placeholder, persisted as zero at payment time.
    CentralBankTaxFee => "central_bank_tax_fee",
    /// Spread between the merchant and the system exchange rate.
    PsGrossRevenueFx => "ps_gross_revenue_fx",
    /// Tax share of the rate spread.
    PsGrossRevenueFxTaxFee => "ps_gross_revenue_fx_tax_fee",
    /// Platform profit share of the rate spread (read-model derived).
    PsGrossRevenueFxProfit => "ps_gross_revenue_fx_profit",
    /// Gross revenue attributed to the merchant (read-model derived).
    MerchantGrossRevenue => "merchant_gross_revenue",
    /// Merchant tax fee (read-model derived).
    MerchantTaxFee => "merchant_tax_fee",
    /// Merchant tax at cost value.
    MerchantTaxFeeCostValue => "merchant_tax_fee_cost_value",
    /// Central-bank FX correction of the merchant tax, never negative.
    MerchantTaxFeeCentralBankFx => "merchant_tax_fee_central_bank_fx",
    /// Method fee the platform pays its provider.
    PsMethodFee => "ps_method_fee",
    /// Method fee the merchant pays the platform.
    MerchantMethodFee => "merchant_method_fee",
    /// Method fee at system cost value.
    MerchantMethodFeeCostValue => "merchant_method_fee_cost_value",
    /// Markup between merchant and cost method fee (read-model derived).
    PsMarkupMerchantMethodFee => "ps_markup_merchant_method_fee",
    /// Fixed method fee at the merchant rate.
    MerchantMethodFixedFee => "merchant_method_fixed_fee",
    /// Fixed method fee at the system rate.
    RealMerchantMethodFixedFee => "real_merchant_method_fixed_fee",
    /// FX markup on the fixed method fee (read-model derived).
    MarkupMerchantMethodFixedFeeFx => "markup_merchant_method_fixed_fee_fx",
    /// Fixed method fee at system cost value.
    RealMerchantMethodFixedFeeCostValue => "real_merchant_method_fixed_fee_cost_value",
    /// Fixed-fee profit (read-model derived).
    PsMethodFixedFeeProfit => "ps_method_fixed_fee_profit",
    /// Fixed platform fee at the merchant rate.
    MerchantPsFixedFee => "merchant_ps_fixed_fee",
    /// Fixed platform fee at the system rate.
    RealMerchantPsFixedFee => "real_merchant_ps_fixed_fee",
    /// FX markup on the fixed platform fee (read-model derived).
    MarkupFixedFeeFx => "markup_fixed_fee_fx",
    /// Fixed-fee profit total (read-model derived).
    PsFixedFeeProfit => "ps_fixed_fee_profit",
    /// Method profit total (read-model derived).
    PsMethodProfit => "ps_method_profit",
    /// Merchant net revenue (read-model derived).
    MerchantNetRevenue => "merchant_net_revenue",
    /// Platform profit total (read-model derived).
    PsProfitTotal => "ps_profit_total",

    // Refund pipeline.
    /// Refunded value at the system rate.
    RealRefund => "real_refund",
    /// Prorated reversal of the original tax entry.
    RealRefundTaxFee => "real_refund_tax_fee",
    /// Refund fee at the system money-back percent.
    RealRefundFee => "real_refund_fee",
    /// Fixed refund fee at the system rate.
    RealRefundFixedFee => "real_refund_fixed_fee",
    /// Rate spread on the refunded value (read-model derived).
    PsMerchantRefundFx => "ps_merchant_refund_fx",
    /// Refunded value at the merchant rate.
    MerchantRefund => "merchant_refund",
    /// Markup on the refund rate spread (read-model derived).
    PsMarkupMerchantRefundFx => "ps_markup_merchant_refund_fx",
    /// Refund fee charged to the merchant, when merchant-paid.
    MerchantRefundFee => "merchant_refund_fee",
    /// Refund fee at system cost value (read-model derived).
    MerchantRefundFeeCostValue => "merchant_refund_fee_cost_value",
    /// Refund fee profit (read-model derived).
    PsMerchantRefundFeeProfit => "ps_merchant_refund_fee_profit",
    /// Fixed refund fee at system cost value, when merchant-paid.
    MerchantRefundFixedFeeCostValue => "merchant_refund_fixed_fee_cost_value",
    /// Fixed refund fee at the merchant rate, when merchant-paid.
    MerchantRefundFixedFee => "merchant_refund_fixed_fee",
    /// Fixed refund fee profit (read-model derived).
    PsMerchantRefundFixedFeeProfit => "ps_merchant_refund_fixed_fee_profit",
    /// Prorated reversal of merchant tax entries.
    ReverseTaxFee => "reverse_tax_fee",
    /// Positive remainder of the reversed tax FX correction.
    ReverseTaxFeeDelta => "reverse_tax_fee_delta",
    /// Negative remainder of the reversed tax FX correction, as magnitude.
    PsReverseTaxFeeDelta => "ps_reverse_tax_fee_delta",
    /// Merchant-side tax reversal (read-model derived).
    MerchantReverseTaxFee => "merchant_reverse_tax_fee",
    /// Merchant-side revenue reversal (read-model derived).
    MerchantReverseRevenue => "merchant_reverse_revenue",
    /// Refund profit total (read-model derived).
    PsRefundProfit => "ps_refund_profit",

    // Manual corrections.
    /// Rolling reserve withheld from the merchant.
    MerchantRollingReserveCreate => "merchant_rolling_reserve_create",
    /// Rolling reserve released back to the merchant.
    MerchantRollingReserveRelease => "merchant_rolling_reserve_release",
    /// Ad hoc correction of the merchant royalty.
    MerchantRoyaltyCorrection => "merchant_royalty_correction",
}

impl EntryType {
    /// Returns true for rolling-reserve movements, which trigger a merchant
    /// balance recompute after persistence.
    #[must_use]
    pub const fn is_rolling_reserve(self) -> bool {
        matches!(
            self,
            Self::MerchantRollingReserveCreate | Self::MerchantRollingReserveRelease
        )
    }

    /// Returns true for the tax kinds the correction batch job rewrites.
    #[must_use]
    pub const fn is_tax_kind(self) -> bool {
        matches!(self, Self::RealTaxFee | Self::RealRefundTaxFee)
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of record an entry originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A paid order.
    Order,
    /// A refund.
    Refund,
    /// A merchant (manual corrections without an order or refund).
    Merchant,
}

impl SourceType {
    /// Business name of the source type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Refund => "refund",
            Self::Merchant => "merchant",
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = AccountingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(Self::Order),
            "refund" => Ok(Self::Refund),
            "merchant" => Ok(Self::Merchant),
            _ => Err(AccountingError::UnknownSourceType(s.to_string())),
        }
    }
}

/// Reference to the record an entry was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySource {
    /// Kind of the originating record.
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Identifier of the originating record.
    pub id: String,
}

/// Lifecycle status of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Entry is available for balance and report aggregation.
    Available,
}

/// One immutable ledger line.
///
/// Entries are append-only: they are never updated or deleted in normal
/// flow. The tax correction batch job is the sole sanctioned exception, and
/// it only rewrites derived currency fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountingEntry {
    /// Unique identifier, generated at creation.
    pub id: EntryId,
    /// Constant tag, always [`ENTRY_OBJECT_TYPE`].
    pub object_type: String,
    /// Kind of this entry.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// The record this entry was derived from.
    pub source: EntrySource,
    /// Merchant the entry is attributed to.
    pub merchant_id: MerchantId,
    /// Country code the entry is attributed to; empty when merchant-scoped
    /// context carries no country.
    pub country: String,
    /// Operating company handling the transaction, when known.
    pub operating_company_id: Option<OperatingCompanyId>,
    /// Value in the merchant royalty currency.
    pub amount: Decimal,
    /// Merchant royalty currency.
    pub currency: String,
    /// Value before conversion; defaults to `amount` when no conversion
    /// took place.
    pub original_amount: Decimal,
    /// Currency before conversion; defaults to `currency`.
    pub original_currency: String,
    /// Value in the country's local/VAT-reporting currency.
    pub local_amount: Decimal,
    /// Local/VAT-reporting currency.
    pub local_currency: String,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Operator-supplied reason, manual corrections only.
    pub reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[test]
    fn test_catalog_is_closed() {
        for kind in EntryType::ALL {
            assert_eq!(EntryType::from_str(kind.as_str()).unwrap(), *kind);
        }
        assert!(matches!(
            EntryType::from_str("no_such_entry"),
            Err(AccountingError::UnknownEntryType(_))
        ));
    }

    #[test]
    fn test_catalog_size() {
        assert_eq!(EntryType::ALL.len(), 48);
    }

    #[test]
    fn test_serde_names_match_business_names() {
        let json = serde_json::to_string(&EntryType::PsGrossRevenueFx).unwrap();
        assert_eq!(json, "\"ps_gross_revenue_fx\"");
        let parsed: EntryType = serde_json::from_str("\"real_refund_tax_fee\"").unwrap();
        assert_eq!(parsed, EntryType::RealRefundTaxFee);
    }

    #[rstest]
    #[case("order", SourceType::Order)]
    #[case("refund", SourceType::Refund)]
    #[case("merchant", SourceType::Merchant)]
    fn test_source_type_parse(#[case] name: &str, #[case] expected: SourceType) {
        assert_eq!(SourceType::from_str(name).unwrap(), expected);
        assert_eq!(expected.as_str(), name);
    }

    #[test]
    fn test_source_type_rejects_unknown() {
        assert!(SourceType::from_str("invoice").is_err());
    }

    #[test]
    fn test_rolling_reserve_predicate() {
        assert!(EntryType::MerchantRollingReserveCreate.is_rolling_reserve());
        assert!(EntryType::MerchantRollingReserveRelease.is_rolling_reserve());
        assert!(!EntryType::RealGrossRevenue.is_rolling_reserve());
    }

    #[test]
    fn test_tax_kind_predicate() {
        assert!(EntryType::RealTaxFee.is_tax_kind());
        assert!(EntryType::RealRefundTaxFee.is_tax_kind());
        assert!(!EntryType::ReverseTaxFee.is_tax_kind());
    }
}
