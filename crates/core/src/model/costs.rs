//! Commission cost sheets for payment methods and money-back operations.
//!
//! Two sheets exist per concern: the system sheet (what the platform pays
//! its providers) and the merchant sheet (what the merchant pays the
//! platform). Lookups are keyed by payment method name, region, country,
//! MCC code and, for system sheets, operating company.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{MerchantId, OperatingCompanyId};

/// Reason code selecting the money-back cost line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostReason {
    /// Voluntary refund issued by the merchant.
    Reversal,
    /// Refund forced by a chargeback.
    Chargeback,
}

impl CostReason {
    /// Business name of the reason, as stored in the cost sheets.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reversal => "reversal",
            Self::Chargeback => "chargeback",
        }
    }
}

/// System-wide payment channel cost line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentChannelCostSystem {
    /// Payment method name.
    pub name: String,
    /// Region the line applies to.
    pub region: String,
    /// Country the line applies to.
    pub country: String,
    /// Merchant category code.
    pub mcc_code: String,
    /// Operating company the line applies to.
    pub operating_company_id: OperatingCompanyId,
    /// Method fee as a fraction of gross revenue.
    pub percent: Decimal,
    /// Fixed fee per transaction.
    pub fix_amount: Decimal,
    /// Currency of the fixed fee.
    pub fix_amount_currency: String,
}

/// Merchant-specific payment channel cost line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentChannelCostMerchant {
    /// Merchant the line belongs to.
    pub merchant_id: MerchantId,
    /// Payment method name.
    pub name: String,
    /// Merchant payout currency the line applies to.
    pub payout_currency: String,
    /// Region the line applies to.
    pub region: String,
    /// Country the line applies to.
    pub country: String,
    /// Merchant category code.
    pub mcc_code: String,
    /// Method fee as a fraction of gross revenue.
    pub method_percent: Decimal,
    /// Fixed method fee per transaction.
    pub method_fix_amount: Decimal,
    /// Currency of the fixed method fee.
    pub method_fix_amount_currency: String,
    /// Fixed platform fee per transaction.
    pub ps_fixed_fee: Decimal,
    /// Currency of the fixed platform fee.
    pub ps_fixed_fee_currency: String,
}

/// System-wide money-back cost line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyBackCostSystem {
    /// Payment method name.
    pub name: String,
    /// Reason this line prices.
    pub undo_reason: CostReason,
    /// Region the line applies to.
    pub region: String,
    /// Country the line applies to.
    pub country: String,
    /// Merchant category code.
    pub mcc_code: String,
    /// Operating company the line applies to.
    pub operating_company_id: OperatingCompanyId,
    /// Refund fee as a fraction of the refunded value.
    pub percent: Decimal,
    /// Fixed refund fee.
    pub fix_amount: Decimal,
    /// Currency of the fixed refund fee.
    pub fix_amount_currency: String,
}

/// Merchant-specific money-back cost line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyBackCostMerchant {
    /// Merchant the line belongs to.
    pub merchant_id: MerchantId,
    /// Payment method name.
    pub name: String,
    /// Reason this line prices.
    pub undo_reason: CostReason,
    /// Region the line applies to.
    pub region: String,
    /// Country the line applies to.
    pub country: String,
    /// Merchant category code.
    pub mcc_code: String,
    /// Refund fee as a fraction of the refunded value.
    pub percent: Decimal,
    /// Fixed refund fee.
    pub fix_amount: Decimal,
    /// Currency of the fixed refund fee.
    pub fix_amount_currency: String,
    /// True when the merchant, not the platform, pays refund fees.
    pub is_paid_by_merchant: bool,
}
