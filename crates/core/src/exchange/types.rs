//! Rate service contract and request types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tally_shared::types::MerchantId;

/// Exchange-rate regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    /// The platform's own rate.
    System,
    /// The rate contracted with a specific merchant.
    Merchant,
    /// Central-bank reference rate.
    CentralBank,
    /// Stock-market rate.
    Stock,
}

impl RateType {
    /// Business name of the regime.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Merchant => "merchant",
            Self::CentralBank => "central_bank",
            Self::Stock => "stock",
        }
    }
}

/// Conversion direction. Sell is the direction less favorable to the party
/// giving up the source currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateDirection {
    /// Buy the target currency.
    Buy,
    /// Sell the source currency.
    Sell,
}

/// One exchange request against the remote rate service.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeRequest {
    /// Source currency code.
    pub from: String,
    /// Target currency code.
    pub to: String,
    /// Amount in the source currency.
    pub amount: Decimal,
    /// Rate regime to apply.
    pub rate_type: RateType,
    /// Conversion direction.
    pub direction: RateDirection,
    /// Rate source for central-bank requests (from the country record).
    pub source: Option<String>,
    /// Merchant whose contracted rate applies, for merchant requests.
    pub merchant_id: Option<MerchantId>,
}

/// Failure reported by the rate service.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RateServiceError {
    /// Failure detail.
    pub message: String,
}

impl RateServiceError {
    /// Creates a new error with the given detail.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Remote currency-rate service.
///
/// Calls are blocking remote calls from the engine's point of view; retry
/// and backoff belong to the transport layer.
#[async_trait]
pub trait RateService: Send + Sync {
    /// Exchanges an amount at the current rate.
    async fn exchange(&self, req: &ExchangeRequest) -> Result<Decimal, RateServiceError>;

    /// Exchanges an amount at the rate effective at `at`.
    async fn exchange_at(
        &self,
        req: &ExchangeRequest,
        at: DateTime<Utc>,
    ) -> Result<Decimal, RateServiceError>;
}
