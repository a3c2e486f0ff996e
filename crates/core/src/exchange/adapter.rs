//! The four fixed exchange operation shapes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error};

use tally_shared::types::MerchantId;

use super::types::{ExchangeRequest, RateDirection, RateService, RateType};
use crate::error::AccountingError;

/// Adapter exposing the fixed operation shapes over the rate service.
#[derive(Clone)]
pub struct ExchangeAdapter {
    rates: Arc<dyn RateService>,
}

impl ExchangeAdapter {
    /// Creates an adapter over the given rate service.
    #[must_use]
    pub fn new(rates: Arc<dyn RateService>) -> Self {
        Self { rates }
    }

    /// System rate, buy direction.
    pub async fn ps_current_common(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<Decimal, AccountingError> {
        self.convert(
            self.request(from, to, amount, RateType::System, RateDirection::Buy),
            None,
        )
        .await
    }

    /// System rate, buy direction, pinned to a historical moment.
    pub async fn ps_common_at(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Decimal, AccountingError> {
        self.convert(
            self.request(from, to, amount, RateType::System, RateDirection::Buy),
            Some(at),
        )
        .await
    }

    /// Merchant rate, sell direction — deliberately the direction less
    /// favorable to the merchant.
    pub async fn ps_current_merchant(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
        merchant_id: MerchantId,
    ) -> Result<Decimal, AccountingError> {
        let mut req = self.request(from, to, amount, RateType::Merchant, RateDirection::Sell);
        req.merchant_id = Some(merchant_id);
        self.convert(req, None).await
    }

    /// Central-bank rate, sell direction, with the country's rate source.
    pub async fn cb_current_common(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
        rates_source: &str,
    ) -> Result<Decimal, AccountingError> {
        let mut req = self.request(from, to, amount, RateType::CentralBank, RateDirection::Sell);
        req.source = Some(rates_source.to_string());
        self.convert(req, None).await
    }

    /// Central-bank rate pinned to a historical moment.
    pub async fn cb_common_at(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
        rates_source: &str,
        at: DateTime<Utc>,
    ) -> Result<Decimal, AccountingError> {
        let mut req = self.request(from, to, amount, RateType::CentralBank, RateDirection::Sell);
        req.source = Some(rates_source.to_string());
        self.convert(req, Some(at)).await
    }

    /// Stock-market rate, sell direction.
    pub async fn stock_current_common(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<Decimal, AccountingError> {
        self.convert(
            self.request(from, to, amount, RateType::Stock, RateDirection::Sell),
            None,
        )
        .await
    }

    fn request(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
        rate_type: RateType,
        direction: RateDirection,
    ) -> ExchangeRequest {
        ExchangeRequest {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            rate_type,
            direction,
            source: None,
            merchant_id: None,
        }
    }

    async fn convert(
        &self,
        req: ExchangeRequest,
        at: Option<DateTime<Utc>>,
    ) -> Result<Decimal, AccountingError> {
        // Identity and zero conversions never hit the remote service.
        if req.from == req.to || req.amount.is_zero() {
            return Ok(req.amount);
        }

        debug!(
            from = %req.from,
            to = %req.to,
            amount = %req.amount,
            rate_type = req.rate_type.as_str(),
            pinned = at.is_some(),
            "exchanging amount"
        );

        let result = match at {
            Some(at) => self.rates.exchange_at(&req, at).await,
            None => self.rates.exchange(&req).await,
        };

        result.map_err(|e| {
            error!(
                from = %req.from,
                to = %req.to,
                amount = %req.amount,
                rate_type = req.rate_type.as_str(),
                direction = ?req.direction,
                source = ?req.source,
                merchant_id = ?req.merchant_id,
                error = %e,
                "currency exchange failed"
            );
            AccountingError::ExchangeFailed {
                from: req.from.clone(),
                to: req.to.clone(),
                rate_type: req.rate_type.as_str().to_string(),
                message: e.to_string(),
            }
        })
    }
}
