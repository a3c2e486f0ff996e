//! HTTP client implementation of the rate service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use tally_shared::config::RateServiceConfig;

use super::types::{ExchangeRequest, RateService, RateServiceError};

/// Wire request for the rate service.
#[derive(Debug, Serialize)]
struct ExchangeBody<'a> {
    #[serde(flatten)]
    request: &'a ExchangeRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    datetime: Option<DateTime<Utc>>,
}

/// Wire response from the rate service.
#[derive(Debug, Deserialize)]
struct ExchangeReply {
    exchanged_amount: Decimal,
}

/// Rate service speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRateService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateService {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &RateServiceConfig) -> Result<Self, RateServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RateServiceError::new(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post(
        &self,
        req: &ExchangeRequest,
        at: Option<DateTime<Utc>>,
    ) -> Result<Decimal, RateServiceError> {
        let url = format!("{}/exchange", self.base_url);
        let body = ExchangeBody {
            request: req,
            datetime: at,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RateServiceError::new(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RateServiceError::new(format!(
                "rate service returned {}",
                response.status()
            )));
        }

        let reply: ExchangeReply = response
            .json()
            .await
            .map_err(|e| RateServiceError::new(e.to_string()))?;

        Ok(reply.exchanged_amount)
    }
}

#[async_trait]
impl RateService for HttpRateService {
    async fn exchange(&self, req: &ExchangeRequest) -> Result<Decimal, RateServiceError> {
        self.post(req, None).await
    }

    async fn exchange_at(
        &self,
        req: &ExchangeRequest,
        at: DateTime<Utc>,
    ) -> Result<Decimal, RateServiceError> {
        self.post(req, Some(at)).await
    }
}
