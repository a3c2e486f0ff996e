//! Manual correction pipeline.
//!
//! Posts one operator-issued entry. The declared entry type is checked
//! against the catalog before any repository lookup runs.

use std::str::FromStr;
use tracing::debug;

use crate::entry::factory::{EntryFactory, EntryScope};
use crate::entry::{AccountingEntry, EntryType, EntryValidator};
use crate::error::AccountingError;
use crate::model::Country;
use crate::pipeline::event::{CorrectionRequest, CorrectionTarget};
use crate::repository::Repositories;

/// Builds a single correction entry from an operator request.
#[derive(Clone)]
pub struct CorrectionPipeline {
    validator: EntryValidator,
    repos: Repositories,
}

impl CorrectionPipeline {
    /// Creates the pipeline over its collaborators.
    #[must_use]
    pub fn new(validator: EntryValidator, repos: Repositories) -> Self {
        Self { validator, repos }
    }

    /// Builds and normalizes the correction entry.
    pub async fn run(&self, req: &CorrectionRequest) -> Result<AccountingEntry, AccountingError> {
        // Reject unknown kinds before touching any repository.
        let entry_type = EntryType::from_str(&req.entry_type)?;

        let mut entry = self.scoped_blank(req, entry_type).await?;
        entry.amount = req.amount;
        entry.currency = req.currency.clone();
        entry.reason = req.reason.clone();
        if let Some(date) = req.date {
            entry.created_at = date;
        }

        let country = self.country_for(&entry).await?;
        let mut batch = Vec::new();
        self.validator
            .push(entry, country.as_ref(), &mut batch)
            .await?;

        // push appends exactly the one entry it was given.
        let entry = batch.remove(0);
        debug!(
            entry_type = %entry.entry_type,
            source = entry.source.source_type.as_str(),
            merchant = %entry.merchant_id,
            "manual correction built"
        );
        Ok(entry)
    }

    async fn scoped_blank(
        &self,
        req: &CorrectionRequest,
        entry_type: EntryType,
    ) -> Result<AccountingEntry, AccountingError> {
        match req.target {
            CorrectionTarget::Order(id) => {
                let order = self
                    .repos
                    .orders
                    .find(id)
                    .await?
                    .ok_or(AccountingError::OrderNotFound(id))?;
                Ok(EntryFactory::blank(&EntryScope::Order(&order), entry_type))
            }
            CorrectionTarget::Refund(id) => {
                let refund = self
                    .repos
                    .refunds
                    .find(id)
                    .await?
                    .ok_or(AccountingError::RefundNotFound(id))?;
                let order = self
                    .repos
                    .orders
                    .find(refund.original_order_id)
                    .await?
                    .ok_or(AccountingError::OrderNotFound(refund.original_order_id))?;
                Ok(EntryFactory::blank(
                    &EntryScope::Refund {
                        refund: &refund,
                        order: &order,
                    },
                    entry_type,
                ))
            }
            CorrectionTarget::Merchant(id) => {
                let merchant = self
                    .repos
                    .merchants
                    .find(id)
                    .await?
                    .ok_or(AccountingError::MerchantNotFound(id))?;
                let country = req.country.as_deref().unwrap_or_default();
                Ok(EntryFactory::blank(
                    &EntryScope::Merchant {
                        merchant: &merchant,
                        country,
                    },
                    entry_type,
                ))
            }
        }
    }

    /// The country in scope for local-value computation; merchant-scoped
    /// corrections without a country skip it.
    async fn country_for(
        &self,
        entry: &AccountingEntry,
    ) -> Result<Option<Country>, AccountingError> {
        if entry.country.is_empty() {
            return Ok(None);
        }
        let country = self
            .repos
            .countries
            .find(&entry.country)
            .await?
            .ok_or_else(|| AccountingError::CountryNotFound(entry.country.clone()))?;
        Ok(Some(country))
    }
}
