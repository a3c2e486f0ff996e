//! Resolved state threaded through pipeline steps.

use crate::entry::AccountingEntry;
use crate::error::AccountingError;
use crate::model::{Country, Order, PriceGroup};
use crate::repository::{CostLookup, Repositories};

/// The order, its country and price group, and the growing entry batch.
///
/// Steps receive this by mutable reference and only ever append; earlier
/// entries are never mutated by later steps.
pub struct PipelineContext {
    /// The order the event is for.
    pub order: Order,
    /// The order's country.
    pub country: Country,
    /// The country's price group.
    pub price_group: PriceGroup,
    /// Entries buffered so far, in derivation order.
    pub entries: Vec<AccountingEntry>,
}

impl PipelineContext {
    /// Resolves the country and price group for the order.
    pub async fn resolve(order: Order, repos: &Repositories) -> Result<Self, AccountingError> {
        let country = repos
            .countries
            .find(&order.country_code)
            .await?
            .ok_or_else(|| AccountingError::CountryNotFound(order.country_code.clone()))?;
        let price_group = repos
            .price_groups
            .find(country.price_group_id)
            .await?
            .ok_or_else(|| AccountingError::PriceGroupNotFound(country.iso_code.clone()))?;

        Ok(Self {
            order,
            country,
            price_group,
            entries: Vec::new(),
        })
    }

    /// Commission lookup key for this order.
    #[must_use]
    pub fn cost_lookup(&self) -> CostLookup<'_> {
        CostLookup {
            method: &self.order.payment_method_name,
            region: &self.price_group.region,
            country: &self.order.country_code,
            mcc_code: &self.order.mcc_code,
        }
    }

    /// `CommissionNotFound` for this order's lookup key.
    #[must_use]
    pub fn commission_not_found(&self) -> AccountingError {
        AccountingError::CommissionNotFound {
            method: self.order.payment_method_name.clone(),
            country: self.order.country_code.clone(),
        }
    }
}
