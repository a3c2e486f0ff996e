//! Tax correction batch job.
//!
//! Recomputes persisted tax entries with rates pinned to the originating
//! order's close timestamp. Only derived currency fields are rewritten;
//! type, source and original values are untouched. Per-record failures do
//! not stop the pass: successes are bulk-written and the failures are
//! reported as one aggregate error.

use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use tally_shared::types::money::round_amount;
use tally_shared::types::{OrderId, RefundId};

use crate::entry::{AccountingEntry, EntryType, SourceType};
use crate::error::AccountingError;
use crate::exchange::ExchangeAdapter;
use crate::model::Order;
use crate::persistence::EntryStore;
use crate::repository::Repositories;

/// Offline maintenance pass over historical tax entries.
#[derive(Clone)]
pub struct TaxCorrectionJob {
    store: Arc<dyn EntryStore>,
    adapter: ExchangeAdapter,
    repos: Repositories,
    precision: u32,
}

impl TaxCorrectionJob {
    /// Creates the job over its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn EntryStore>,
        adapter: ExchangeAdapter,
        repos: Repositories,
        precision: u32,
    ) -> Self {
        Self {
            store,
            adapter,
            repos,
            precision,
        }
    }

    /// Runs the pass and returns the number of entries rewritten.
    ///
    /// When any record fails, the successes are still written back and the
    /// failures are aggregated into a single error.
    pub async fn run(&self) -> Result<usize, AccountingError> {
        let entries = self
            .store
            .find_by_types(&[EntryType::RealTaxFee, EntryType::RealRefundTaxFee])
            .await?;
        let total = entries.len();

        let mut updated = Vec::new();
        let mut failures = Vec::new();
        for entry in entries {
            let id = entry.id;
            match self.recompute(entry).await {
                Ok(entry) => updated.push(entry),
                Err(e) => {
                    warn!(entry = %id, error = %e, "tax entry recompute failed");
                    failures.push(format!("{id}: {e}"));
                }
            }
        }

        if !updated.is_empty() {
            self.store.update_batch(&updated).await?;
        }
        info!(
            total,
            rewritten = updated.len(),
            failed = failures.len(),
            "tax correction finished"
        );

        if failures.is_empty() {
            Ok(updated.len())
        } else {
            Err(AccountingError::TaxCorrectionFailed {
                failed: failures.len(),
                total,
                details: failures.join("; "),
            })
        }
    }

    async fn recompute(
        &self,
        mut entry: AccountingEntry,
    ) -> Result<AccountingEntry, AccountingError> {
        let order = self.order_for(&entry).await?;

        entry.amount = round_amount(
            self.adapter
                .ps_common_at(
                    &entry.original_currency,
                    &entry.currency,
                    entry.original_amount,
                    order.closed_at,
                )
                .await?,
            self.precision,
        );

        if !entry.local_currency.is_empty() {
            let country = self
                .repos
                .countries
                .find(&order.country_code)
                .await?
                .ok_or_else(|| AccountingError::CountryNotFound(order.country_code.clone()))?;
            entry.local_amount = round_amount(
                self.adapter
                    .cb_common_at(
                        &entry.original_currency,
                        &entry.local_currency,
                        entry.original_amount,
                        &country.vat_currency_rates_source,
                        order.closed_at,
                    )
                    .await?,
                self.precision,
            );
        }

        Ok(entry)
    }

    /// Resolves the order whose close timestamp pins the historical rate.
    async fn order_for(&self, entry: &AccountingEntry) -> Result<Order, AccountingError> {
        match entry.source.source_type {
            SourceType::Order => {
                let id = OrderId::from_str(&entry.source.id)
                    .map_err(|_| AccountingError::InvalidSourceId)?;
                self.repos
                    .orders
                    .find(id)
                    .await?
                    .ok_or(AccountingError::OrderNotFound(id))
            }
            SourceType::Refund => {
                let id = RefundId::from_str(&entry.source.id)
                    .map_err(|_| AccountingError::InvalidSourceId)?;
                let refund = self
                    .repos
                    .refunds
                    .find(id)
                    .await?
                    .ok_or(AccountingError::RefundNotFound(id))?;
                self.repos
                    .orders
                    .find(refund.original_order_id)
                    .await?
                    .ok_or(AccountingError::OrderNotFound(refund.original_order_id))
            }
            // Tax entries are never merchant-scoped.
            SourceType::Merchant => Err(AccountingError::InvalidSourceId),
        }
    }
}
