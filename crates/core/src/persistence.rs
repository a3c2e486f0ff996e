//! Entry persistence and post-write side effects.
//!
//! The batch insert of one event's entries is the only atomic write. The
//! downstream read-model and paylink statistics are recomputed afterwards
//! on a best-effort basis: their failures are returned to the caller but
//! never roll back the already-persisted entries.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use tally_shared::types::{MerchantId, OrderId, PaylinkId};

use crate::entry::{AccountingEntry, EntryType, SourceType};
use crate::error::AccountingError;
use crate::model::{MerchantBalance, Order};
use crate::repository::{OrderRepository, PaylinkRepository, PaylinkVisitRepository};

/// Append-only store of accounting entries.
///
/// `update_batch` exists solely for the tax correction batch job, which is
/// the one sanctioned mutation of persisted entries.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Returns true if any entry exists for the given source key.
    async fn exists_for_source(
        &self,
        object_type: &str,
        source_id: &str,
        source_type: SourceType,
    ) -> Result<bool, AccountingError>;

    /// Finds one entry by source key and kind.
    async fn find_by_source_and_type(
        &self,
        source_id: &str,
        source_type: SourceType,
        entry_type: EntryType,
    ) -> Result<Option<AccountingEntry>, AccountingError>;

    /// Finds all entries of the given kinds.
    async fn find_by_types(
        &self,
        types: &[EntryType],
    ) -> Result<Vec<AccountingEntry>, AccountingError>;

    /// Inserts a batch atomically: either every entry lands or none does.
    async fn insert_batch(&self, entries: &[AccountingEntry]) -> Result<(), AccountingError>;

    /// Rewrites existing entries in bulk (tax correction only).
    async fn update_batch(&self, entries: &[AccountingEntry]) -> Result<(), AccountingError>;
}

/// Downstream read-model recompute for orders.
#[async_trait]
pub trait OrderViewUpdater: Send + Sync {
    /// Recomputes the order read-model for the given orders.
    async fn recalculate(&self, order_ids: &[OrderId]) -> Result<(), AccountingError>;
}

/// Merchant balance aggregator, recomputed after rolling-reserve movements.
#[async_trait]
pub trait MerchantBalanceRecalculator: Send + Sync {
    /// Recomputes the merchant balance in the given currency.
    async fn recalculate(
        &self,
        merchant_id: MerchantId,
        currency: &str,
    ) -> Result<MerchantBalance, AccountingError>;
}

/// Writes an event's entry batch and triggers the downstream recomputes.
#[derive(Clone)]
pub struct EntryPersister {
    store: Arc<dyn EntryStore>,
    views: Arc<dyn OrderViewUpdater>,
    orders: Arc<dyn OrderRepository>,
    paylinks: Arc<dyn PaylinkRepository>,
    paylink_visits: Arc<dyn PaylinkVisitRepository>,
}

impl EntryPersister {
    /// Creates a persister over the given store and collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn EntryStore>,
        views: Arc<dyn OrderViewUpdater>,
        orders: Arc<dyn OrderRepository>,
        paylinks: Arc<dyn PaylinkRepository>,
        paylink_visits: Arc<dyn PaylinkVisitRepository>,
    ) -> Self {
        Self {
            store,
            views,
            orders,
            paylinks,
            paylink_visits,
        }
    }

    /// Persists the batch, then recomputes read models for the affected
    /// orders.
    ///
    /// An insert failure aborts before any side effect runs. Side-effect
    /// failures are returned but the entries stay persisted.
    pub async fn persist(
        &self,
        entries: &[AccountingEntry],
        affected_orders: &[&Order],
    ) -> Result<(), AccountingError> {
        if entries.is_empty() {
            return Ok(());
        }

        self.store.insert_batch(entries).await?;
        debug!(count = entries.len(), "persisted accounting entry batch");

        self.run_side_effects(affected_orders).await
    }

    async fn run_side_effects(&self, affected_orders: &[&Order]) -> Result<(), AccountingError> {
        let order_ids: Vec<OrderId> = affected_orders.iter().map(|o| o.id).collect();
        if !order_ids.is_empty() {
            if let Err(e) = self.views.recalculate(&order_ids).await {
                warn!(error = %e, "order read-model recompute failed after persist");
                return Err(e);
            }
        }

        for order in affected_orders {
            if let Some(paylink_id) = order.paylink_id {
                if let Err(e) = self.refresh_paylink(paylink_id).await {
                    warn!(paylink = %paylink_id, error = %e, "paylink statistics recompute failed");
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Recomputes a paylink's visit count and sales/returns aggregates.
    async fn refresh_paylink(&self, paylink_id: PaylinkId) -> Result<(), AccountingError> {
        let Some(mut paylink) = self.paylinks.find(paylink_id).await? else {
            // A dangling attribution is not an error of this event.
            warn!(paylink = %paylink_id, "order attributed to unknown paylink");
            return Ok(());
        };

        let summary = self.orders.paylink_sales_summary(paylink_id).await?;
        paylink.visits = self.paylink_visits.count(paylink_id).await?;
        paylink.total_transactions = summary.total_transactions;
        paylink.sales_count = summary.sales_count;
        paylink.returns_count = summary.returns_count;
        paylink.gross_sales_amount = summary.gross_sales_amount;
        paylink.gross_returns_amount = summary.gross_returns_amount;
        paylink.gross_total_amount = summary.gross_total();

        self.paylinks.save(&paylink).await
    }
}
