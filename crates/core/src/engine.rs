//! Engine facade.
//!
//! Wires the pipelines, the idempotency guard, the validator and the
//! persister over the host-provided collaborators, and exposes the three
//! public operations: event handling, manual corrections and the tax
//! correction batch job.

use std::sync::Arc;
use tracing::{debug, warn};

use tally_shared::config::EngineConfig;

use crate::entry::{AccountingEntry, EntryValidator};
use crate::error::AccountingError;
use crate::exchange::{ExchangeAdapter, RateService};
use crate::idempotency::IdempotencyGuard;
use crate::model::{Order, Refund};
use crate::persistence::{EntryPersister, EntryStore, MerchantBalanceRecalculator, OrderViewUpdater};
use crate::pipeline::{
    BillingEvent, CorrectionPipeline, CorrectionRequest, CorrectionTarget, PaymentPipeline,
    RefundPipeline,
};
use crate::repository::Repositories;
use crate::tax_correction::TaxCorrectionJob;

/// Response envelope for manual correction requests.
///
/// Corrections translate internal errors into a status/message pair;
/// payment and refund notifications propagate raw errors instead so the
/// caller's lifecycle manager can decide on retries.
#[derive(Debug, Clone)]
pub struct CorrectionResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Business error code and detail, or "ok".
    pub message: String,
    /// The created entry, on success.
    pub entry: Option<AccountingEntry>,
}

/// The accounting entry engine.
pub struct AccountingEngine {
    payment: PaymentPipeline,
    refund: RefundPipeline,
    correction: CorrectionPipeline,
    persister: EntryPersister,
    tax_correction: TaxCorrectionJob,
    balances: Arc<dyn MerchantBalanceRecalculator>,
    repos: Repositories,
}

impl AccountingEngine {
    /// Wires the engine over the host-provided collaborators.
    #[must_use]
    pub fn new(
        config: &EngineConfig,
        rates: Arc<dyn RateService>,
        repos: Repositories,
        store: Arc<dyn EntryStore>,
        views: Arc<dyn OrderViewUpdater>,
        balances: Arc<dyn MerchantBalanceRecalculator>,
    ) -> Self {
        let adapter = ExchangeAdapter::new(rates);
        let validator =
            EntryValidator::new(adapter.clone(), repos.price_groups.clone(), config.precision);
        let guard = IdempotencyGuard::new(store.clone(), config.duplicate_policy);
        let persister = EntryPersister::new(
            store.clone(),
            views,
            repos.orders.clone(),
            repos.paylinks.clone(),
            repos.paylink_visits.clone(),
        );

        Self {
            payment: PaymentPipeline::new(
                adapter.clone(),
                validator.clone(),
                repos.clone(),
                guard.clone(),
            ),
            refund: RefundPipeline::new(
                adapter.clone(),
                validator.clone(),
                repos.clone(),
                guard,
                store.clone(),
            ),
            correction: CorrectionPipeline::new(validator, repos.clone()),
            tax_correction: TaxCorrectionJob::new(store, adapter, repos.clone(), config.precision),
            persister,
            balances,
            repos,
        }
    }

    /// Routes one billing event to its pipeline and persists the result.
    pub async fn handle_event(&self, event: BillingEvent) -> Result<(), AccountingError> {
        match event {
            BillingEvent::Payment(order) => self.handle_payment(&order).await,
            BillingEvent::Refund { refund, order } => self.handle_refund(&refund, &order).await,
            BillingEvent::Correction(req) => self.apply_correction(&req).await.map(|_| ()),
        }
    }

    /// Posts a manual correction, translating failures into a response
    /// envelope.
    pub async fn create_correction(&self, req: CorrectionRequest) -> CorrectionResponse {
        match self.apply_correction(&req).await {
            Ok(entry) => CorrectionResponse {
                status: 200,
                message: "ok".to_string(),
                entry: Some(entry),
            },
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "manual correction failed");
                CorrectionResponse {
                    status: e.http_status_code(),
                    message: format!("{}: {e}", e.error_code()),
                    entry: None,
                }
            }
        }
    }

    /// Runs the tax correction batch job.
    pub async fn run_tax_correction(&self) -> Result<usize, AccountingError> {
        self.tax_correction.run().await
    }

    async fn handle_payment(&self, order: &Order) -> Result<(), AccountingError> {
        if !order.public_status.allows_accounting() {
            debug!(order = %order.id, status = ?order.public_status, "status outside accounting, skipping");
            return Ok(());
        }
        let entries = self.payment.run(order).await?;
        self.persister.persist(&entries, &[order]).await
    }

    async fn handle_refund(&self, refund: &Refund, order: &Order) -> Result<(), AccountingError> {
        if !order.public_status.allows_accounting() {
            debug!(refund = %refund.id, order = %order.id, status = ?order.public_status, "status outside accounting, skipping");
            return Ok(());
        }
        let entries = self.refund.run(refund, order).await?;
        // The original order's read model absorbs the refund entries.
        self.persister.persist(&entries, &[order]).await
    }

    async fn apply_correction(
        &self,
        req: &CorrectionRequest,
    ) -> Result<AccountingEntry, AccountingError> {
        let entry = self.correction.run(req).await?;

        let affected = self.affected_order(req).await?;
        let affected_refs: Vec<&Order> = affected.iter().collect();
        self.persister
            .persist(std::slice::from_ref(&entry), &affected_refs)
            .await?;

        if entry.entry_type.is_rolling_reserve() {
            self.balances
                .recalculate(entry.merchant_id, &entry.currency)
                .await?;
        }
        Ok(entry)
    }

    async fn affected_order(
        &self,
        req: &CorrectionRequest,
    ) -> Result<Option<Order>, AccountingError> {
        let order_id = match req.target {
            CorrectionTarget::Order(id) => id,
            CorrectionTarget::Refund(id) => {
                let refund = self
                    .repos
                    .refunds
                    .find(id)
                    .await?
                    .ok_or(AccountingError::RefundNotFound(id))?;
                refund.original_order_id
            }
            CorrectionTarget::Merchant(_) => return Ok(None),
        };
        self.repos.orders.find(order_id).await
    }
}
