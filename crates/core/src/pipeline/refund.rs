//! Refund pipeline.
//!
//! Reverses a prorated share of the original order's entries and posts the
//! refund fees. The proration factor is computed against the full original
//! charge; earlier partial refunds on the same order are not subtracted,
//! which can drift the reversal across multiple partials.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

use tally_shared::types::money::take_percent;

use crate::entry::factory::{EntryFactory, EntryScope};
use crate::entry::{AccountingEntry, EntryType, EntryValidator, SourceType};
use crate::error::AccountingError;
use crate::exchange::ExchangeAdapter;
use crate::idempotency::IdempotencyGuard;
use crate::model::{CostReason, MoneyBackCostMerchant, MoneyBackCostSystem, Order, Refund};
use crate::persistence::EntryStore;
use crate::pipeline::context::PipelineContext;
use crate::repository::Repositories;

/// Ordered derivation of refund entries for one confirmed refund.
#[derive(Clone)]
pub struct RefundPipeline {
    adapter: ExchangeAdapter,
    validator: EntryValidator,
    repos: Repositories,
    guard: IdempotencyGuard,
    store: Arc<dyn EntryStore>,
}

impl RefundPipeline {
    /// Creates the pipeline over its collaborators. The store is read for
    /// the original order's tax entries.
    #[must_use]
    pub fn new(
        adapter: ExchangeAdapter,
        validator: EntryValidator,
        repos: Repositories,
        guard: IdempotencyGuard,
        store: Arc<dyn EntryStore>,
    ) -> Self {
        Self {
            adapter,
            validator,
            repos,
            guard,
            store,
        }
    }

    /// Runs the pipeline and returns the buffered batch.
    pub async fn run(
        &self,
        refund: &Refund,
        order: &Order,
    ) -> Result<Vec<AccountingEntry>, AccountingError> {
        self.guard
            .ensure_first_run(&refund.id.to_string(), SourceType::Refund)
            .await?;

        // A zero-charge order cannot absorb any refund; dividing by it
        // would also panic in Decimal arithmetic.
        if order.charge_amount.is_zero() {
            return Err(AccountingError::RefundExceedsOrderAmount {
                refund: refund.amount,
                charge: order.charge_amount,
            });
        }
        let correction = refund.amount / order.charge_amount;
        if correction > Decimal::ONE {
            return Err(AccountingError::RefundExceedsOrderAmount {
                refund: refund.amount,
                charge: order.charge_amount,
            });
        }
        let reason = if refund.is_chargeback {
            CostReason::Chargeback
        } else {
            CostReason::Reversal
        };

        let mut ctx = PipelineContext::resolve(order.clone(), &self.repos).await?;

        let real_refund = self.refund_value(&mut ctx, refund).await?;
        self.refund_tax_fee(&mut ctx, refund, correction).await?;

        let (system_costs, merchant_costs) = self.money_back_costs(&ctx, reason).await?;
        self.system_fees(&mut ctx, refund, real_refund, &system_costs)
            .await?;

        let merchant_refund = self.merchant_refund(&mut ctx, refund).await?;
        self.merchant_fees(&mut ctx, refund, merchant_refund, &merchant_costs)
            .await?;

        let original_fx = self.reverse_tax_fee(&mut ctx, refund, correction).await?;
        self.reverse_tax_deltas(&mut ctx, refund, merchant_refund, original_fx)
            .await?;

        debug!(
            refund = %refund.id,
            order = %ctx.order.id,
            reason = reason.as_str(),
            entries = ctx.entries.len(),
            "refund pipeline complete"
        );
        Ok(ctx.entries)
    }

    async fn push(
        &self,
        ctx: &mut PipelineContext,
        entry: AccountingEntry,
    ) -> Result<(), AccountingError> {
        self.validator
            .push(entry, Some(&ctx.country), &mut ctx.entries)
            .await
    }

    /// Reads back one of the original order's persisted entries.
    async fn original_entry(
        &self,
        ctx: &PipelineContext,
        entry_type: EntryType,
    ) -> Result<AccountingEntry, AccountingError> {
        self.store
            .find_by_source_and_type(&ctx.order.id.to_string(), SourceType::Order, entry_type)
            .await?
            .ok_or(AccountingError::OriginalTaxNotFound(ctx.order.id))
    }

    /// `RealRefund`: the refunded value converted at the system rate.
    async fn refund_value(
        &self,
        ctx: &mut PipelineContext,
        refund: &Refund,
    ) -> Result<Decimal, AccountingError> {
        let amount = self
            .adapter
            .ps_current_common(&refund.currency, &ctx.order.royalty_currency, refund.amount)
            .await?;

        let mut entry = self.blank(ctx, refund, EntryType::RealRefund);
        entry.amount = amount;
        entry.original_amount = refund.amount;
        entry.original_currency = refund.currency.clone();
        self.push(ctx, entry).await?;
        Ok(amount)
    }

    /// `RealRefundTaxFee`: the original order's tax entry, prorated.
    ///
    /// Local fields are copied proportionally, except for VAT-deduction
    /// orders where they are recomputed fresh by the validator.
    async fn refund_tax_fee(
        &self,
        ctx: &mut PipelineContext,
        refund: &Refund,
        correction: Decimal,
    ) -> Result<(), AccountingError> {
        let original = self.original_entry(ctx, EntryType::RealTaxFee).await?;

        let mut entry = self.blank(ctx, refund, EntryType::RealRefundTaxFee);
        entry.amount = original.amount * correction;
        entry.original_amount = original.original_amount * correction;
        entry.original_currency = original.original_currency.clone();
        if !ctx.order.vat_deduction {
            entry.local_amount = original.local_amount * correction;
            entry.local_currency = original.local_currency.clone();
        }
        self.push(ctx, entry).await
    }

    /// Resolves both money-back cost sheets; a missing line is fatal.
    async fn money_back_costs(
        &self,
        ctx: &PipelineContext,
        reason: CostReason,
    ) -> Result<(MoneyBackCostSystem, MoneyBackCostMerchant), AccountingError> {
        let key = ctx.cost_lookup();
        let system = self
            .repos
            .money_back_system
            .find(&key, reason, ctx.order.operating_company_id)
            .await?
            .ok_or_else(|| ctx.commission_not_found())?;
        let merchant = self
            .repos
            .money_back_merchant
            .find(ctx.order.merchant_id, &key, reason)
            .await?
            .ok_or_else(|| ctx.commission_not_found())?;
        Ok((system, merchant))
    }

    /// `RealRefundFee` / `RealRefundFixedFee`: system money-back costs.
    async fn system_fees(
        &self,
        ctx: &mut PipelineContext,
        refund: &Refund,
        real_refund: Decimal,
        costs: &MoneyBackCostSystem,
    ) -> Result<(), AccountingError> {
        let mut entry = self.blank(ctx, refund, EntryType::RealRefundFee);
        entry.amount = take_percent(real_refund, costs.percent);
        self.push(ctx, entry).await?;

        let fixed = self
            .adapter
            .ps_current_common(
                &costs.fix_amount_currency,
                &ctx.order.royalty_currency,
                costs.fix_amount,
            )
            .await?;
        let mut entry = self.blank(ctx, refund, EntryType::RealRefundFixedFee);
        entry.amount = fixed;
        entry.original_amount = costs.fix_amount;
        entry.original_currency = costs.fix_amount_currency.clone();
        self.push(ctx, entry).await
    }

    /// `MerchantRefund`: the refunded value converted at the merchant rate.
    async fn merchant_refund(
        &self,
        ctx: &mut PipelineContext,
        refund: &Refund,
    ) -> Result<Decimal, AccountingError> {
        let amount = self
            .adapter
            .ps_current_merchant(
                &refund.currency,
                &ctx.order.royalty_currency,
                refund.amount,
                ctx.order.merchant_id,
            )
            .await?;

        let mut entry = self.blank(ctx, refund, EntryType::MerchantRefund);
        entry.amount = amount;
        entry.original_amount = refund.amount;
        entry.original_currency = refund.currency.clone();
        self.push(ctx, entry).await?;
        Ok(amount)
    }

    /// Merchant-paid refund fees. The three entries are always persisted;
    /// their value is zero when the platform absorbs the fee.
    async fn merchant_fees(
        &self,
        ctx: &mut PipelineContext,
        refund: &Refund,
        merchant_refund: Decimal,
        costs: &MoneyBackCostMerchant,
    ) -> Result<(), AccountingError> {
        let mut entry = self.blank(ctx, refund, EntryType::MerchantRefundFee);
        if costs.is_paid_by_merchant {
            entry.amount = take_percent(merchant_refund, costs.percent);
        }
        self.push(ctx, entry).await?;

        let mut cost_value = self.blank(ctx, refund, EntryType::MerchantRefundFixedFeeCostValue);
        let mut fixed = self.blank(ctx, refund, EntryType::MerchantRefundFixedFee);
        if costs.is_paid_by_merchant {
            cost_value.amount = self
                .adapter
                .ps_current_common(
                    &costs.fix_amount_currency,
                    &ctx.order.royalty_currency,
                    costs.fix_amount,
                )
                .await?;
            cost_value.original_amount = costs.fix_amount;
            cost_value.original_currency = costs.fix_amount_currency.clone();

            fixed.amount = self
                .adapter
                .ps_current_merchant(
                    &costs.fix_amount_currency,
                    &ctx.order.royalty_currency,
                    costs.fix_amount,
                    ctx.order.merchant_id,
                )
                .await?;
            fixed.original_amount = costs.fix_amount;
            fixed.original_currency = costs.fix_amount_currency.clone();
        }
        self.push(ctx, cost_value).await?;
        self.push(ctx, fixed).await
    }

    /// `ReverseTaxFee`: VAT-enabled countries only. The original order's
    /// merchant tax entries, summed and prorated. Returns the original FX
    /// entry for the delta step.
    async fn reverse_tax_fee(
        &self,
        ctx: &mut PipelineContext,
        refund: &Refund,
        correction: Decimal,
    ) -> Result<Option<AccountingEntry>, AccountingError> {
        if !ctx.country.vat_enabled {
            return Ok(None);
        }

        let cost = self
            .original_entry(ctx, EntryType::MerchantTaxFeeCostValue)
            .await?;
        let fx = self
            .original_entry(ctx, EntryType::MerchantTaxFeeCentralBankFx)
            .await?;

        let mut entry = self.blank(ctx, refund, EntryType::ReverseTaxFee);
        entry.amount = (cost.amount + fx.amount) * correction;
        entry.original_amount = (cost.original_amount + fx.original_amount) * correction;
        entry.original_currency = cost.original_currency.clone();
        entry.local_amount = (cost.local_amount + fx.local_amount) * correction;
        entry.local_currency = cost.local_currency.clone();
        self.push(ctx, entry).await?;
        Ok(Some(fx))
    }

    /// `ReverseTaxFeeDelta` / `PsReverseTaxFeeDelta`: the remainder between
    /// the original FX correction and the one implied by the refund.
    ///
    /// Skipped entirely unless VAT is enabled and the original FX value was
    /// strictly positive. When computed, both entries are persisted; the
    /// branch that does not apply carries zero.
    async fn reverse_tax_deltas(
        &self,
        ctx: &mut PipelineContext,
        refund: &Refund,
        merchant_refund: Decimal,
        original_fx: Option<AccountingEntry>,
    ) -> Result<(), AccountingError> {
        let Some(original_fx) = original_fx else {
            return Ok(());
        };
        if original_fx.amount <= Decimal::ZERO {
            return Ok(());
        }
        let vat_currency = ctx
            .country
            .vat_currency
            .clone()
            .ok_or_else(|| AccountingError::VatCurrencyNotSet(ctx.country.iso_code.clone()))?;

        let vat_implied = take_percent(merchant_refund, ctx.order.tax.rate);
        let in_vat_currency = self
            .adapter
            .cb_current_common(
                &ctx.order.royalty_currency,
                &vat_currency,
                vat_implied,
                &ctx.country.vat_currency_rates_source,
            )
            .await?;
        let round_trip = self
            .adapter
            .stock_current_common(&vat_currency, &ctx.order.royalty_currency, in_vat_currency)
            .await?;
        let restored_fx = round_trip - vat_implied;
        let delta = original_fx.amount - restored_fx;

        let (reverse_delta, ps_delta) = if delta < Decimal::ZERO {
            (Decimal::ZERO, -delta)
        } else {
            (delta, Decimal::ZERO)
        };

        let mut entry = self.blank(ctx, refund, EntryType::ReverseTaxFeeDelta);
        entry.amount = reverse_delta;
        self.push(ctx, entry).await?;

        let mut entry = self.blank(ctx, refund, EntryType::PsReverseTaxFeeDelta);
        entry.amount = ps_delta;
        self.push(ctx, entry).await
    }

    fn blank(
        &self,
        ctx: &PipelineContext,
        refund: &Refund,
        entry_type: EntryType,
    ) -> AccountingEntry {
        EntryFactory::blank(
            &EntryScope::Refund {
                refund,
                order: &ctx.order,
            },
            entry_type,
        )
    }
}
