//! Payment pipeline.
//!
//! Derives the full entry sequence for a confirmed payment. Steps are
//! strictly ordered because later entries consume earlier values. Derived
//! fields a downstream read-model can compute arithmetically from the
//! persisted entries (markups, profits, net revenue) are intentionally not
//! persisted here.

use rust_decimal::Decimal;
use tracing::debug;

use tally_shared::types::money::take_percent;

use crate::entry::factory::{EntryFactory, EntryScope};
use crate::entry::{AccountingEntry, EntryType, EntryValidator, SourceType};
use crate::error::AccountingError;
use crate::exchange::ExchangeAdapter;
use crate::idempotency::IdempotencyGuard;
use crate::model::{Order, PaymentChannelCostMerchant, PaymentChannelCostSystem};
use crate::pipeline::context::PipelineContext;
use crate::repository::Repositories;

/// Ordered derivation of payment entries for one confirmed order.
#[derive(Clone)]
pub struct PaymentPipeline {
    adapter: ExchangeAdapter,
    validator: EntryValidator,
    repos: Repositories,
    guard: IdempotencyGuard,
}

impl PaymentPipeline {
    /// Creates the pipeline over its collaborators.
    #[must_use]
    pub fn new(
        adapter: ExchangeAdapter,
        validator: EntryValidator,
        repos: Repositories,
        guard: IdempotencyGuard,
    ) -> Self {
        Self {
            adapter,
            validator,
            repos,
            guard,
        }
    }

    /// Runs the pipeline and returns the buffered batch.
    pub async fn run(&self, order: &Order) -> Result<Vec<AccountingEntry>, AccountingError> {
        self.guard
            .ensure_first_run(&order.id.to_string(), SourceType::Order)
            .await?;

        let mut ctx = PipelineContext::resolve(order.clone(), &self.repos).await?;

        let real_gross = self.gross_revenue(&mut ctx).await?;
        self.tax_fee(&mut ctx).await?;
        self.central_bank_tax_placeholder(&mut ctx).await?;
        let rate_spread = self.gross_revenue_fx(&mut ctx, real_gross).await?;
        self.gross_revenue_fx_tax(&mut ctx, rate_spread).await?;

        // Consumed by the fee steps and derivable downstream; not persisted.
        let merchant_gross = real_gross - rate_spread;

        let tax_cost_value = self.merchant_tax_cost_value(&mut ctx, merchant_gross).await?;
        self.merchant_tax_central_bank_fx(&mut ctx, tax_cost_value)
            .await?;

        let (system_costs, merchant_costs) = self.channel_costs(&ctx).await?;
        self.method_fees(&mut ctx, &system_costs, &merchant_costs, merchant_gross, real_gross)
            .await?;
        self.fixed_fees(&mut ctx, &system_costs, &merchant_costs)
            .await?;

        debug!(
            order = %ctx.order.id,
            entries = ctx.entries.len(),
            "payment pipeline complete"
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

    /// `RealGrossRevenue`: the charge converted at the system rate.
    async fn gross_revenue(&self, ctx: &mut PipelineContext) -> Result<Decimal, AccountingError> {
        let amount = self
            .adapter
            .ps_current_common(
                &ctx.order.charge_currency,
                &ctx.order.royalty_currency,
                ctx.order.charge_amount,
            )
            .await?;

        let mut entry =
            EntryFactory::blank(&EntryScope::Order(&ctx.order), EntryType::RealGrossRevenue);
        entry.amount = amount;
        entry.original_amount = ctx.order.charge_amount;
        entry.original_currency = ctx.order.charge_currency.clone();
        self.push(ctx, entry).await?;
        Ok(amount)
    }

    /// `RealTaxFee`: the order tax converted at the system rate.
    async fn tax_fee(&self, ctx: &mut PipelineContext) -> Result<(), AccountingError> {
        let amount = self
            .adapter
            .ps_current_common(
                &ctx.order.charge_currency,
                &ctx.order.royalty_currency,
                ctx.order.tax.amount,
            )
            .await?;

        let mut entry = EntryFactory::blank(&EntryScope::Order(&ctx.order), EntryType::RealTaxFee);
        entry.amount = amount;
        entry.original_amount = ctx.order.tax.amount;
        entry.original_currency = ctx.order.charge_currency.clone();
        self.push(ctx, entry).await
    }

    /// `CentralBankTaxFee`: reserved placeholder, always persisted as zero
    /// at payment time.
    async fn central_bank_tax_placeholder(
        &self,
        ctx: &mut PipelineContext,
    ) -> Result<(), AccountingError> {
        let entry =
            EntryFactory::blank(&EntryScope::Order(&ctx.order), EntryType::CentralBankTaxFee);
        self.push(ctx, entry).await
    }

    /// `PsGrossRevenueFx`: the spread between the merchant-rate and
    /// system-rate value of the charge.
    async fn gross_revenue_fx(
        &self,
        ctx: &mut PipelineContext,
        real_gross: Decimal,
    ) -> Result<Decimal, AccountingError> {
        let merchant_value = self
            .adapter
            .ps_current_merchant(
                &ctx.order.charge_currency,
                &ctx.order.royalty_currency,
                ctx.order.charge_amount,
                ctx.order.merchant_id,
            )
            .await?;
        let spread = merchant_value - real_gross;

        let mut entry =
            EntryFactory::blank(&EntryScope::Order(&ctx.order), EntryType::PsGrossRevenueFx);
        entry.amount = spread;
        self.push(ctx, entry).await?;
        Ok(spread)
    }

    /// `PsGrossRevenueFxTaxFee`: tax share of the rate spread.
    async fn gross_revenue_fx_tax(
        &self,
        ctx: &mut PipelineContext,
        rate_spread: Decimal,
    ) -> Result<(), AccountingError> {
        let mut entry = EntryFactory::blank(
            &EntryScope::Order(&ctx.order),
            EntryType::PsGrossRevenueFxTaxFee,
        );
        entry.amount = take_percent(rate_spread, ctx.order.tax.rate);
        self.push(ctx, entry).await
    }

    /// `MerchantTaxFeeCostValue`: tax share of the merchant gross revenue.
    async fn merchant_tax_cost_value(
        &self,
        ctx: &mut PipelineContext,
        merchant_gross: Decimal,
    ) -> Result<Decimal, AccountingError> {
        let amount = take_percent(merchant_gross, ctx.order.tax.rate);

        let mut entry = EntryFactory::blank(
            &EntryScope::Order(&ctx.order),
            EntryType::MerchantTaxFeeCostValue,
        );
        entry.amount = amount;
        self.push(ctx, entry).await?;
        Ok(amount)
    }

    /// `MerchantTaxFeeCentralBankFx`: VAT-enabled countries only. The tax
    /// cost value is converted into the VAT currency at the central-bank
    /// rate and back at the stock rate; the difference against the cost
    /// value is the entry. A negative correction is never posted.
    async fn merchant_tax_central_bank_fx(
        &self,
        ctx: &mut PipelineContext,
        tax_cost_value: Decimal,
    ) -> Result<(), AccountingError> {
        if !ctx.country.vat_enabled {
            return Ok(());
        }
        let vat_currency = ctx
            .country
            .vat_currency
            .clone()
            .ok_or_else(|| AccountingError::VatCurrencyNotSet(ctx.country.iso_code.clone()))?;

        let in_vat_currency = self
            .adapter
            .cb_current_common(
                &ctx.order.royalty_currency,
                &vat_currency,
                tax_cost_value,
                &ctx.country.vat_currency_rates_source,
            )
            .await?;
        let restored = self
            .adapter
            .stock_current_common(&vat_currency, &ctx.order.royalty_currency, in_vat_currency)
            .await?;

        let fx = (restored - tax_cost_value).max(Decimal::ZERO);

        let mut entry = EntryFactory::blank(
            &EntryScope::Order(&ctx.order),
            EntryType::MerchantTaxFeeCentralBankFx,
        );
        entry.amount = fx;
        self.push(ctx, entry).await
    }

    /// Resolves both payment-channel cost sheets; a missing line is fatal.
    async fn channel_costs(
        &self,
        ctx: &PipelineContext,
    ) -> Result<(PaymentChannelCostSystem, PaymentChannelCostMerchant), AccountingError> {
        let key = ctx.cost_lookup();
        let system = self
            .repos
            .channel_costs_system
            .find(&key, ctx.order.operating_company_id)
            .await?
            .ok_or_else(|| ctx.commission_not_found())?;
        let merchant = self
            .repos
            .channel_costs_merchant
            .find(ctx.order.merchant_id, &key, &ctx.order.royalty_currency)
            .await?
            .ok_or_else(|| ctx.commission_not_found())?;
        Ok((system, merchant))
    }

    /// `PsMethodFee` / `MerchantMethodFee` / `MerchantMethodFeeCostValue`:
    /// percentage fees from both cost sheets.
    async fn method_fees(
        &self,
        ctx: &mut PipelineContext,
        system_costs: &PaymentChannelCostSystem,
        merchant_costs: &PaymentChannelCostMerchant,
        merchant_gross: Decimal,
        real_gross: Decimal,
    ) -> Result<(), AccountingError> {
        let mut entry = EntryFactory::blank(&EntryScope::Order(&ctx.order), EntryType::PsMethodFee);
        entry.amount = take_percent(merchant_gross, system_costs.percent);
        self.push(ctx, entry).await?;

        let mut entry =
            EntryFactory::blank(&EntryScope::Order(&ctx.order), EntryType::MerchantMethodFee);
        entry.amount = take_percent(merchant_gross, merchant_costs.method_percent);
        self.push(ctx, entry).await?;

        let mut entry = EntryFactory::blank(
            &EntryScope::Order(&ctx.order),
            EntryType::MerchantMethodFeeCostValue,
        );
        entry.amount = take_percent(real_gross, system_costs.percent);
        self.push(ctx, entry).await
    }

    /// The five fixed-fee lines, each converted at the merchant or system
    /// rate depending on the cost sheet it originates from.
    async fn fixed_fees(
        &self,
        ctx: &mut PipelineContext,
        system_costs: &PaymentChannelCostSystem,
        merchant_costs: &PaymentChannelCostMerchant,
    ) -> Result<(), AccountingError> {
        self.fixed_fee_at_merchant_rate(
            ctx,
            EntryType::MerchantMethodFixedFee,
            merchant_costs.method_fix_amount,
            &merchant_costs.method_fix_amount_currency,
        )
        .await?;
        self.fixed_fee_at_system_rate(
            ctx,
            EntryType::RealMerchantMethodFixedFee,
            merchant_costs.method_fix_amount,
            &merchant_costs.method_fix_amount_currency,
        )
        .await?;
        self.fixed_fee_at_system_rate(
            ctx,
            EntryType::RealMerchantMethodFixedFeeCostValue,
            system_costs.fix_amount,
            &system_costs.fix_amount_currency,
        )
        .await?;
        self.fixed_fee_at_merchant_rate(
            ctx,
            EntryType::MerchantPsFixedFee,
            merchant_costs.ps_fixed_fee,
            &merchant_costs.ps_fixed_fee_currency,
        )
        .await?;
        self.fixed_fee_at_system_rate(
            ctx,
            EntryType::RealMerchantPsFixedFee,
            merchant_costs.ps_fixed_fee,
            &merchant_costs.ps_fixed_fee_currency,
        )
        .await
    }

    async fn fixed_fee_at_merchant_rate(
        &self,
        ctx: &mut PipelineContext,
        entry_type: EntryType,
        fee: Decimal,
        fee_currency: &str,
    ) -> Result<(), AccountingError> {
        let amount = self
            .adapter
            .ps_current_merchant(
                fee_currency,
                &ctx.order.royalty_currency,
                fee,
                ctx.order.merchant_id,
            )
            .await?;
        self.push_fixed_fee(ctx, entry_type, amount, fee, fee_currency)
            .await
    }

    async fn fixed_fee_at_system_rate(
        &self,
        ctx: &mut PipelineContext,
        entry_type: EntryType,
        fee: Decimal,
        fee_currency: &str,
    ) -> Result<(), AccountingError> {
        let amount = self
            .adapter
            .ps_current_common(fee_currency, &ctx.order.royalty_currency, fee)
            .await?;
        self.push_fixed_fee(ctx, entry_type, amount, fee, fee_currency)
            .await
    }

    async fn push_fixed_fee(
        &self,
        ctx: &mut PipelineContext,
        entry_type: EntryType,
        amount: Decimal,
        fee: Decimal,
        fee_currency: &str,
    ) -> Result<(), AccountingError> {
        let mut entry = EntryFactory::blank(&EntryScope::Order(&ctx.order), entry_type);
        entry.amount = amount;
        entry.original_amount = fee;
        entry.original_currency = fee_currency.to_string();
        self.push(ctx, entry).await
    }
}
