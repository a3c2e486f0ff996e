//! In-memory fakes and fixture builders shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use tally_shared::types::{
    MerchantId, OperatingCompanyId, OrderId, PaylinkId, PriceGroupId, RefundId,
};

use crate::entry::{AccountingEntry, EntryType, EntryValidator, SourceType};
use crate::error::AccountingError;
use crate::exchange::{ExchangeAdapter, ExchangeRequest, RateService, RateServiceError, RateType};
use crate::model::{
    CostReason, Country, Merchant, MerchantBalance, MoneyBackCostMerchant, MoneyBackCostSystem,
    Order, OrderPublicStatus, OrderTax, Paylink, PaymentChannelCostMerchant,
    PaymentChannelCostSystem, PaylinkSalesSummary, PriceGroup, Refund,
};
use crate::persistence::{EntryStore, MerchantBalanceRecalculator, OrderViewUpdater};
use crate::repository::{
    CostLookup, CountryRepository, MerchantRepository, MoneyBackCostMerchantRepository,
    MoneyBackCostSystemRepository, OrderRepository, PaylinkRepository, PaylinkVisitRepository,
    PaymentChannelCostMerchantRepository, PaymentChannelCostSystemRepository,
    PriceGroupRepository, RefundRepository, Repositories,
};

// ---------------------------------------------------------------------------
// Rate service fake
// ---------------------------------------------------------------------------

/// Rate service answering from a scripted (rate type, from, to) -> rate map.
#[derive(Default)]
pub struct ScriptedRates {
    rates: std::sync::Mutex<HashMap<(RateType, String, String), Decimal>>,
    rates_at: std::sync::Mutex<HashMap<(RateType, String, String), Decimal>>,
    pub calls: AtomicUsize,
}

impl ScriptedRates {
    pub fn set(&self, rate_type: RateType, from: &str, to: &str, rate: Decimal) {
        self.rates
            .lock()
            .unwrap()
            .insert((rate_type, from.to_string(), to.to_string()), rate);
    }

    /// Rate used for date-pinned requests, when it differs from the
    /// current one.
    pub fn set_at(&self, rate_type: RateType, from: &str, to: &str, rate: Decimal) {
        self.rates_at
            .lock()
            .unwrap()
            .insert((rate_type, from.to_string(), to.to_string()), rate);
    }

    fn lookup(
        &self,
        map: &std::sync::Mutex<HashMap<(RateType, String, String), Decimal>>,
        req: &ExchangeRequest,
    ) -> Result<Decimal, RateServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        map.lock()
            .unwrap()
            .get(&(req.rate_type, req.from.clone(), req.to.clone()))
            .map(|rate| req.amount * rate)
            .ok_or_else(|| {
                RateServiceError::new(format!(
                    "no scripted rate for {:?} {} -> {}",
                    req.rate_type, req.from, req.to
                ))
            })
    }
}

#[async_trait]
impl RateService for ScriptedRates {
    async fn exchange(&self, req: &ExchangeRequest) -> Result<Decimal, RateServiceError> {
        self.lookup(&self.rates, req)
    }

    async fn exchange_at(
        &self,
        req: &ExchangeRequest,
        _at: DateTime<Utc>,
    ) -> Result<Decimal, RateServiceError> {
        if self
            .rates_at
            .lock()
            .unwrap()
            .contains_key(&(req.rate_type, req.from.clone(), req.to.clone()))
        {
            return self.lookup(&self.rates_at, req);
        }
        self.lookup(&self.rates, req)
    }
}

// ---------------------------------------------------------------------------
// Entry store fake
// ---------------------------------------------------------------------------

/// Entry store over a vec behind a mutex. Inserts are all-or-nothing like
/// the real batch insert.
#[derive(Default)]
pub struct InMemoryEntryStore {
    pub entries: Mutex<Vec<AccountingEntry>>,
    pub fail_inserts: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn exists_for_source(
        &self,
        object_type: &str,
        source_id: &str,
        source_type: SourceType,
    ) -> Result<bool, AccountingError> {
        Ok(self.entries.lock().await.iter().any(|e| {
            e.object_type == object_type
                && e.source.id == source_id
                && e.source.source_type == source_type
        }))
    }

    async fn find_by_source_and_type(
        &self,
        source_id: &str,
        source_type: SourceType,
        entry_type: EntryType,
    ) -> Result<Option<AccountingEntry>, AccountingError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .find(|e| {
                e.source.id == source_id
                    && e.source.source_type == source_type
                    && e.entry_type == entry_type
            })
            .cloned())
    }

    async fn find_by_types(
        &self,
        types: &[EntryType],
    ) -> Result<Vec<AccountingEntry>, AccountingError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|e| types.contains(&e.entry_type))
            .cloned()
            .collect())
    }

    async fn insert_batch(&self, entries: &[AccountingEntry]) -> Result<(), AccountingError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AccountingError::Storage("insert failed".into()));
        }
        self.entries.lock().await.extend_from_slice(entries);
        Ok(())
    }

    async fn update_batch(&self, entries: &[AccountingEntry]) -> Result<(), AccountingError> {
        let mut stored = self.entries.lock().await;
        for updated in entries {
            if let Some(existing) = stored.iter_mut().find(|e| e.id == updated.id) {
                *existing = updated.clone();
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Repository fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Fixtures {
    pub orders: HashMap<OrderId, Order>,
    pub refunds: HashMap<RefundId, Refund>,
    pub merchants: HashMap<MerchantId, Merchant>,
    pub countries: HashMap<String, Country>,
    pub price_groups: HashMap<PriceGroupId, PriceGroup>,
    pub channel_cost_system: Option<PaymentChannelCostSystem>,
    pub channel_cost_merchant: Option<PaymentChannelCostMerchant>,
    pub money_back_system: Option<MoneyBackCostSystem>,
    pub money_back_merchant: Option<MoneyBackCostMerchant>,
    pub paylinks: std::sync::Mutex<HashMap<PaylinkId, Paylink>>,
    pub paylink_visits: HashMap<PaylinkId, u64>,
    pub paylink_summary: Option<PaylinkSalesSummary>,
}

#[async_trait]
impl OrderRepository for Fixtures {
    async fn find(&self, id: OrderId) -> Result<Option<Order>, AccountingError> {
        Ok(self.orders.get(&id).cloned())
    }

    async fn paylink_sales_summary(
        &self,
        _paylink_id: PaylinkId,
    ) -> Result<PaylinkSalesSummary, AccountingError> {
        Ok(self.paylink_summary.clone().unwrap_or_default())
    }
}

#[async_trait]
impl RefundRepository for Fixtures {
    async fn find(&self, id: RefundId) -> Result<Option<Refund>, AccountingError> {
        Ok(self.refunds.get(&id).cloned())
    }
}

#[async_trait]
impl MerchantRepository for Fixtures {
    async fn find(&self, id: MerchantId) -> Result<Option<Merchant>, AccountingError> {
        Ok(self.merchants.get(&id).cloned())
    }
}

#[async_trait]
impl CountryRepository for Fixtures {
    async fn find(&self, iso_code: &str) -> Result<Option<Country>, AccountingError> {
        Ok(self.countries.get(iso_code).cloned())
    }
}

#[async_trait]
impl PriceGroupRepository for Fixtures {
    async fn find(&self, id: PriceGroupId) -> Result<Option<PriceGroup>, AccountingError> {
        Ok(self.price_groups.get(&id).cloned())
    }
}

#[async_trait]
impl PaymentChannelCostSystemRepository for Fixtures {
    async fn find(
        &self,
        _key: &CostLookup<'_>,
        _operating_company_id: OperatingCompanyId,
    ) -> Result<Option<PaymentChannelCostSystem>, AccountingError> {
        Ok(self.channel_cost_system.clone())
    }
}

#[async_trait]
impl PaymentChannelCostMerchantRepository for Fixtures {
    async fn find(
        &self,
        _merchant_id: MerchantId,
        _key: &CostLookup<'_>,
        _payout_currency: &str,
    ) -> Result<Option<PaymentChannelCostMerchant>, AccountingError> {
        Ok(self.channel_cost_merchant.clone())
    }
}

#[async_trait]
impl MoneyBackCostSystemRepository for Fixtures {
    async fn find(
        &self,
        _key: &CostLookup<'_>,
        reason: CostReason,
        _operating_company_id: OperatingCompanyId,
    ) -> Result<Option<MoneyBackCostSystem>, AccountingError> {
        Ok(self
            .money_back_system
            .clone()
            .filter(|c| c.undo_reason == reason))
    }
}

#[async_trait]
impl MoneyBackCostMerchantRepository for Fixtures {
    async fn find(
        &self,
        _merchant_id: MerchantId,
        _key: &CostLookup<'_>,
        reason: CostReason,
    ) -> Result<Option<MoneyBackCostMerchant>, AccountingError> {
        Ok(self
            .money_back_merchant
            .clone()
            .filter(|c| c.undo_reason == reason))
    }
}

#[async_trait]
impl PaylinkRepository for Fixtures {
    async fn find(&self, id: PaylinkId) -> Result<Option<Paylink>, AccountingError> {
        Ok(self.paylinks.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, paylink: &Paylink) -> Result<(), AccountingError> {
        self.paylinks
            .lock()
            .unwrap()
            .insert(paylink.id, paylink.clone());
        Ok(())
    }
}

#[async_trait]
impl PaylinkVisitRepository for Fixtures {
    async fn count(&self, id: PaylinkId) -> Result<u64, AccountingError> {
        Ok(self.paylink_visits.get(&id).copied().unwrap_or(0))
    }
}

/// Order-view recompute fake recording which orders were recalculated.
#[derive(Default)]
pub struct RecordingViews {
    pub recalculated: std::sync::Mutex<Vec<OrderId>>,
}

#[async_trait]
impl OrderViewUpdater for RecordingViews {
    async fn recalculate(&self, order_ids: &[OrderId]) -> Result<(), AccountingError> {
        self.recalculated.lock().unwrap().extend_from_slice(order_ids);
        Ok(())
    }
}

/// Balance aggregator summing rolling-reserve entries from a store.
pub struct StoreBalances {
    pub store: Arc<InMemoryEntryStore>,
}

#[async_trait]
impl MerchantBalanceRecalculator for StoreBalances {
    async fn recalculate(
        &self,
        merchant_id: MerchantId,
        currency: &str,
    ) -> Result<MerchantBalance, AccountingError> {
        let entries = self.store.entries.lock().await;
        let mut rolling_reserve = Decimal::ZERO;
        for e in entries.iter() {
            if e.merchant_id != merchant_id || e.currency != currency {
                continue;
            }
            match e.entry_type {
                EntryType::MerchantRollingReserveCreate => rolling_reserve += e.amount,
                EntryType::MerchantRollingReserveRelease => rolling_reserve -= e.amount,
                _ => {}
            }
        }
        Ok(MerchantBalance {
            merchant_id,
            currency: currency.to_string(),
            rolling_reserve,
        })
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn make_price_group() -> PriceGroup {
    PriceGroup {
        id: PriceGroupId::from_uuid(uuid::Uuid::from_u128(1)),
        currency: "USD".to_string(),
        region: "europe".to_string(),
    }
}

/// VAT-enabled country reporting in EUR.
pub fn make_country() -> Country {
    Country {
        iso_code: "DE".to_string(),
        vat_enabled: true,
        vat_currency: Some("EUR".to_string()),
        vat_currency_rates_source: "cbeu".to_string(),
        price_group_id: make_price_group().id,
    }
}

pub fn make_country_no_vat() -> Country {
    Country {
        vat_enabled: false,
        vat_currency: None,
        ..make_country()
    }
}

pub fn make_merchant() -> Merchant {
    Merchant {
        id: MerchantId::from_uuid(uuid::Uuid::from_u128(2)),
        royalty_currency: "USD".to_string(),
    }
}

/// Order charged 100 EUR, settling in USD, 20% tax.
pub fn make_order() -> Order {
    Order {
        id: OrderId::from_uuid(uuid::Uuid::from_u128(3)),
        merchant_id: make_merchant().id,
        country_code: "DE".to_string(),
        charge_amount: dec!(100),
        charge_currency: "EUR".to_string(),
        royalty_currency: "USD".to_string(),
        tax: OrderTax {
            rate: dec!(0.20),
            amount: dec!(20),
        },
        public_status: OrderPublicStatus::Processed,
        payment_method_name: "card".to_string(),
        mcc_code: "5816".to_string(),
        operating_company_id: OperatingCompanyId::from_uuid(uuid::Uuid::from_u128(4)),
        paylink_id: None,
        vat_deduction: false,
        closed_at: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
    }
}

pub fn make_refund(order: &Order) -> Refund {
    Refund {
        id: RefundId::from_uuid(uuid::Uuid::from_u128(5)),
        original_order_id: order.id,
        amount: order.charge_amount,
        currency: order.charge_currency.clone(),
        is_chargeback: false,
        created_at: Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(),
    }
}

pub fn make_channel_cost_system() -> PaymentChannelCostSystem {
    PaymentChannelCostSystem {
        name: "card".to_string(),
        region: "europe".to_string(),
        country: "DE".to_string(),
        mcc_code: "5816".to_string(),
        operating_company_id: make_order().operating_company_id,
        percent: dec!(0.015),
        fix_amount: dec!(0.20),
        fix_amount_currency: "EUR".to_string(),
    }
}

pub fn make_channel_cost_merchant() -> PaymentChannelCostMerchant {
    PaymentChannelCostMerchant {
        merchant_id: make_merchant().id,
        name: "card".to_string(),
        payout_currency: "USD".to_string(),
        region: "europe".to_string(),
        country: "DE".to_string(),
        mcc_code: "5816".to_string(),
        method_percent: dec!(0.025),
        method_fix_amount: dec!(0.30),
        method_fix_amount_currency: "EUR".to_string(),
        ps_fixed_fee: dec!(0.10),
        ps_fixed_fee_currency: "EUR".to_string(),
    }
}

pub fn make_money_back_system(reason: CostReason) -> MoneyBackCostSystem {
    MoneyBackCostSystem {
        name: "card".to_string(),
        undo_reason: reason,
        region: "europe".to_string(),
        country: "DE".to_string(),
        mcc_code: "5816".to_string(),
        operating_company_id: make_order().operating_company_id,
        percent: dec!(0.01),
        fix_amount: dec!(0.15),
        fix_amount_currency: "EUR".to_string(),
    }
}

pub fn make_money_back_merchant(reason: CostReason) -> MoneyBackCostMerchant {
    MoneyBackCostMerchant {
        merchant_id: make_merchant().id,
        name: "card".to_string(),
        undo_reason: reason,
        region: "europe".to_string(),
        country: "DE".to_string(),
        mcc_code: "5816".to_string(),
        percent: dec!(0.02),
        fix_amount: dec!(0.25),
        fix_amount_currency: "EUR".to_string(),
        is_paid_by_merchant: true,
    }
}

/// Fixture bundle wired for the canonical order above.
pub fn make_fixtures() -> Fixtures {
    let order = make_order();
    let merchant = make_merchant();
    let country = make_country();
    let group = make_price_group();
    let refund = make_refund(&order);

    let mut fixtures = Fixtures::default();
    fixtures.orders.insert(order.id, order);
    fixtures.merchants.insert(merchant.id, merchant);
    fixtures.countries.insert(country.iso_code.clone(), country);
    fixtures.price_groups.insert(group.id, group);
    fixtures.refunds.insert(refund.id, refund);
    fixtures.channel_cost_system = Some(make_channel_cost_system());
    fixtures.channel_cost_merchant = Some(make_channel_cost_merchant());
    fixtures.money_back_system = Some(make_money_back_system(CostReason::Reversal));
    fixtures.money_back_merchant = Some(make_money_back_merchant(CostReason::Reversal));
    fixtures
}

pub fn make_repositories(fixtures: Arc<Fixtures>) -> Repositories {
    Repositories {
        orders: fixtures.clone(),
        refunds: fixtures.clone(),
        merchants: fixtures.clone(),
        countries: fixtures.clone(),
        price_groups: fixtures.clone(),
        channel_costs_system: fixtures.clone(),
        channel_costs_merchant: fixtures.clone(),
        money_back_system: fixtures.clone(),
        money_back_merchant: fixtures.clone(),
        paylinks: fixtures.clone(),
        paylink_visits: fixtures,
    }
}

/// Scripted rates for the canonical order: system EUR->USD 1.10, merchant
/// EUR->USD 1.15, central-bank USD->EUR 0.90, stock EUR->USD 1.12.
pub fn make_rates() -> Arc<ScriptedRates> {
    let rates = Arc::new(ScriptedRates::default());
    rates.set(RateType::System, "EUR", "USD", dec!(1.10));
    rates.set(RateType::Merchant, "EUR", "USD", dec!(1.15));
    rates.set(RateType::CentralBank, "USD", "EUR", dec!(0.90));
    rates.set(RateType::CentralBank, "EUR", "USD", dec!(1.08));
    rates.set(RateType::CentralBank, "EUR", "EUR", dec!(1));
    rates.set(RateType::Stock, "EUR", "USD", dec!(1.12));
    rates
}

/// Validator over empty scripted rates; any remote call fails loudly.
pub fn test_validator() -> EntryValidator {
    let fixtures = Arc::new(make_fixtures());
    EntryValidator::new(
        ExchangeAdapter::new(Arc::new(ScriptedRates::default())),
        fixtures,
        2,
    )
}
