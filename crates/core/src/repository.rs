//! Repository traits for externally owned records.
//!
//! The engine never talks to a storage driver directly; a host wires these
//! traits to its document store. All lookups are read-only.

use async_trait::async_trait;
use std::sync::Arc;

use tally_shared::types::{MerchantId, OrderId, PaylinkId, PriceGroupId, RefundId};

use crate::error::AccountingError;
use crate::model::{
    CostReason, Country, Merchant, MoneyBackCostMerchant, MoneyBackCostSystem, Order, Paylink,
    PaymentChannelCostMerchant, PaymentChannelCostSystem, PaylinkSalesSummary, PriceGroup, Refund,
};

/// Lookup key shared by the commission cost sheets.
#[derive(Debug, Clone)]
pub struct CostLookup<'a> {
    /// Payment method name.
    pub method: &'a str,
    /// Region of the country's price group.
    pub region: &'a str,
    /// Country code.
    pub country: &'a str,
    /// Merchant category code.
    pub mcc_code: &'a str,
}

/// Order lookups.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Finds an order by id.
    async fn find(&self, id: OrderId) -> Result<Option<Order>, AccountingError>;

    /// Aggregates sales statistics for all orders attributed to a paylink.
    async fn paylink_sales_summary(
        &self,
        paylink_id: PaylinkId,
    ) -> Result<PaylinkSalesSummary, AccountingError>;
}

/// Refund lookups.
#[async_trait]
pub trait RefundRepository: Send + Sync {
    /// Finds a refund by id.
    async fn find(&self, id: RefundId) -> Result<Option<Refund>, AccountingError>;
}

/// Merchant lookups.
#[async_trait]
pub trait MerchantRepository: Send + Sync {
    /// Finds a merchant by id.
    async fn find(&self, id: MerchantId) -> Result<Option<Merchant>, AccountingError>;
}

/// Country lookups.
#[async_trait]
pub trait CountryRepository: Send + Sync {
    /// Finds a country by ISO code.
    async fn find(&self, iso_code: &str) -> Result<Option<Country>, AccountingError>;
}

/// Price group lookups.
#[async_trait]
pub trait PriceGroupRepository: Send + Sync {
    /// Finds a price group by id.
    async fn find(&self, id: PriceGroupId) -> Result<Option<PriceGroup>, AccountingError>;
}

/// System payment-channel cost sheet.
#[async_trait]
pub trait PaymentChannelCostSystemRepository: Send + Sync {
    /// Finds the system cost line matching the key; `None` means no
    /// commission is configured (fatal to the pipeline).
    async fn find(
        &self,
        key: &CostLookup<'_>,
        operating_company_id: tally_shared::types::OperatingCompanyId,
    ) -> Result<Option<PaymentChannelCostSystem>, AccountingError>;
}

/// Merchant payment-channel cost sheet.
#[async_trait]
pub trait PaymentChannelCostMerchantRepository: Send + Sync {
    /// Finds the merchant cost line matching the key and payout currency.
    async fn find(
        &self,
        merchant_id: MerchantId,
        key: &CostLookup<'_>,
        payout_currency: &str,
    ) -> Result<Option<PaymentChannelCostMerchant>, AccountingError>;
}

/// System money-back cost sheet.
#[async_trait]
pub trait MoneyBackCostSystemRepository: Send + Sync {
    /// Finds the system money-back line for the key and undo reason.
    async fn find(
        &self,
        key: &CostLookup<'_>,
        reason: CostReason,
        operating_company_id: tally_shared::types::OperatingCompanyId,
    ) -> Result<Option<MoneyBackCostSystem>, AccountingError>;
}

/// Merchant money-back cost sheet.
#[async_trait]
pub trait MoneyBackCostMerchantRepository: Send + Sync {
    /// Finds the merchant money-back line for the key and undo reason.
    async fn find(
        &self,
        merchant_id: MerchantId,
        key: &CostLookup<'_>,
        reason: CostReason,
    ) -> Result<Option<MoneyBackCostMerchant>, AccountingError>;
}

/// Paylink records (read and write; statistics are recomputed here).
#[async_trait]
pub trait PaylinkRepository: Send + Sync {
    /// Finds a paylink by id.
    async fn find(&self, id: PaylinkId) -> Result<Option<Paylink>, AccountingError>;

    /// Persists recomputed paylink statistics.
    async fn save(&self, paylink: &Paylink) -> Result<(), AccountingError>;
}

/// Paylink visit counter.
#[async_trait]
pub trait PaylinkVisitRepository: Send + Sync {
    /// Counts recorded visits for a paylink.
    async fn count(&self, id: PaylinkId) -> Result<u64, AccountingError>;
}

/// Bundle of repositories the engine consumes.
#[derive(Clone)]
pub struct Repositories {
    /// Orders.
    pub orders: Arc<dyn OrderRepository>,
    /// Refunds.
    pub refunds: Arc<dyn RefundRepository>,
    /// Merchants.
    pub merchants: Arc<dyn MerchantRepository>,
    /// Countries.
    pub countries: Arc<dyn CountryRepository>,
    /// Price groups.
    pub price_groups: Arc<dyn PriceGroupRepository>,
    /// System payment-channel costs.
    pub channel_costs_system: Arc<dyn PaymentChannelCostSystemRepository>,
    /// Merchant payment-channel costs.
    pub channel_costs_merchant: Arc<dyn PaymentChannelCostMerchantRepository>,
    /// System money-back costs.
    pub money_back_system: Arc<dyn MoneyBackCostSystemRepository>,
    /// Merchant money-back costs.
    pub money_back_merchant: Arc<dyn MoneyBackCostMerchantRepository>,
    /// Paylinks.
    pub paylinks: Arc<dyn PaylinkRepository>,
    /// Paylink visits.
    pub paylink_visits: Arc<dyn PaylinkVisitRepository>,
}
