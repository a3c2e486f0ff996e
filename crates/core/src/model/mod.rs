//! Read-only collaborator entities.
//!
//! These records are owned by other services; the engine only reads them
//! while deriving accounting entries.

pub mod costs;
pub mod country;
pub mod merchant;
pub mod order;
pub mod paylink;
pub mod refund;

pub use costs::{
    CostReason, MoneyBackCostMerchant, MoneyBackCostSystem, PaymentChannelCostMerchant,
    PaymentChannelCostSystem,
};
pub use country::{Country, PriceGroup};
pub use merchant::{Merchant, MerchantBalance};
pub use order::{Order, OrderPublicStatus, OrderTax};
pub use paylink::{Paylink, PaylinkSalesSummary};
pub use refund::Refund;
