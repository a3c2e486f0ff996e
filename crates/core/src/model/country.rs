//! Country and price group read models.

use serde::{Deserialize, Serialize};
use tally_shared::types::PriceGroupId;

/// A country record driving VAT and pricing behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code.
    pub iso_code: String,
    /// True when VAT applies to transactions in this country.
    pub vat_enabled: bool,
    /// Currency VAT is reported and settled in. Required when VAT is
    /// enabled; its absence is a configuration error.
    pub vat_currency: Option<String>,
    /// Rate source passed to the central-bank exchange operation.
    pub vat_currency_rates_source: String,
    /// Price group assigned to this country.
    pub price_group_id: PriceGroupId,
}

/// Regional price group; its currency is the local-reporting fallback for
/// countries without VAT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceGroup {
    /// Price group identifier.
    pub id: PriceGroupId,
    /// Settlement currency of the group.
    pub currency: String,
    /// Region name used in commission lookups, e.g. "europe".
    pub region: String,
}
