//! Entry validation and normalization.
//!
//! Every candidate entry passes through here before it is buffered:
//! allow-list contract, original-value backfill, local-currency computation
//! and fixed-precision rounding.

use std::str::FromStr;
use std::sync::Arc;

use tally_shared::types::money::round_amount;

use super::types::{AccountingEntry, EntryType, SourceType};
use crate::error::AccountingError;
use crate::exchange::ExchangeAdapter;
use crate::model::Country;
use crate::repository::PriceGroupRepository;

/// Validates and normalizes candidate entries, then buffers them.
#[derive(Clone)]
pub struct EntryValidator {
    adapter: ExchangeAdapter,
    price_groups: Arc<dyn PriceGroupRepository>,
    precision: u32,
}

impl EntryValidator {
    /// Creates a validator with the given rounding precision.
    #[must_use]
    pub fn new(
        adapter: ExchangeAdapter,
        price_groups: Arc<dyn PriceGroupRepository>,
        precision: u32,
    ) -> Self {
        Self {
            adapter,
            price_groups,
            precision,
        }
    }

    /// Checks the allow-list contract on raw string inputs, as they arrive
    /// on manual-correction requests.
    ///
    /// Succeeds iff the entry type and source type belong to their closed
    /// sets and the source id is non-empty.
    pub fn validate_raw(
        entry_type: &str,
        source_type: &str,
        source_id: &str,
    ) -> Result<(EntryType, SourceType), AccountingError> {
        let entry_type = EntryType::from_str(entry_type)?;
        let source_type = SourceType::from_str(source_type)?;
        if source_id.is_empty() {
            return Err(AccountingError::InvalidSourceId);
        }
        Ok((entry_type, source_type))
    }

    /// Checks the contract on an already-typed entry. Type membership is
    /// guaranteed by construction; only the source id can be invalid.
    pub fn validate(entry: &AccountingEntry) -> Result<(), AccountingError> {
        if entry.source.id.is_empty() {
            return Err(AccountingError::InvalidSourceId);
        }
        Ok(())
    }

    /// Validates, normalizes and buffers one entry.
    ///
    /// Normalization backfills the original value when unset, computes the
    /// local value when a country is in scope and the entry does not
    /// already carry one, and rounds all three monetary fields to the
    /// configured precision.
    pub async fn push(
        &self,
        mut entry: AccountingEntry,
        country: Option<&Country>,
        batch: &mut Vec<AccountingEntry>,
    ) -> Result<(), AccountingError> {
        Self::validate(&entry)?;

        // A zero original amount with no currency means the value was never
        // converted: the entry describes itself.
        if entry.original_amount.is_zero() && entry.original_currency.is_empty() {
            entry.original_amount = entry.amount;
            entry.original_currency = entry.currency.clone();
        }

        if entry.local_currency.is_empty() {
            if let Some(country) = country {
                let local_currency = self.local_currency_for(country).await?;
                entry.local_amount = if local_currency == entry.original_currency {
                    // Already in the local currency, no remote call.
                    entry.original_amount
                } else {
                    self.adapter
                        .cb_current_common(
                            &entry.original_currency,
                            &local_currency,
                            entry.original_amount,
                            &country.vat_currency_rates_source,
                        )
                        .await?
                };
                entry.local_currency = local_currency;
            }
        }

        entry.amount = round_amount(entry.amount, self.precision);
        entry.original_amount = round_amount(entry.original_amount, self.precision);
        entry.local_amount = round_amount(entry.local_amount, self.precision);

        batch.push(entry);
        Ok(())
    }

    /// The currency local values are reported in: the VAT settlement
    /// currency for VAT-enabled countries, the price-group currency
    /// otherwise.
    async fn local_currency_for(&self, country: &Country) -> Result<String, AccountingError> {
        if country.vat_enabled {
            return country
                .vat_currency
                .clone()
                .ok_or_else(|| AccountingError::VatCurrencyNotSet(country.iso_code.clone()));
        }

        let group = self
            .price_groups
            .find(country.price_group_id)
            .await?
            .ok_or_else(|| AccountingError::PriceGroupNotFound(country.iso_code.clone()))?;
        Ok(group.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::factory::{EntryFactory, EntryScope};
    use crate::testing::{make_country, make_order, test_validator};
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_raw_accepts_known_pair() {
        let (entry_type, source_type) =
            EntryValidator::validate_raw("real_gross_revenue", "order", "abc").unwrap();
        assert_eq!(entry_type, EntryType::RealGrossRevenue);
        assert_eq!(source_type, SourceType::Order);
    }

    #[test]
    fn test_validate_raw_rejects_unknown_type() {
        let err = EntryValidator::validate_raw("bogus", "order", "abc").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_ENTRY_TYPE");
    }

    #[test]
    fn test_validate_raw_rejects_unknown_source() {
        let err = EntryValidator::validate_raw("real_gross_revenue", "invoice", "abc").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_SOURCE_TYPE");
    }

    #[test]
    fn test_validate_raw_rejects_empty_source_id() {
        let err = EntryValidator::validate_raw("real_gross_revenue", "order", "").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SOURCE_ID");
    }

    #[tokio::test]
    async fn test_push_backfills_original_value() {
        let validator = test_validator();
        let order = make_order();
        let mut entry =
            EntryFactory::blank(&EntryScope::Order(&order), EntryType::PsGrossRevenueFx);
        entry.amount = dec!(5.00);

        let mut batch = Vec::new();
        validator.push(entry, None, &mut batch).await.unwrap();

        let entry = &batch[0];
        assert_eq!(entry.original_amount, dec!(5.00));
        assert_eq!(entry.original_currency, entry.currency);
    }

    #[tokio::test]
    async fn test_push_keeps_explicit_original_value() {
        let validator = test_validator();
        let order = make_order();
        let mut entry =
            EntryFactory::blank(&EntryScope::Order(&order), EntryType::RealGrossRevenue);
        entry.amount = dec!(110.00);
        entry.original_amount = dec!(100.00);
        entry.original_currency = "EUR".to_string();

        let mut batch = Vec::new();
        validator.push(entry, None, &mut batch).await.unwrap();

        assert_eq!(batch[0].original_amount, dec!(100.00));
        assert_eq!(batch[0].original_currency, "EUR");
    }

    #[tokio::test]
    async fn test_push_vat_country_requires_vat_currency() {
        let validator = test_validator();
        let order = make_order();
        let mut country = make_country();
        country.vat_enabled = true;
        country.vat_currency = None;

        let mut entry =
            EntryFactory::blank(&EntryScope::Order(&order), EntryType::RealGrossRevenue);
        entry.amount = dec!(1.00);

        let mut batch = Vec::new();
        let err = validator
            .push(entry, Some(&country), &mut batch)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VAT_CURRENCY_NOT_SET");
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_push_rounds_all_monetary_fields() {
        let validator = test_validator();
        let order = make_order();
        let mut entry =
            EntryFactory::blank(&EntryScope::Order(&order), EntryType::RealGrossRevenue);
        entry.amount = dec!(110.00499);
        entry.original_amount = dec!(100.00501);
        entry.original_currency = "EUR".to_string();

        let mut batch = Vec::new();
        validator.push(entry, None, &mut batch).await.unwrap();

        assert_eq!(batch[0].amount, dec!(110.00));
        assert_eq!(batch[0].original_amount, dec!(100.01));
    }

    #[tokio::test]
    async fn test_push_skips_local_recompute_when_already_set() {
        let validator = test_validator();
        let order = make_order();
        let country = make_country();

        let mut entry = EntryFactory::blank(&EntryScope::Order(&order), EntryType::ReverseTaxFee);
        entry.amount = dec!(10.00);
        entry.local_amount = dec!(9.00);
        entry.local_currency = "PLN".to_string();

        let mut batch = Vec::new();
        validator
            .push(entry, Some(&country), &mut batch)
            .await
            .unwrap();

        assert_eq!(batch[0].local_amount, dec!(9.00));
        assert_eq!(batch[0].local_currency, "PLN");
    }
}
