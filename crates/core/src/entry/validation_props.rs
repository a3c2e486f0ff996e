//! Property-based tests for the entry allow-list contract.

use proptest::prelude::*;

use super::types::EntryType;
use super::validation::EntryValidator;

/// Strategy producing entry-type names from the closed catalog.
fn known_entry_type() -> impl Strategy<Value = String> {
    prop::sample::select(EntryType::ALL).prop_map(|t| t.as_str().to_string())
}

/// Strategy producing arbitrary lowercase identifiers, most of which are
/// outside the catalog.
fn arbitrary_name() -> impl Strategy<Value = String> {
    "[a-z_]{1,40}"
}

fn known_source_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("order".to_string()),
        Just("refund".to_string()),
        Just("merchant".to_string()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Validation succeeds iff the entry type is in the catalog, the source
    /// type is in its closed set, and the source id is non-empty.
    #[test]
    fn prop_validate_raw_contract(
        entry_type in prop_oneof![known_entry_type(), arbitrary_name()],
        source_type in prop_oneof![known_source_type(), arbitrary_name()],
        source_id in prop_oneof![Just(String::new()), "[a-f0-9]{8}"],
    ) {
        let type_allowed = EntryType::ALL.iter().any(|t| t.as_str() == entry_type);
        let source_allowed = matches!(source_type.as_str(), "order" | "refund" | "merchant");
        let id_present = !source_id.is_empty();

        let result = EntryValidator::validate_raw(&entry_type, &source_type, &source_id);
        prop_assert_eq!(
            result.is_ok(),
            type_allowed && source_allowed && id_present,
            "type={} source={} id={:?} -> {:?}",
            entry_type,
            source_type,
            source_id,
            result
        );
    }

    /// A rejected triple reports the first violated rule in contract order:
    /// entry type, then source type, then source id.
    #[test]
    fn prop_rejection_order(
        source_id in prop_oneof![Just(String::new()), "[a-f0-9]{8}"],
    ) {
        let err = EntryValidator::validate_raw("nonsense", "nonsense", &source_id).unwrap_err();
        prop_assert_eq!(err.error_code(), "UNKNOWN_ENTRY_TYPE");

        let err = EntryValidator::validate_raw("real_refund", "nonsense", &source_id).unwrap_err();
        prop_assert_eq!(err.error_code(), "UNKNOWN_SOURCE_TYPE");
    }
}
