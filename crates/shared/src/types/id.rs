//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing an `OrderId` where a
//! `RefundId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(EntryId, "Unique identifier for an accounting entry.");
typed_id!(OrderId, "Unique identifier for an order.");
typed_id!(RefundId, "Unique identifier for a refund.");
typed_id!(MerchantId, "Unique identifier for a merchant.");
typed_id!(
    OperatingCompanyId,
    "Unique identifier for an operating company."
);
typed_id!(PriceGroupId, "Unique identifier for a price group.");
typed_id!(PaylinkId, "Unique identifier for a paylink.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_id_from_uuid_roundtrip() {
        let uuid = Uuid::new_v4();
        let id = OrderId::from_uuid(uuid);
        assert_eq!(id.into_inner(), uuid);
    }

    #[test]
    fn test_typed_id_display_and_parse() {
        let id = EntryId::new();
        let parsed = EntryId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_typed_ids_are_time_ordered() {
        let a = EntryId::new();
        let b = EntryId::new();
        // UUID v7 sorts by creation time.
        assert!(a.into_inner() <= b.into_inner());
    }
}
