//! Idempotency guard against double-posting.
//!
//! A check-then-act read against the entry store, keyed by (object type,
//! source id, source type). It is not a distributed lock: the upstream
//! event delivery must guarantee at most one in-flight notification per
//! order or refund.

use std::sync::Arc;
use tracing::debug;

use tally_shared::config::DuplicatePolicy;

use crate::entry::{SourceType, ENTRY_OBJECT_TYPE};
use crate::error::AccountingError;
use crate::persistence::EntryStore;

/// Guards pipelines against re-running for an already-accounted source.
#[derive(Clone)]
pub struct IdempotencyGuard {
    store: Arc<dyn EntryStore>,
    policy: DuplicatePolicy,
}

impl IdempotencyGuard {
    /// Creates a guard with the configured duplicate policy.
    #[must_use]
    pub fn new(store: Arc<dyn EntryStore>, policy: DuplicatePolicy) -> Self {
        Self { store, policy }
    }

    /// Fails if entries already exist for the source.
    ///
    /// Under the `Reject` policy a hit is an `AlreadyCreated` conflict; the
    /// `Update` policy has no implemented semantics and always fails.
    pub async fn ensure_first_run(
        &self,
        source_id: &str,
        source_type: SourceType,
    ) -> Result<(), AccountingError> {
        let exists = self
            .store
            .exists_for_source(ENTRY_OBJECT_TYPE, source_id, source_type)
            .await?;

        if !exists {
            return Ok(());
        }

        debug!(
            source_id,
            source_type = source_type.as_str(),
            "entries already exist for source"
        );

        match self.policy {
            DuplicatePolicy::Reject => Err(AccountingError::AlreadyCreated {
                source_type: source_type.as_str().to_string(),
                source_id: source_id.to_string(),
            }),
            DuplicatePolicy::Update => Err(AccountingError::DuplicatePolicyNotImplemented),
        }
    }
}
