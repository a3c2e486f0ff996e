//! Accounting entry domain: types, factory, validation.
//!
//! This module owns the only entity of the engine — the immutable
//! `AccountingEntry` — and the machinery that builds, validates and
//! normalizes candidate entries before they are buffered for persistence.

pub mod factory;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use factory::EntryFactory;
pub use types::{
    AccountingEntry, EntrySource, EntryStatus, EntryType, SourceType, ENTRY_OBJECT_TYPE,
};
pub use validation::EntryValidator;
