//! Accounting entry engine for the Tally billing backend.
//!
//! For every payment, refund, or manual correction event the engine
//! deterministically derives and persists an ordered batch of immutable
//! ledger entries: gross revenue, taxes, method fees, FX spread and
//! rolling-reserve movements, in the currencies the merchant, the
//! settlement bank and the operating company require.
//!
//! The crate is pure business logic. Storage, transport and the order
//! lifecycle are host concerns expressed as traits; the only remote-facing
//! code is the thin HTTP client for the currency-rate service.
//!
//! # Modules
//!
//! - `engine` - facade wiring the pipelines over host collaborators
//! - `pipeline` - payment, refund and manual-correction derivations
//! - `entry` - the entry catalog, factory and validator
//! - `exchange` - the four fixed exchange operation shapes
//! - `idempotency` - double-posting guard
//! - `persistence` - entry store trait and post-write side effects
//! - `tax_correction` - date-pinned batch recompute of tax entries

pub mod engine;
pub mod entry;
pub mod error;
pub mod exchange;
pub mod idempotency;
pub mod model;
pub mod persistence;
pub mod pipeline;
pub mod repository;
pub mod tax_correction;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{AccountingEngine, CorrectionResponse};
pub use error::AccountingError;
