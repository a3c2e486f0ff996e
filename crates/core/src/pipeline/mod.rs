//! Event-specific entry derivation pipelines.
//!
//! Each pipeline runs the entry factory, exchange adapter and validator in
//! a fixed order, accumulating entries in memory. Nothing is persisted
//! until the whole batch succeeds.

pub mod context;
pub mod correction;
pub mod event;
pub mod payment;
pub mod refund;

pub use context::PipelineContext;
pub use correction::CorrectionPipeline;
pub use event::{BillingEvent, CorrectionRequest, CorrectionTarget};
pub use payment::PaymentPipeline;
pub use refund::RefundPipeline;
