//! Currency exchange adapter.
//!
//! A thin client over the external rate service. Four request shapes exist,
//! each with a fixed rate regime and direction; all of them short-circuit
//! identity and zero conversions without a remote call.

pub mod adapter;
pub mod http;
pub mod types;

pub use adapter::ExchangeAdapter;
pub use http::HttpRateService;
pub use types::{ExchangeRequest, RateDirection, RateService, RateServiceError, RateType};
