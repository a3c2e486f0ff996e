//! Engine configuration management.

use serde::Deserialize;

/// Policy applied when the idempotency guard finds entries that already
/// exist for a source.
///
/// `Reject` is the only implemented policy: a second pipeline run for the
/// same source fails with a conflict. `Update` is reserved as a named
/// switch; selecting it is a configuration error until its semantics are
/// defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Reject the event with an "already created" conflict.
    Reject,
    /// Rewrite the existing entries in place (reserved, not implemented).
    Update,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self::Reject
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Decimal places persisted for monetary amounts.
    #[serde(default = "default_precision")]
    pub precision: u32,
    /// Policy for duplicate entry detection.
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// Currency-rate service configuration.
    pub rates: RateServiceConfig,
}

fn default_precision() -> u32 {
    crate::types::money::DEFAULT_PRECISION
}

/// Currency-rate service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateServiceConfig {
    /// Base URL of the rate service.
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_rate_timeout")]
    pub timeout_secs: u64,
}

fn default_rate_timeout() -> u64 {
    10
}

impl EngineConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            duplicate_policy: DuplicatePolicy::default(),
            rates: RateServiceConfig {
                base_url: "http://localhost:8085".to_string(),
                timeout_secs: default_rate_timeout(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.precision, 2);
        assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(cfg.rates.timeout_secs, 10);
    }

    #[test]
    fn test_duplicate_policy_deserialize() {
        let policy: DuplicatePolicy = serde_json::from_str("\"update\"").unwrap();
        assert_eq!(policy, DuplicatePolicy::Update);
    }
}
