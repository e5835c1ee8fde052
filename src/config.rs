use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use strum_macros::{Display, EnumString};
use thiserror::Error;

pub const FAILURE_POLICY_ENV: &str = "PUBSUB_FAILURE_POLICY";
pub const HANDLER_TIMEOUT_ENV: &str = "PUBSUB_HANDLER_TIMEOUT_MS";

/// What publish does when a subscriber returns an error
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FailurePolicy {
    /// Stop at the first failing subscriber and return its error
    #[default]
    Propagate,
    /// Log the failure and keep delivering to the remaining subscribers
    Isolate,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Registry behaviour settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub failure_policy: FailurePolicy,
    /// Upper bound on a single async handler; synchronous callbacks ignore it
    pub handler_timeout: Option<Duration>,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `PUBSUB_FAILURE_POLICY` and `PUBSUB_HANDLER_TIMEOUT_MS`,
    /// falling back to defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(FAILURE_POLICY_ENV) {
            config.failure_policy =
                FailurePolicy::from_str(raw.trim()).map_err(|_| ConfigError::InvalidValue {
                    key: FAILURE_POLICY_ENV,
                    value: raw.clone(),
                })?;
        }

        if let Some(raw) = lookup(HANDLER_TIMEOUT_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: HANDLER_TIMEOUT_ENV,
                value: raw.clone(),
            })?;
            config.handler_timeout = Some(Duration::from_millis(millis));
        }

        Ok(config)
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }
}
