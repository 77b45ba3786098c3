//! Session configuration for the store and its reactions.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Storage key the whole state document lives under.
pub const DEFAULT_STORAGE_KEY: &str = "todos_state";
/// Simulated server round-trip time for deferred commits.
pub const DEFAULT_LATENCY_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyStorageKey,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStorageKey => write!(f, "storage key cannot be empty"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_key: String,
    /// Delay between a reaction's immediate phase and its commit.
    pub latency: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            latency: Duration::from_millis(DEFAULT_LATENCY_MS),
        }
    }
}

impl StoreConfig {
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }
}
