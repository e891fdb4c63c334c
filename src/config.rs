//! Service configuration
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! points_per_order = 1000
//! quantity_per_order = 1
//! default_strategy = "hybrid"
//! stock_cache_ttl_ms = 60000
//! product_cache_ttl_ms = 10000
//! named_lock_wait_ms = 10000
//!
//! [retry]
//! delay_ms = 50
//! timeout_ms = 30000
//! # max_attempts = 100
//! ```

use crate::error::{Error, Result};
use orderlock_concurrency::{RetryConfig, StrategyKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`OrderService`](crate::OrderService)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderConfig {
    /// Points debited by each order
    pub points_per_order: u64,
    /// Stock units debited by each order
    pub quantity_per_order: u64,
    /// Conflict retry policy
    pub retry: RetryConfig,
    /// Strategy used by [`OrderService::place`](crate::OrderService::place)
    pub default_strategy: StrategyKind,
    /// How long a cached stock quantity stays fresh
    pub stock_cache_ttl_ms: u64,
    /// How long a cached product stays fresh
    pub product_cache_ttl_ms: u64,
    /// How long to wait for a named lock before giving up
    pub named_lock_wait_ms: u64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            points_per_order: 1000,
            quantity_per_order: 1,
            retry: RetryConfig::default(),
            default_strategy: StrategyKind::Hybrid,
            stock_cache_ttl_ms: 60_000,
            product_cache_ttl_ms: 10_000,
            named_lock_wait_ms: 10_000,
        }
    }
}

impl OrderConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// - `Config` if the document does not parse
    /// - `InvalidInput` if a value is out of range
    pub fn from_toml_str(doc: &str) -> Result<Self> {
        let config: OrderConfig = toml::from_str(doc)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check every value is in range
    pub fn validate(&self) -> Result<()> {
        if self.points_per_order == 0 {
            return Err(Error::InvalidInput(
                "points_per_order must be greater than 0".to_string(),
            ));
        }
        if self.quantity_per_order == 0 {
            return Err(Error::InvalidInput(
                "quantity_per_order must be greater than 0".to_string(),
            ));
        }
        if self.retry.timeout_ms == Some(0) {
            return Err(Error::InvalidInput(
                "retry.timeout_ms must be greater than 0".to_string(),
            ));
        }
        self.retry.validate()?;
        Ok(())
    }

    /// Freshness window of the stock cache
    pub fn stock_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.stock_cache_ttl_ms)
    }

    /// Freshness window of the product cache
    pub fn product_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.product_cache_ttl_ms)
    }

    /// Named lock wait bound
    pub fn named_lock_wait(&self) -> Duration {
        Duration::from_millis(self.named_lock_wait_ms)
    }
}
