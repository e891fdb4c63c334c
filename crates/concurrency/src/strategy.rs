//! Per-resource lock strategy selection
//!
//! One orchestrator serves every strategy: a [`LockStrategy`] picks a
//! [`LockMode`] independently for the coupon, stock and point legs.
//!
//! | Strategy | Coupon | Stock | Point | Can conflict? |
//! |----------|--------|-------|-------|---------------|
//! | optimistic | Optimistic | Optimistic | Optimistic | yes |
//! | pessimistic | Pessimistic | Pessimistic | Pessimistic | no |
//! | hybrid | Pessimistic | Pessimistic | Optimistic | point leg only |

use serde::{Deserialize, Serialize};
use std::fmt;

/// How one resource row is obtained and committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// Read without locking; commit only if the version is unchanged
    Optimistic,
    /// Take the row's exclusive lock before reading; hold it until the attempt ends
    Pessimistic,
}

impl LockMode {
    /// True if a leg in this mode can abort with a retryable conflict
    pub fn can_conflict(self) -> bool {
        matches!(self, LockMode::Optimistic)
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Optimistic => f.write_str("optimistic"),
            LockMode::Pessimistic => f.write_str("pessimistic"),
        }
    }
}

/// Named presets, as they appear in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Every leg optimistic
    Optimistic,
    /// Every leg pessimistic
    Pessimistic,
    /// Hot shared rows pessimistic, per-user points optimistic
    Hybrid,
}

/// Lock mode chosen for each of the three legs of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockStrategy {
    /// Coupon leg
    pub coupon: LockMode,
    /// Stock leg
    pub stock: LockMode,
    /// Point leg
    pub point: LockMode,
}

impl LockStrategy {
    /// All three legs optimistic
    pub const fn optimistic() -> Self {
        Self {
            coupon: LockMode::Optimistic,
            stock: LockMode::Optimistic,
            point: LockMode::Optimistic,
        }
    }

    /// All three legs pessimistic
    pub const fn pessimistic() -> Self {
        Self {
            coupon: LockMode::Pessimistic,
            stock: LockMode::Pessimistic,
            point: LockMode::Pessimistic,
        }
    }

    /// Coupon and stock pessimistic, points optimistic
    ///
    /// The point row belongs to one buyer and is rarely contended by other
    /// orders, but an exclusive lock on it held across a slow external step
    /// would stall that buyer's unrelated point operations.
    pub const fn hybrid() -> Self {
        Self {
            coupon: LockMode::Pessimistic,
            stock: LockMode::Pessimistic,
            point: LockMode::Optimistic,
        }
    }

    /// True if any leg can report a retryable conflict
    pub fn can_conflict(&self) -> bool {
        self.coupon.can_conflict() || self.stock.can_conflict() || self.point.can_conflict()
    }

    /// Preset name, or `custom` for any other combination
    pub fn name(&self) -> &'static str {
        if *self == Self::optimistic() {
            "optimistic"
        } else if *self == Self::pessimistic() {
            "pessimistic"
        } else if *self == Self::hybrid() {
            "hybrid"
        } else {
            "custom"
        }
    }
}

impl From<StrategyKind> for LockStrategy {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Optimistic => LockStrategy::optimistic(),
            StrategyKind::Pessimistic => LockStrategy::pessimistic(),
            StrategyKind::Hybrid => LockStrategy::hybrid(),
        }
    }
}

impl Default for LockStrategy {
    fn default() -> Self {
        Self::hybrid()
    }
}

impl fmt::Display for LockStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            "custom" => write!(
                f,
                "custom(coupon={}, stock={}, point={})",
                self.coupon, self.stock, self.point
            ),
            name => f.write_str(name),
        }
    }
}
