//! Engine and search configuration.
//!
//! Every setting has a default, so a JSON document only needs the keys it
//! changes:
//!
//! ```
//! use dock_schedule::config::{CraneMode, EngineConfig};
//!
//! let config = EngineConfig::from_json(
//!     r#"{ "epoch": "2025-06-01", "search": { "crane_mode": "single", "node_limit": 5000 } }"#,
//! ).unwrap();
//! assert_eq!(config.search.crane_mode, CraneMode::Single);
//! assert_eq!(config.search.node_limit, 5000);
//! ```

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PlanningError, Result};
use crate::models::Dock;
use crate::strategy::Strategy;

/// How many cranes an operation may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraneMode {
    /// Every operation uses exactly one crane.
    Single,
    /// Operations may use up to the dock's parallelism.
    #[default]
    Full,
}

impl CraneMode {
    /// Highest crane count allowed on `dock`.
    pub fn max_cranes(self, dock: &Dock) -> u32 {
        match self {
            Self::Single => dock.usable_cranes().min(1),
            Self::Full => dock.usable_cranes(),
        }
    }

    /// Label used in traces.
    pub fn label(self) -> &'static str {
        match self {
            Self::Single => "single-crane",
            Self::Full => "multi-crane",
        }
    }
}

/// Settings shared by all strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Crane count policy.
    pub crane_mode: CraneMode,
    /// Branch-and-bound node expansion budget.
    pub node_limit: u64,
    /// Optional wall-clock limit for branch-and-bound (ms). Results under a
    /// time limit depend on machine speed; use `node_limit` for reproducible
    /// runs.
    pub time_limit_ms: Option<u64>,
    /// Maximum accepted local-search moves.
    pub max_iterations: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            crane_mode: CraneMode::Full,
            node_limit: 200_000,
            time_limit_ms: None,
            max_iterations: 1_000,
        }
    }
}

impl SearchConfig {
    /// Sets the crane mode.
    pub fn with_crane_mode(mut self, crane_mode: CraneMode) -> Self {
        self.crane_mode = crane_mode;
        self
    }

    /// Sets the node budget.
    pub fn with_node_limit(mut self, node_limit: u64) -> Self {
        self.node_limit = node_limit;
        self
    }

    /// Sets the wall-clock limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Sets the local-search move cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Wall-clock limit as a `Duration`.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// Rebalancer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    /// Maximum accepted dock moves per day.
    pub max_moves: usize,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self { max_moves: 1_000 }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Date whose midnight is t=0 on the time axis.
    pub epoch: NaiveDate,
    /// Strategy used when rebalancing a day.
    pub default_strategy: Strategy,
    /// Search settings.
    pub search: SearchConfig,
    /// Rebalancer settings.
    pub rebalance: RebalanceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epoch: NaiveDate::default(),
            default_strategy: Strategy::LocalSearch,
            search: SearchConfig::default(),
            rebalance: RebalanceConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with the given epoch.
    pub fn new(epoch: NaiveDate) -> Self {
        Self {
            epoch,
            ..Self::default()
        }
    }

    /// Sets the default strategy.
    pub fn with_default_strategy(mut self, strategy: Strategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Sets the search settings.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Sets the rebalancer settings.
    pub fn with_rebalance(mut self, rebalance: RebalanceConfig) -> Self {
        self.rebalance = rebalance;
        self
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    /// [`PlanningError::ConfigParse`] for malformed JSON,
    /// [`PlanningError::InvalidConfig`] for out-of-range values.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// [`PlanningError::InvalidConfig`] naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.search.node_limit == 0 {
            return Err(PlanningError::InvalidConfig(
                "search.node_limit must be positive".into(),
            ));
        }
        if self.search.max_iterations == 0 {
            return Err(PlanningError::InvalidConfig(
                "search.max_iterations must be positive".into(),
            ));
        }
        if self.search.time_limit_ms == Some(0) {
            return Err(PlanningError::InvalidConfig(
                "search.time_limit_ms must be positive when set".into(),
            ));
        }
        Ok(())
    }
}
