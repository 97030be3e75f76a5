//! Dock operations scheduling for a port.
//!
//! Assigns vessel visits to docks, crane counts and staff over one
//! calendar day, compares single- and multi-crane operation, and proposes
//! dock moves that even out crane workload.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `VesselVisit`, `Dock`, `StaffMember`,
//!   `TimeWindow`, `DayWindow`, `DailySchedule`, `Operation`
//! - **`validation`**: Input integrity checks and schedule verification
//! - **`instance`**: Validated per-day snapshot every algorithm reads
//! - **`timing`**: Operation duration, start/end and staff cover
//! - **`strategy`**: Optimal (branch-and-bound), Greedy and Local Search
//! - **`compare`**: Single-crane vs. multi-crane runs of one strategy
//! - **`rebalance`**: Dock load rebalancing by crane-hours
//! - **`kpi`**: Schedule quality metrics
//! - **`engine`**: Facade answering per-day requests over fixed rosters
//! - **`config`**: Engine, search and rebalancer settings
//! - **`generator`**: Seeded synthetic rosters
//!
//! # Logging
//!
//! Progress and summaries are emitted through `tracing`; install a
//! subscriber in the host application to see them.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Bierwirth & Meisel (2015), "A follow-up survey of berth allocation and
//!   quay crane scheduling problems in container terminals"

pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod instance;
pub mod kpi;
pub mod models;
pub mod rebalance;
pub mod strategy;
pub mod timing;
pub mod validation;

#[cfg(test)]
mod testing;

pub use compare::ComparisonResult;
pub use config::{CraneMode, EngineConfig, RebalanceConfig, SearchConfig};
pub use engine::{DailyScheduleResult, OperationRecord, PlanningEngine};
pub use error::{PlanningError, Result};
pub use instance::Instance;
pub use rebalance::RebalanceProposal;
pub use strategy::{Strategy, StrategyOutcome};
