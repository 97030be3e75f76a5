//! Planning engine facade.
//!
//! [`PlanningEngine`] holds the visit, dock and staff rosters plus an
//! [`EngineConfig`], and answers per-day requests: schedule a day with a
//! strategy, compare crane modes, or propose a dock rebalance. Each request
//! builds its own [`Instance`], so requests never share mutable state.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use dock_schedule::config::EngineConfig;
//! use dock_schedule::engine::PlanningEngine;
//! use dock_schedule::models::{Dock, StaffMember, VesselVisit, DAY_MS, MINUTE_MS};
//! use dock_schedule::strategy::Strategy;
//!
//! let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
//! let visits = vec![
//!     VesselVisit::new("VV1", "Nordic Star", 0, 60 * MINUTE_MS)
//!         .with_loading(20 * MINUTE_MS)
//!         .with_unloading(40 * MINUTE_MS),
//!     VesselVisit::new("VV2", "Sea Lark", 0, 60 * MINUTE_MS)
//!         .with_loading(60 * MINUTE_MS),
//! ];
//! let docks = vec![Dock::new("Q1", 2), Dock::new("Q2", 1)];
//! let staff = vec![
//!     StaffMember::new("S1").with_window(0, DAY_MS),
//!     StaffMember::new("S2").with_window(0, DAY_MS),
//! ];
//!
//! let engine = PlanningEngine::new(visits, docks, staff, EngineConfig::new(day)).unwrap();
//! let result = engine.compute_daily_schedule(day, Strategy::Optimal).unwrap();
//!
//! assert_eq!(result.total_delay, 0);
//! assert!(result.is_optimal);
//! assert_eq!(result.operations.len(), 2);
//! ```

use std::thread;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compare::{compare, ComparisonResult};
use crate::config::EngineConfig;
use crate::error::{PlanningError, Result};
use crate::instance::Instance;
use crate::kpi::ScheduleKpi;
use crate::models::{
    DayWindow, Dock, Operation, OptimizationStep, StaffMember, UnassignedVisit, VesselVisit,
};
use crate::rebalance::{rebalance, RebalanceProposal};
use crate::strategy::Strategy;
use crate::validation::validate_input;

/// A staff member's share of an operation, in wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffAssignmentRecord {
    /// Staff ID.
    pub staff_id: String,
    /// Start of the covered part.
    pub start_time: NaiveDateTime,
    /// End of the covered part.
    pub end_time: NaiveDateTime,
}

/// One scheduled operation as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    /// Visit ID.
    pub vvn_id: String,
    /// Vessel reference.
    pub vessel: String,
    /// Dock code.
    pub dock: String,
    /// Work start.
    pub start_time: NaiveDateTime,
    /// Work end.
    pub end_time: NaiveDateTime,
    /// Loading phase with crane speed-up (ms).
    pub loading_duration: i64,
    /// Unloading phase with crane speed-up (ms).
    pub unloading_duration: i64,
    /// Crane labels used.
    pub crane: Vec<String>,
    /// Staff covering the work.
    pub staff_assignments: Vec<StaffAssignmentRecord>,
    /// Cranes working in parallel.
    pub crane_count_used: u32,
    /// Cranes installed on the dock.
    pub total_cranes_on_dock: u32,
    /// `end - start` (ms).
    pub optimized_operation_duration: i64,
    /// When the vessel leaves.
    pub real_departure_time: NaiveDateTime,
    /// `max(0, departure - ETD)` (ms).
    pub departure_delay: i64,
}

impl OperationRecord {
    fn from_operation(op: &Operation, epoch: NaiveDate) -> Self {
        Self {
            vvn_id: op.visit_id.clone(),
            vessel: op.vessel.clone(),
            dock: op.dock.clone(),
            start_time: timestamp(epoch, op.start_ms),
            end_time: timestamp(epoch, op.end_ms),
            loading_duration: op.loading_ms,
            unloading_duration: op.unloading_ms,
            crane: op.cranes.clone(),
            staff_assignments: op
                .staff
                .iter()
                .map(|a| StaffAssignmentRecord {
                    staff_id: a.staff_id.clone(),
                    start_time: timestamp(epoch, a.window.start_ms),
                    end_time: timestamp(epoch, a.window.end_ms),
                })
                .collect(),
            crane_count_used: op.crane_count,
            total_cranes_on_dock: op.dock_cranes,
            optimized_operation_duration: op.duration_ms(),
            real_departure_time: timestamp(epoch, op.real_departure_ms()),
            departure_delay: op.departure_delay_ms(),
        }
    }
}

/// A scheduled day as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyScheduleResult {
    /// The day.
    pub day: NaiveDate,
    /// Strategy that produced the schedule.
    pub strategy: Strategy,
    /// Operations by start time.
    pub operations: Vec<OperationRecord>,
    /// Visits left without an operation.
    pub unassigned: Vec<UnassignedVisit>,
    /// Sum of departure delays (ms).
    pub total_delay: i64,
    /// Whether the schedule is proven minimal.
    pub is_optimal: bool,
    /// Quality metrics.
    pub kpi: ScheduleKpi,
    /// Strategy trace.
    pub optimization_steps: Vec<OptimizationStep>,
    /// Branch-and-bound nodes expanded.
    pub nodes_explored: u64,
}

/// Milliseconds on the time axis to wall-clock time.
fn timestamp(epoch: NaiveDate, ms: i64) -> NaiveDateTime {
    NaiveDateTime::new(epoch, NaiveTime::MIN)
        .checked_add_signed(TimeDelta::milliseconds(ms))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Scheduling engine over fixed rosters.
#[derive(Debug, Clone)]
pub struct PlanningEngine {
    visits: Vec<VesselVisit>,
    docks: Vec<Dock>,
    staff: Vec<StaffMember>,
    config: EngineConfig,
}

impl PlanningEngine {
    /// Creates an engine after checking the configuration and rosters.
    ///
    /// # Errors
    /// [`PlanningError::InvalidConfig`] or [`PlanningError::Validation`].
    pub fn new(
        visits: Vec<VesselVisit>,
        docks: Vec<Dock>,
        staff: Vec<StaffMember>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        validate_input(&visits, &docks, &staff).map_err(PlanningError::Validation)?;
        Ok(Self {
            visits,
            docks,
            staff,
            config,
        })
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the instance for `day`.
    ///
    /// # Errors
    /// [`PlanningError::Validation`] if the rosters are invalid.
    pub fn instance(&self, day: NaiveDate) -> Result<Instance> {
        Instance::build(
            &self.visits,
            &self.docks,
            &self.staff,
            DayWindow::from_date(self.config.epoch, day),
        )
    }

    /// Schedules `day` with `strategy`.
    ///
    /// # Errors
    /// [`PlanningError::Validation`] if the rosters are invalid.
    pub fn compute_daily_schedule(
        &self,
        day: NaiveDate,
        strategy: Strategy,
    ) -> Result<DailyScheduleResult> {
        let instance = self.instance(day)?;
        let outcome = strategy.run(&instance, &self.config.search);
        let kpi = ScheduleKpi::calculate(&outcome.schedule, &instance);

        info!(
            %day,
            %strategy,
            operations = outcome.schedule.operation_count(),
            unassigned = outcome.schedule.unassigned.len(),
            total_delay_ms = kpi.total_delay_ms,
            is_optimal = outcome.is_optimal,
            "daily schedule computed"
        );

        Ok(DailyScheduleResult {
            day,
            strategy,
            operations: outcome
                .schedule
                .operations
                .iter()
                .map(|op| OperationRecord::from_operation(op, self.config.epoch))
                .collect(),
            unassigned: outcome.schedule.unassigned,
            total_delay: kpi.total_delay_ms,
            is_optimal: outcome.is_optimal,
            kpi,
            optimization_steps: outcome.steps,
            nodes_explored: outcome.nodes_explored,
        })
    }

    /// Runs `strategy` on `day` in single- and multi-crane mode.
    ///
    /// # Errors
    /// [`PlanningError::Validation`] if the rosters are invalid.
    pub fn compare_crane_modes(&self, day: NaiveDate, strategy: Strategy) -> Result<ComparisonResult> {
        let instance = self.instance(day)?;
        Ok(compare(&instance, strategy, &self.config.search))
    }

    /// Schedules `day` with the default strategy and rebalances dock loads.
    ///
    /// # Errors
    /// [`PlanningError::Validation`] if the rosters are invalid.
    pub fn compute_rebalance_proposal(&self, day: NaiveDate) -> Result<RebalanceProposal> {
        let instance = self.instance(day)?;
        let outcome = self
            .config
            .default_strategy
            .run(&instance, &self.config.search);
        Ok(rebalance(
            &instance,
            &outcome.schedule,
            &self.config.rebalance,
        ))
    }

    /// Rebalances several days concurrently, one scoped thread per day.
    /// Proposals come back in the order of `days`.
    ///
    /// # Errors
    /// The first error among the days, in `days` order.
    pub fn compute_rebalance_proposals(&self, days: &[NaiveDate]) -> Result<Vec<RebalanceProposal>> {
        thread::scope(|scope| {
            let handles: Vec<_> = days
                .iter()
                .map(|&day| scope.spawn(move || self.compute_rebalance_proposal(day)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CraneMode, SearchConfig};
    use crate::models::{UnassignedReason, DAY_MS, HOUR_MS, MINUTE_MS};
    use crate::testing;

    fn engine(visits: Vec<VesselVisit>, docks: Vec<Dock>) -> PlanningEngine {
        PlanningEngine::new(
            visits,
            docks,
            testing::all_day_staff(3),
            EngineConfig::new(testing::epoch()),
        )
        .unwrap()
    }

    fn scenario() -> PlanningEngine {
        engine(
            vec![
                testing::visit("V1", 0, 30, 0),
                testing::visit("V2", 0, 30, 0),
                testing::visit("V3", 30, 30, 0),
            ],
            vec![Dock::new("A", 1), Dock::new("B", 1)],
        )
    }

    fn at(minutes: i64) -> NaiveDateTime {
        timestamp(testing::epoch(), minutes * MINUTE_MS)
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(at(0).to_string(), "2025-01-01 00:00:00");
        assert_eq!(at(90).to_string(), "2025-01-01 01:30:00");
        assert_eq!(
            timestamp(testing::epoch(), DAY_MS + HOUR_MS).to_string(),
            "2025-01-02 01:00:00"
        );
    }

    #[test]
    fn test_daily_schedule_records() {
        let result = scenario()
            .compute_daily_schedule(testing::epoch(), Strategy::Greedy)
            .unwrap();

        assert_eq!(result.total_delay, 0);
        assert_eq!(result.operations.len(), 3);
        let v3 = result.operations.iter().find(|o| o.vvn_id == "V3").unwrap();
        assert_eq!(v3.dock, "A");
        assert_eq!(v3.start_time, at(30));
        assert_eq!(v3.end_time, at(60));
        assert_eq!(v3.real_departure_time, at(60));
        assert_eq!(v3.optimized_operation_duration, 30 * MINUTE_MS);
        assert_eq!(v3.loading_duration + v3.unloading_duration, 30 * MINUTE_MS);
        assert_eq!(v3.crane, vec!["A-C1"]);
        assert_eq!(v3.crane_count_used, 1);
        assert_eq!(v3.total_cranes_on_dock, 1);
        assert_eq!(v3.staff_assignments[0].start_time, at(30));
        assert_eq!(result.kpi.unassigned_count, 0);
        assert_eq!(result.optimization_steps.len(), 1);
    }

    #[test]
    fn test_result_json_round_trip() {
        let result = scenario()
            .compute_daily_schedule(testing::epoch(), Strategy::Optimal)
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["strategy"], "optimal");
        assert_eq!(json["isOptimal"], true);
        assert_eq!(json["totalDelay"], 0);
        let op = &json["operations"][0];
        for key in [
            "vvnId",
            "startTime",
            "loadingDuration",
            "craneCountUsed",
            "totalCranesOnDock",
            "optimizedOperationDuration",
            "realDepartureTime",
            "departureDelay",
            "staffAssignments",
        ] {
            assert!(op.get(key).is_some(), "{key}");
        }

        let back: DailyScheduleResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.operations, result.operations);
        assert_eq!(back.total_delay, result.total_delay);
    }

    #[test]
    fn test_unassigned_visit_reported() {
        let engine = engine(
            vec![VesselVisit::new("V1", "x", 0, HOUR_MS).with_loading(2 * DAY_MS)],
            vec![Dock::new("A", 1)],
        );
        let result = engine
            .compute_daily_schedule(testing::epoch(), Strategy::LocalSearch)
            .unwrap();
        assert!(result.operations.is_empty());
        assert_eq!(result.unassigned[0].reason, UnassignedReason::NoFeasiblePlacement);
        assert_eq!(result.kpi.unassigned_count, 1);
    }

    #[test]
    fn test_other_day_only_sees_its_visits() {
        let engine = engine(
            vec![
                testing::visit("V1", 0, 30, 0),
                testing::visit("V2", 24 * 60 + 10, 30, 0),
            ],
            vec![Dock::new("A", 1)],
        );
        let next = testing::epoch().succ_opt().unwrap();
        let result = engine.compute_daily_schedule(next, Strategy::Greedy).unwrap();
        assert_eq!(result.operations.len(), 1);
        assert_eq!(result.operations[0].vvn_id, "V2");
        assert_eq!(result.operations[0].start_time.to_string(), "2025-01-02 00:10:00");
    }

    #[test]
    fn test_compare_crane_modes() {
        let engine = engine(
            vec![testing::visit("V1", 0, 60, 0), testing::visit("V2", 0, 60, 0)],
            vec![Dock::new("A", 2)],
        );
        let result = engine
            .compare_crane_modes(testing::epoch(), Strategy::Greedy)
            .unwrap();
        assert_eq!(result.single_total_delay, 60 * MINUTE_MS);
        assert!(result.multi_total_delay < result.single_total_delay);
    }

    #[test]
    fn test_rebalance_proposal_uses_default_strategy() {
        let engine = scenario();
        let proposal = engine.compute_rebalance_proposal(testing::epoch()).unwrap();
        assert_eq!(proposal.day, testing::epoch());
        assert!((proposal.std_dev_before - proposal.std_dev_after).abs() < 1e-10);
        assert_eq!(proposal.assignments.len(), 3);
    }

    #[test]
    fn test_concurrent_rebalance_matches_sequential() {
        testing::init_tracing();
        let engine = engine(
            vec![
                testing::visit("V1", 0, 60, 600),
                testing::visit("V2", 60, 60, 600),
                testing::visit("V3", 24 * 60, 60, 600),
                testing::visit("V4", 25 * 60, 60, 600),
            ],
            vec![Dock::new("A", 1), Dock::new("B", 1)],
        );
        let day1 = testing::epoch();
        let day2 = day1.succ_opt().unwrap();

        let together = engine.compute_rebalance_proposals(&[day1, day2]).unwrap();
        assert_eq!(together.len(), 2);
        assert_eq!(together[0], engine.compute_rebalance_proposal(day1).unwrap());
        assert_eq!(together[1], engine.compute_rebalance_proposal(day2).unwrap());
        assert_eq!(together[1].day, day2);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        let err = PlanningEngine::new(
            vec![VesselVisit::new("V1", "x", 10, 0)],
            vec![Dock::new("A", 1)],
            vec![],
            EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanningError::Validation(_)));

        let config = EngineConfig::default().with_search(SearchConfig::default().with_node_limit(0));
        let err = PlanningEngine::new(vec![], vec![], vec![], config).unwrap_err();
        assert!(matches!(err, PlanningError::InvalidConfig(_)));
    }

    #[test]
    fn test_single_crane_config_applies() {
        let config = EngineConfig::new(testing::epoch())
            .with_search(SearchConfig::default().with_crane_mode(CraneMode::Single));
        let engine = PlanningEngine::new(
            vec![testing::visit("V1", 0, 60, 0)],
            vec![Dock::new("A", 3)],
            testing::all_day_staff(1),
            config,
        )
        .unwrap();
        let result = engine
            .compute_daily_schedule(testing::epoch(), Strategy::Optimal)
            .unwrap();
        assert_eq!(result.operations[0].crane_count_used, 1);
        assert_eq!(engine.config().search.crane_mode, CraneMode::Single);
    }
}
