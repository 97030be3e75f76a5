//! Assignment search strategies.
//!
//! Every strategy decides, for each visit of an [`Instance`] in `(ETA, id)`
//! order, either a `(dock, crane count)` placement or that the visit stays
//! unassigned. Placements are decoded against a dock/staff timeline, so all
//! strategies share the same timing and staff semantics.
//!
//! # Objective
//! Solutions are compared on `(unassigned count, total delay)`
//! lexicographically: placing a visit always beats any delay saving.
//!
//! # Strategies
//! - [`Strategy::Greedy`]: least-delay placement per visit, committed
//!   immediately.
//! - [`Strategy::Optimal`]: depth-first branch-and-bound seeded with the
//!   greedy result, bounded by a node budget.
//! - [`Strategy::LocalSearch`]: first-improvement reassign/swap moves
//!   starting from the greedy assignment.
//!
//! All three are deterministic for a fixed instance and node budget.
//!
//! # References
//! - Land & Doig (1960), "An Automatic Method of Solving Discrete
//!   Programming Problems"
//! - Hansen & Mladenović (2001), "Variable Neighborhood Search"

mod greedy;
mod local_search;
mod optimal;

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::instance::Instance;
use crate::models::{
    DailySchedule, Operation, OptimizationStep, StaffAssignment, UnassignedReason,
    UnassignedVisit,
};
use crate::timing::Placement;

/// Available search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Branch-and-bound; minimal objective within the node budget.
    Optimal,
    /// One pass, each visit takes its own best placement.
    Greedy,
    /// Greedy followed by improving reassign/swap moves.
    #[default]
    LocalSearch,
}

impl Strategy {
    /// All strategies, in declaration order.
    pub const ALL: [Strategy; 3] = [Strategy::Optimal, Strategy::Greedy, Strategy::LocalSearch];

    /// Name used in optimization steps and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Greedy => "greedy",
            Self::LocalSearch => "local_search",
        }
    }

    /// Schedules the instance.
    pub fn run(self, instance: &Instance, config: &SearchConfig) -> StrategyOutcome {
        match self {
            Self::Optimal => optimal::run(instance, config),
            Self::Greedy => greedy::run(instance, config),
            Self::LocalSearch => local_search::run(instance, config),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one strategy run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    /// The produced schedule.
    pub schedule: DailySchedule,
    /// Trace of the run.
    pub steps: Vec<OptimizationStep>,
    /// Whether the schedule is proven minimal. Only branch-and-bound runs
    /// that finish within budget set this.
    pub is_optimal: bool,
    /// Branch-and-bound nodes expanded (0 for other strategies).
    pub nodes_explored: u64,
}

/// Lexicographic objective: unassigned visits first, then total delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub(crate) struct Cost {
    pub unassigned: usize,
    pub delay_ms: i64,
}

impl Cost {
    pub fn of(decision: &Decision) -> Self {
        match decision {
            Decision::Place(p) => Self {
                unassigned: 0,
                delay_ms: p.timing.delay_ms,
            },
            Decision::Skip(_) => Self {
                unassigned: 1,
                delay_ms: 0,
            },
        }
    }

    pub fn total(decisions: &[Decision]) -> Self {
        decisions.iter().map(Self::of).fold(Self::default(), |a, b| a + b)
    }
}

impl Add for Cost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            unassigned: self.unassigned + rhs.unassigned,
            delay_ms: self.delay_ms + rhs.delay_ms,
        }
    }
}

/// Outcome for one visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Decision {
    Place(Placement),
    Skip(UnassignedReason),
}

impl Decision {
    /// `(dock, cranes)` if placed.
    pub fn pair(&self) -> Option<(usize, u32)> {
        match self {
            Self::Place(p) => Some((p.dock, p.cranes)),
            Self::Skip(_) => None,
        }
    }
}

/// Turns per-visit decisions (indexed by visit position) into a schedule.
pub(crate) fn build_schedule(instance: &Instance, decisions: &[Decision]) -> DailySchedule {
    let mut schedule = DailySchedule::new(*instance.day());

    for (visit, decision) in instance.visits().iter().zip(decisions) {
        match decision {
            Decision::Place(p) => {
                let dock = &instance.docks()[p.dock];
                schedule.add_operation(Operation {
                    visit_id: visit.id.clone(),
                    vessel: visit.vessel.clone(),
                    dock: dock.code.clone(),
                    cranes: dock.crane_labels(p.cranes),
                    crane_count: p.cranes,
                    dock_cranes: dock.crane_count,
                    start_ms: p.timing.start_ms,
                    end_ms: p.timing.end_ms,
                    loading_ms: p.timing.loading_ms,
                    unloading_ms: p.timing.unloading_ms,
                    staff: p
                        .staff
                        .iter()
                        .map(|(i, w)| StaffAssignment::new(instance.staff()[*i].id.clone(), *w))
                        .collect(),
                    etd_ms: visit.etd_ms,
                });
            }
            Decision::Skip(reason) => schedule.add_unassigned(UnassignedVisit {
                visit_id: visit.id.clone(),
                vessel: visit.vessel.clone(),
                reason: reason.clone(),
            }),
        }
    }

    schedule.normalize();
    schedule
}

/// The single step Greedy and Optimal report.
pub(crate) fn summary_step(
    strategy: Strategy,
    schedule: &DailySchedule,
    description: String,
) -> OptimizationStep {
    OptimizationStep {
        step: 1,
        total_delay_ms: schedule.total_delay_ms(),
        total_cranes: schedule.total_cranes(),
        strategy: strategy.name().to_string(),
        description,
    }
}
