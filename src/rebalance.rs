//! Dock load rebalancing.
//!
//! Moves operations between docks to even out per-dock crane-hours while
//! keeping each operation's interval and crane count, so the day's total
//! crane-hours is unchanged.
//!
//! # Algorithm
//! 1. Measure per-dock crane-hours over every dock of the instance.
//! 2. List, per operation, the other docks that accept the visit, support
//!    its crane count and are free for its interval.
//! 3. Walk operations by descending dock load, then descending crane-hours,
//!    then visit ID. Move each to the candidate giving the lowest standard
//!    deviation, if that strictly lowers it, keeps the target within its
//!    capacity ceiling and staff can still cover the work there.
//! 4. Repeat passes until one accepts nothing or the move cap is reached.
//!
//! Statistics are population statistics over all docks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RebalanceConfig;
use crate::instance::Instance;
use crate::models::{DailySchedule, Operation, StaffAssignment, TimeWindow};
use crate::timing::assign_staff;

/// Smallest standard-deviation drop that counts as an improvement.
const STD_DEV_EPSILON: f64 = 1e-9;

/// Crane-hours on one dock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockLoad {
    /// Dock code.
    pub dock: String,
    /// Σ duration × crane count, in hours.
    pub crane_hours: f64,
}

/// Change of one dock's load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadDifference {
    /// Dock code.
    pub dock: String,
    /// Crane-hours before.
    pub before: f64,
    /// Crane-hours after.
    pub after: f64,
    /// `after - before`.
    pub difference: f64,
}

/// Where a visit's operation ends up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitAssignment {
    /// Visit ID.
    pub visit_id: String,
    /// Dock in the input schedule.
    pub original_dock: String,
    /// Dock after rebalancing.
    pub proposed_dock: String,
    /// Whether the docks differ.
    pub is_moved: bool,
}

/// Alternative docks for one operation in the input schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockCandidates {
    /// Visit ID.
    pub visit_id: String,
    /// Dock in the input schedule.
    pub current_dock: String,
    /// Docks the operation could move to, in code order.
    pub candidate_docks: Vec<String>,
}

/// Result of rebalancing one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceProposal {
    /// The day rebalanced.
    pub day: NaiveDate,
    /// Per-dock load of the input schedule.
    pub loads_before: Vec<DockLoad>,
    /// Per-dock load after rebalancing.
    pub loads_after: Vec<DockLoad>,
    /// Per-dock change.
    pub load_differences: Vec<LoadDifference>,
    /// One entry per operation, by visit ID.
    pub assignments: Vec<VisitAssignment>,
    /// Alternatives per operation in the input schedule, by visit ID.
    pub candidates: Vec<DockCandidates>,
    /// `clamp(1 - after/before, 0, 1)` on standard deviation; 0 when the
    /// input was already flat.
    pub balance_score: f64,
    /// Load variance before.
    pub variance_before: f64,
    /// Load variance after.
    pub variance_after: f64,
    /// Standard-deviation reduction in percent.
    pub improvement_percent: f64,
    /// Load standard deviation before.
    pub std_dev_before: f64,
    /// Load standard deviation after.
    pub std_dev_after: f64,
    /// Accepted moves.
    pub moves: usize,
    /// The rebalanced schedule.
    pub schedule: DailySchedule,
}

/// Population variance.
fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Working copy of the schedule with dock positions resolved.
struct Plan<'a> {
    instance: &'a Instance,
    operations: Vec<Operation>,
    docks: Vec<usize>,
    /// Operations on docks the instance does not know; carried unmoved.
    pinned: Vec<Operation>,
}

impl<'a> Plan<'a> {
    fn new(instance: &'a Instance, schedule: &DailySchedule) -> Self {
        let mut operations = Vec::with_capacity(schedule.operations.len());
        let mut docks = Vec::with_capacity(schedule.operations.len());
        let mut pinned = Vec::new();

        for op in &schedule.operations {
            match instance.dock_index(&op.dock) {
                Some(d) => {
                    operations.push(op.clone());
                    docks.push(d);
                }
                None => {
                    warn!(
                        visit = %op.visit_id,
                        dock = %op.dock,
                        "operation on unknown dock kept in place"
                    );
                    pinned.push(op.clone());
                }
            }
        }

        Self {
            instance,
            operations,
            docks,
            pinned,
        }
    }

    fn loads(&self) -> Vec<f64> {
        let mut loads = vec![0.0; self.instance.docks().len()];
        for (op, &d) in self.operations.iter().zip(&self.docks) {
            loads[d] += op.crane_hours();
        }
        loads
    }

    /// Docks the operation at `i` could move to as things stand.
    fn candidate_docks(&self, i: usize) -> Vec<usize> {
        let op = &self.operations[i];
        let Some(visit) = self.instance.visit_index(&op.visit_id) else {
            return Vec::new();
        };
        let window = op.window();

        self.instance
            .compatible_docks(visit)
            .iter()
            .copied()
            .filter(|&d| d != self.docks[i])
            .filter(|&d| self.instance.docks()[d].usable_cranes() >= op.crane_count)
            .filter(|&d| {
                self.operations
                    .iter()
                    .zip(&self.docks)
                    .enumerate()
                    .all(|(j, (other, &od))| j == i || od != d || !other.window().overlaps(&window))
            })
            .collect()
    }

    /// Staff for operation `i` on dock `d`: the current crew when it holds
    /// the dock's qualifications, otherwise a fresh cover.
    fn staff_for(&self, i: usize, d: usize) -> Option<Vec<StaffAssignment>> {
        let op = &self.operations[i];
        let required = &self.instance.docks()[d].required_qualifications;
        let staff = self.instance.staff();

        let crew_fits = op.staff.iter().all(|a| {
            self.instance
                .staff_index(&a.staff_id)
                .is_some_and(|s| staff[s].is_qualified_for(required))
        });
        if crew_fits {
            return Some(op.staff.clone());
        }

        let mut booked: Vec<Vec<TimeWindow>> = vec![Vec::new(); staff.len()];
        let others = self
            .operations
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, other)| other)
            .chain(&self.pinned);
        for a in others.flat_map(|other| &other.staff) {
            if let Some(s) = self.instance.staff_index(&a.staff_id) {
                booked[s].push(a.window);
            }
        }

        let cover = assign_staff(staff, &booked, required, op.window())?;
        Some(
            cover
                .into_iter()
                .map(|(s, w)| StaffAssignment::new(staff[s].id.clone(), w))
                .collect(),
        )
    }

    fn move_to(&mut self, i: usize, d: usize, crew: Vec<StaffAssignment>) {
        let dock = &self.instance.docks()[d];
        let op = &mut self.operations[i];
        op.dock = dock.code.clone();
        op.cranes = dock.crane_labels(op.crane_count);
        op.dock_cranes = dock.crane_count;
        op.staff = crew;
        self.docks[i] = d;
    }

    /// Visit order for one pass.
    fn pass_order(&self, loads: &[f64]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.operations.len()).collect();
        order.sort_by(|&a, &b| {
            loads[self.docks[b]]
                .total_cmp(&loads[self.docks[a]])
                .then_with(|| {
                    self.operations[b]
                        .crane_hours()
                        .total_cmp(&self.operations[a].crane_hours())
                })
                .then_with(|| self.operations[a].visit_id.cmp(&self.operations[b].visit_id))
        });
        order
    }
}

/// Rebalances `schedule`, which must have been produced for `instance`.
pub fn rebalance(
    instance: &Instance,
    schedule: &DailySchedule,
    config: &RebalanceConfig,
) -> RebalanceProposal {
    let mut plan = Plan::new(instance, schedule);
    let loads_before = plan.loads();

    let mut candidates: Vec<DockCandidates> = (0..plan.operations.len())
        .map(|i| DockCandidates {
            visit_id: plan.operations[i].visit_id.clone(),
            current_dock: plan.operations[i].dock.clone(),
            candidate_docks: plan
                .candidate_docks(i)
                .into_iter()
                .map(|d| instance.docks()[d].code.clone())
                .collect(),
        })
        .collect();
    candidates.sort_by(|a, b| a.visit_id.cmp(&b.visit_id));

    let mut moves = 0;
    'passes: loop {
        let mut accepted = false;
        let pass_loads = plan.loads();

        for i in plan.pass_order(&pass_loads) {
            if moves >= config.max_moves {
                break 'passes;
            }

            let loads = plan.loads();
            let current = std_dev(&loads);
            let from = plan.docks[i];
            let hours = plan.operations[i].crane_hours();

            let mut best: Option<(usize, f64, Vec<StaffAssignment>)> = None;
            for d in plan.candidate_docks(i) {
                if let Some(ceiling) = instance.docks()[d].capacity_ceiling {
                    if loads[d] + hours > ceiling + STD_DEV_EPSILON {
                        continue;
                    }
                }

                let mut trial = loads.clone();
                trial[from] -= hours;
                trial[d] += hours;
                let spread = std_dev(&trial);

                let improves = spread < current - STD_DEV_EPSILON;
                let beats_best = best
                    .as_ref()
                    .map_or(true, |(_, s, _)| spread < s - STD_DEV_EPSILON);
                if improves && beats_best {
                    if let Some(crew) = plan.staff_for(i, d) {
                        best = Some((d, spread, crew));
                    }
                }
            }

            if let Some((d, spread, crew)) = best {
                debug!(
                    visit = %plan.operations[i].visit_id,
                    from = %instance.docks()[from].code,
                    to = %instance.docks()[d].code,
                    std_dev = spread,
                    "moved operation"
                );
                plan.move_to(i, d, crew);
                moves += 1;
                accepted = true;
            }
        }

        if !accepted {
            break;
        }
    }

    let loads_after = plan.loads();
    let std_dev_before = std_dev(&loads_before);
    let std_dev_after = std_dev(&loads_after);
    let (balance_score, improvement_percent) = if std_dev_before > 0.0 {
        (
            (1.0 - std_dev_after / std_dev_before).clamp(0.0, 1.0),
            (std_dev_before - std_dev_after) / std_dev_before * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    let dock_loads = |loads: &[f64]| -> Vec<DockLoad> {
        instance
            .docks()
            .iter()
            .zip(loads)
            .map(|(d, &h)| DockLoad {
                dock: d.code.clone(),
                crane_hours: h,
            })
            .collect()
    };
    let load_differences = instance
        .docks()
        .iter()
        .zip(loads_before.iter().zip(&loads_after))
        .map(|(d, (&before, &after))| LoadDifference {
            dock: d.code.clone(),
            before,
            after,
            difference: after - before,
        })
        .collect();

    let mut assignments: Vec<VisitAssignment> = plan
        .operations
        .iter()
        .chain(&plan.pinned)
        .map(|op| {
            let original = schedule
                .operation_for_visit(&op.visit_id)
                .map_or_else(|| op.dock.clone(), |o| o.dock.clone());
            VisitAssignment {
                is_moved: original != op.dock,
                visit_id: op.visit_id.clone(),
                original_dock: original,
                proposed_dock: op.dock.clone(),
            }
        })
        .collect();
    assignments.sort_by(|a, b| a.visit_id.cmp(&b.visit_id));

    let mut rebalanced = DailySchedule::new(schedule.day);
    rebalanced.operations = plan.operations;
    rebalanced.operations.extend(plan.pinned);
    rebalanced.unassigned = schedule.unassigned.clone();
    rebalanced.normalize();

    info!(
        day = %schedule.day.date,
        moves,
        std_dev_before,
        std_dev_after,
        improvement_percent,
        "rebalance computed"
    );

    RebalanceProposal {
        day: schedule.day.date,
        loads_before: dock_loads(&loads_before),
        loads_after: dock_loads(&loads_after),
        load_differences,
        assignments,
        candidates,
        balance_score,
        variance_before: variance(&loads_before),
        variance_after: variance(&loads_after),
        improvement_percent,
        std_dev_before,
        std_dev_after,
        moves,
        schedule: rebalanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::generator::{generate, GeneratorConfig};
    use crate::models::Dock;
    use crate::strategy::Strategy;
    use crate::testing;
    use crate::validation::verify_schedule;

    fn total(loads: &[DockLoad]) -> f64 {
        loads.iter().map(|l| l.crane_hours).sum()
    }

    /// Three back-to-back visits that greedy stacks on dock A.
    fn stacked(docks: Vec<Dock>) -> (Instance, DailySchedule) {
        let visits = vec![
            testing::visit("V1", 0, 60, 600),
            testing::visit("V2", 60, 60, 600),
            testing::visit("V3", 120, 60, 600),
        ];
        let instance =
            Instance::build(&visits, &docks, &testing::all_day_staff(2), testing::day()).unwrap();
        let schedule = Strategy::Greedy
            .run(&instance, &SearchConfig::default())
            .schedule;
        assert_eq!(schedule.operations_on_dock("A").len(), 3);
        (instance, schedule)
    }

    #[test]
    fn test_statistics() {
        assert!((variance(&[1.0, 0.5]) - 0.0625).abs() < 1e-10);
        assert!((std_dev(&[1.0, 0.5]) - 0.25).abs() < 1e-10);
        assert_eq!(variance(&[]), 0.0);
    }

    #[test]
    fn test_balanced_scenario_makes_no_move() {
        let instance = testing::two_dock_instance();
        let schedule = Strategy::Greedy
            .run(&instance, &SearchConfig::default())
            .schedule;
        let p = rebalance(&instance, &schedule, &RebalanceConfig::default());

        assert_eq!(p.moves, 0);
        assert!((p.std_dev_before - p.std_dev_after).abs() < 1e-10);
        assert!((p.std_dev_before - 0.25).abs() < 1e-10);
        assert_eq!(p.loads_before, p.loads_after);
        assert_eq!(p.improvement_percent, 0.0);
        assert_eq!(p.balance_score, 0.0);
        assert!(p.assignments.iter().all(|a| !a.is_moved));

        // V3 could use the free dock B; V1 and V2 overlap the other dock.
        let v3 = p.candidates.iter().find(|c| c.visit_id == "V3").unwrap();
        assert_eq!(v3.candidate_docks, vec!["B"]);
        let v1 = p.candidates.iter().find(|c| c.visit_id == "V1").unwrap();
        assert!(v1.candidate_docks.is_empty());
    }

    #[test]
    fn test_moves_work_off_overloaded_dock() {
        let (instance, schedule) = stacked(vec![Dock::new("A", 1), Dock::new("B", 1)]);
        let p = rebalance(&instance, &schedule, &RebalanceConfig::default());

        assert_eq!(p.moves, 1);
        assert!((p.std_dev_before - 1.5).abs() < 1e-10);
        assert!((p.std_dev_after - 0.5).abs() < 1e-10);
        assert!((p.balance_score - 2.0 / 3.0).abs() < 1e-10);
        assert!((p.improvement_percent - 200.0 / 3.0).abs() < 1e-9);
        assert!((total(&p.loads_before) - total(&p.loads_after)).abs() < 1e-10);

        let moved: Vec<&VisitAssignment> = p.assignments.iter().filter(|a| a.is_moved).collect();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].visit_id, "V1");
        assert_eq!(moved[0].original_dock, "A");
        assert_eq!(moved[0].proposed_dock, "B");

        let diff_b = p.load_differences.iter().find(|d| d.dock == "B").unwrap();
        assert!((diff_b.difference - 1.0).abs() < 1e-10);

        let op = p.schedule.operation_for_visit("V1").unwrap();
        assert_eq!(op.cranes, vec!["B-C1"]);
        assert!(verify_schedule(&p.schedule, &instance).is_empty());
    }

    #[test]
    fn test_operation_on_unknown_dock_is_kept() {
        let (instance, mut schedule) = stacked(vec![Dock::new("A", 1), Dock::new("B", 1)]);
        let mut stray = schedule.operations[0].clone();
        stray.visit_id = "VX".into();
        stray.dock = "Z".into();
        stray.staff.clear();
        schedule.operations.push(stray);

        let p = rebalance(&instance, &schedule, &RebalanceConfig::default());
        assert_eq!(p.moves, 1);
        assert_eq!(p.schedule.operation_count(), 4);
        assert_eq!(p.schedule.operation_for_visit("VX").unwrap().dock, "Z");

        let vx = p.assignments.iter().find(|a| a.visit_id == "VX").unwrap();
        assert!(!vx.is_moved);
        assert_eq!(vx.proposed_dock, "Z");
        assert_eq!(p.loads_before.len(), 2);
        assert!((total(&p.loads_before) - 3.0).abs() < 1e-10);
        assert!((total(&p.loads_after) - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_rebalance_is_idempotent() {
        let (instance, schedule) = stacked(vec![Dock::new("A", 1), Dock::new("B", 1)]);
        let first = rebalance(&instance, &schedule, &RebalanceConfig::default());
        let second = rebalance(&instance, &first.schedule, &RebalanceConfig::default());

        assert_eq!(second.moves, 0);
        assert_eq!(second.schedule, first.schedule);
        assert!((second.std_dev_before - first.std_dev_after).abs() < 1e-10);
    }

    #[test]
    fn test_capacity_ceiling_blocks_move() {
        let (instance, schedule) = stacked(vec![
            Dock::new("A", 1),
            Dock::new("B", 1).with_capacity_ceiling(0.5),
        ]);
        let p = rebalance(&instance, &schedule, &RebalanceConfig::default());
        assert_eq!(p.moves, 0);
        assert_eq!(p.loads_before, p.loads_after);
    }

    #[test]
    fn test_unqualified_staff_blocks_move() {
        let (instance, schedule) = stacked(vec![
            Dock::new("A", 1),
            Dock::new("B", 1).with_required_qualification("hazmat"),
        ]);
        let p = rebalance(&instance, &schedule, &RebalanceConfig::default());
        assert_eq!(p.moves, 0);
    }

    #[test]
    fn test_move_cap() {
        let (instance, schedule) = stacked(vec![
            Dock::new("A", 1),
            Dock::new("B", 1),
            Dock::new("C", 1),
        ]);
        let capped = rebalance(&instance, &schedule, &RebalanceConfig { max_moves: 1 });
        assert_eq!(capped.moves, 1);

        let full = rebalance(&instance, &schedule, &RebalanceConfig::default());
        assert_eq!(full.moves, 2);
        assert!(full.std_dev_after.abs() < 1e-10);
        assert!((full.balance_score - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_generated_instances_keep_invariants() {
        testing::init_tracing();
        for seed in 0..5 {
            let generated = generate(&GeneratorConfig::default(), seed);
            let instance = generated.instance().unwrap();
            let schedule = Strategy::Greedy
                .run(&instance, &SearchConfig::default())
                .schedule;
            let p = rebalance(&instance, &schedule, &RebalanceConfig::default());

            assert!((total(&p.loads_before) - total(&p.loads_after)).abs() < 1e-6);
            assert!(p.std_dev_after <= p.std_dev_before + 1e-9);
            assert!((0.0..=1.0).contains(&p.balance_score));
            assert!(verify_schedule(&p.schedule, &instance).is_empty(), "seed {seed}");
            assert_eq!(p.schedule.operation_count(), schedule.operation_count());

            let again = rebalance(&instance, &p.schedule, &RebalanceConfig::default());
            assert_eq!(again.moves, 0, "seed {seed}");
        }
    }

    #[test]
    fn test_proposal_serializes_camel_case() {
        let instance = testing::two_dock_instance();
        let schedule = Strategy::Greedy
            .run(&instance, &SearchConfig::default())
            .schedule;
        let p = rebalance(&instance, &schedule, &RebalanceConfig::default());
        let json = serde_json::to_value(&p).unwrap();
        for key in [
            "loadsBefore",
            "loadsAfter",
            "loadDifferences",
            "balanceScore",
            "varianceBefore",
            "improvementPercent",
            "stdDevBefore",
            "stdDevAfter",
        ] {
            assert!(json.get(key).is_some(), "{key}");
        }
        assert_eq!(json["assignments"][0]["visitId"], "V1");
        assert_eq!(json["assignments"][0]["isMoved"], false);
    }
}
