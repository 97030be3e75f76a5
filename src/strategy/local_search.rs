//! First-improvement local search.
//!
//! # Algorithm
//! A solution is a `(dock, cranes)` choice per visit, decoded in `(ETA, id)`
//! order against a fresh timeline. Starting from the greedy choices, each
//! pass scans the neighborhood:
//!
//! 1. Reassign one visit to another `(dock, cranes)` pair.
//! 2. Swap the pairs of two placed visits where both docks accept both.
//!
//! The first move that strictly lowers `(unassigned, total delay)` is
//! accepted and the scan restarts. A choice that no longer decodes (dock
//! taken to the end of the day, no staff cover) leaves that visit
//! unassigned, so staff feasibility is re-checked for every candidate.
//!
//! # Reference
//! Hansen & Mladenović (2001), "Variable Neighborhood Search"

use std::time::Instant;

use tracing::{debug, info};

use super::{build_schedule, greedy, Cost, Decision, Strategy, StrategyOutcome};
use crate::config::SearchConfig;
use crate::instance::Instance;
use crate::models::{OptimizationStep, UnassignedReason};
use crate::timing::{candidate_pairs, Timeline};

type Pair = (usize, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Reassign { visit: usize, to: Pair },
    Swap { first: usize, second: usize },
}

impl Move {
    fn apply(self, pairs: &mut [Option<Pair>]) {
        match self {
            Self::Reassign { visit, to } => pairs[visit] = Some(to),
            Self::Swap { first, second } => pairs.swap(first, second),
        }
    }

    fn describe(self, instance: &Instance, before: &[Option<Pair>]) -> String {
        let label = |pair: Option<Pair>| match pair {
            Some((d, k)) => format!("{}x{k}", instance.docks()[d].code),
            None => "unassigned".to_string(),
        };
        let id = |v: usize| instance.visits()[v].id.as_str();

        match self {
            Self::Reassign { visit, to } => format!(
                "reassign {} from {} to {}",
                id(visit),
                label(before[visit]),
                label(Some(to))
            ),
            Self::Swap { first, second } => format!(
                "swap {} ({}) with {} ({})",
                id(first),
                label(before[first]),
                id(second),
                label(before[second])
            ),
        }
    }
}

/// Decodes pair choices in visit order. Undecodable choices become
/// unassigned: `Deferred` if some other pair would still place the visit,
/// `NoFeasiblePlacement` otherwise.
fn decode(instance: &Instance, config: &SearchConfig, pairs: &[Option<Pair>]) -> Vec<Decision> {
    let mut timeline = Timeline::new(instance);
    let mut decisions = Vec::with_capacity(pairs.len());

    for (visit, pair) in pairs.iter().enumerate() {
        let placement = pair.and_then(|(dock, cranes)| timeline.plan(instance, visit, dock, cranes));
        match placement {
            Some(p) => {
                timeline.commit(&p);
                decisions.push(Decision::Place(p));
            }
            None => {
                let placeable = candidate_pairs(instance, visit, config.crane_mode)
                    .into_iter()
                    .any(|(dock, cranes)| timeline.plan(instance, visit, dock, cranes).is_some());
                let reason = if placeable {
                    UnassignedReason::Deferred
                } else {
                    UnassignedReason::NoFeasiblePlacement
                };
                decisions.push(Decision::Skip(reason));
            }
        }
    }

    decisions
}

/// Moves in scan order: reassignments by visit, then swaps by visit pair.
fn neighborhood(instance: &Instance, config: &SearchConfig, pairs: &[Option<Pair>]) -> Vec<Move> {
    let mut moves = Vec::new();

    for (visit, current) in pairs.iter().enumerate() {
        for to in candidate_pairs(instance, visit, config.crane_mode) {
            if *current != Some(to) {
                moves.push(Move::Reassign { visit, to });
            }
        }
    }

    let fits = |visit: usize, (dock, cranes): Pair| {
        instance.is_compatible(visit, dock)
            && cranes <= config.crane_mode.max_cranes(&instance.docks()[dock])
    };
    for first in 0..pairs.len() {
        for second in first + 1..pairs.len() {
            let (Some(a), Some(b)) = (pairs[first], pairs[second]) else {
                continue;
            };
            if a != b && fits(first, b) && fits(second, a) {
                moves.push(Move::Swap { first, second });
            }
        }
    }

    moves
}

pub(crate) fn run(instance: &Instance, config: &SearchConfig) -> StrategyOutcome {
    let started = Instant::now();

    let mut decisions = greedy::assign(instance, config);
    let mut pairs: Vec<Option<Pair>> = decisions.iter().map(Decision::pair).collect();
    let mut cost = Cost::total(&decisions);
    let mut steps: Vec<OptimizationStep> = Vec::new();

    'search: while steps.len() < config.max_iterations {
        for mv in neighborhood(instance, config, &pairs) {
            let mut candidate = pairs.clone();
            mv.apply(&mut candidate);
            let decoded = decode(instance, config, &candidate);
            let candidate_cost = Cost::total(&decoded);

            if candidate_cost < cost {
                let description = mv.describe(instance, &pairs);
                debug!(
                    step = steps.len() + 1,
                    total_delay_ms = candidate_cost.delay_ms,
                    unassigned = candidate_cost.unassigned,
                    %description,
                    "accepted move"
                );
                steps.push(OptimizationStep {
                    step: steps.len() + 1,
                    total_delay_ms: candidate_cost.delay_ms,
                    total_cranes: decoded.iter().filter_map(Decision::pair).map(|(_, k)| k).sum(),
                    strategy: Strategy::LocalSearch.name().to_string(),
                    description,
                });

                // Keep the decoded view so dropped choices stay dropped.
                pairs = decoded.iter().map(Decision::pair).collect();
                decisions = decoded;
                cost = candidate_cost;
                continue 'search;
            }
        }
        break;
    }

    let schedule = build_schedule(instance, &decisions);
    info!(
        strategy = "local_search",
        mode = config.crane_mode.label(),
        accepted_moves = steps.len(),
        total_delay_ms = schedule.total_delay_ms(),
        unassigned = schedule.unassigned.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "schedule computed"
    );

    StrategyOutcome {
        schedule,
        steps,
        is_optimal: false,
        nodes_explored: 0,
    }
}
