//! Greedy placement.
//!
//! # Algorithm
//! 1. Walk visits in `(ETA, id)` order.
//! 2. Try every feasible `(dock, cranes)` pair in dock-code then crane order.
//! 3. Keep the first pair with the smallest delay for that visit and commit
//!    it, so later visits see the dock and staff as booked.
//!
//! # Complexity
//! O(n·d·c) placements, each with a staff cover over the roster.

use std::time::Instant;

use tracing::{debug, info};

use super::{build_schedule, summary_step, Decision, Strategy, StrategyOutcome};
use crate::config::SearchConfig;
use crate::instance::Instance;
use crate::models::UnassignedReason;
use crate::timing::{candidate_pairs, Placement, Timeline};

/// Per-visit decisions of the greedy pass.
pub(crate) fn assign(instance: &Instance, config: &SearchConfig) -> Vec<Decision> {
    let mut timeline = Timeline::new(instance);
    let mut decisions = Vec::with_capacity(instance.visit_count());

    for visit in 0..instance.visit_count() {
        let mut best: Option<Placement> = None;
        for (dock, cranes) in candidate_pairs(instance, visit, config.crane_mode) {
            let Some(placement) = timeline.plan(instance, visit, dock, cranes) else {
                continue;
            };
            if best
                .as_ref()
                .map_or(true, |b| placement.timing.delay_ms < b.timing.delay_ms)
            {
                best = Some(placement);
            }
        }

        match best {
            Some(placement) => {
                timeline.commit(&placement);
                decisions.push(Decision::Place(placement));
            }
            None => {
                debug!(visit = %instance.visits()[visit].id, "no feasible placement");
                decisions.push(Decision::Skip(UnassignedReason::NoFeasiblePlacement));
            }
        }
    }

    decisions
}

pub(crate) fn run(instance: &Instance, config: &SearchConfig) -> StrategyOutcome {
    let started = Instant::now();
    let decisions = assign(instance, config);
    let schedule = build_schedule(instance, &decisions);

    info!(
        strategy = "greedy",
        mode = config.crane_mode.label(),
        total_delay_ms = schedule.total_delay_ms(),
        unassigned = schedule.unassigned.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "schedule computed"
    );

    let description = format!(
        "greedy placement: {} of {} visits placed",
        schedule.operation_count(),
        instance.visit_count()
    );
    let step = summary_step(Strategy::Greedy, &schedule, description);

    StrategyOutcome {
        schedule,
        steps: vec![step],
        is_optimal: false,
        nodes_explored: 0,
    }
}
