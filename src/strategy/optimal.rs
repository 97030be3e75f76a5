//! Depth-first branch-and-bound.
//!
//! # Algorithm
//! The search tree fixes one visit per level in `(ETA, id)` order. The
//! children of a level are the feasible `(dock, cranes)` placements given
//! the timeline so far, in dock-code then crane order, followed by leaving
//! the visit unassigned. Frames live on an explicit stack; the chosen
//! decision for each level sits in an arena indexed by visit position.
//!
//! The greedy schedule seeds the incumbent. A child is pruned when its
//! running cost plus a lower bound on the remaining delay cannot beat the
//! incumbent. Since children are tried in order and only a strictly better
//! solution replaces one found by the search, the lexicographically smallest
//! decision sequence wins among equal-cost solutions.
//!
//! # Bound
//! Each remaining visit costs at least
//! `max(0, max(ETA, day start) + fastest duration - ETD)` over its
//! compatible docks, regardless of queueing. Leaving a visit out raises the
//! unassigned count, which dominates any delay, so the bound stays
//! admissible under the lexicographic objective.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::{build_schedule, greedy, summary_step, Cost, Decision, Strategy, StrategyOutcome};
use crate::config::SearchConfig;
use crate::instance::Instance;
use crate::models::UnassignedReason;
use crate::timing::{candidate_pairs, phase_duration_ms, Timeline};

/// Wall clock is polled every this many nodes.
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Exhausted,
    NodeLimit,
    TimeLimit,
}

/// Best complete solution so far.
struct Incumbent {
    decisions: Vec<Decision>,
    cost: Cost,
    from_search: bool,
}

impl Incumbent {
    /// Whether a branch with lower bound `bound` may still replace this one.
    fn admits(&self, bound: Cost) -> bool {
        bound < self.cost || (bound == self.cost && !self.from_search)
    }
}

/// One tree level: the alternatives for one visit.
struct Frame {
    options: Vec<Decision>,
    cursor: usize,
    timeline: Timeline,
    cost: Cost,
}

impl Frame {
    fn new(
        instance: &Instance,
        config: &SearchConfig,
        visit: usize,
        timeline: Timeline,
        cost: Cost,
    ) -> Self {
        let mut options: Vec<Decision> = candidate_pairs(instance, visit, config.crane_mode)
            .into_iter()
            .filter_map(|(dock, cranes)| timeline.plan(instance, visit, dock, cranes))
            .map(Decision::Place)
            .collect();
        let reason = if options.is_empty() {
            UnassignedReason::NoFeasiblePlacement
        } else {
            UnassignedReason::Deferred
        };
        options.push(Decision::Skip(reason));

        Self {
            options,
            cursor: 0,
            timeline,
            cost,
        }
    }
}

/// `bounds[i]` is the least delay visits `i..` can add.
fn remaining_delay_bounds(instance: &Instance, config: &SearchConfig) -> Vec<i64> {
    let day_start = instance.day().start_ms;
    let per_visit: Vec<i64> = instance
        .visits()
        .iter()
        .enumerate()
        .map(|(v, visit)| {
            instance
                .compatible_docks(v)
                .iter()
                .map(|&d| {
                    let k = config.crane_mode.max_cranes(&instance.docks()[d]);
                    let duration = phase_duration_ms(visit.loading_ms, k)
                        .saturating_add(phase_duration_ms(visit.unloading_ms, k));
                    visit
                        .eta_ms
                        .max(day_start)
                        .saturating_add(duration)
                        .saturating_sub(visit.etd_ms)
                        .max(0)
                })
                .min()
                .unwrap_or(0)
        })
        .collect();

    let mut bounds = vec![0i64; per_visit.len() + 1];
    for v in (0..per_visit.len()).rev() {
        bounds[v] = bounds[v + 1].saturating_add(per_visit[v]);
    }
    bounds
}

pub(crate) fn run(instance: &Instance, config: &SearchConfig) -> StrategyOutcome {
    let started = Instant::now();
    let n = instance.visit_count();
    let bounds = remaining_delay_bounds(instance, config);

    let seed = greedy::assign(instance, config);
    let mut best = Incumbent {
        cost: Cost::total(&seed),
        decisions: seed,
        from_search: false,
    };

    let mut nodes: u64 = 0;
    let mut updates: usize = 0;
    let termination = if n == 0 {
        Termination::Exhausted
    } else {
        let mut choices: Vec<Decision> =
            vec![Decision::Skip(UnassignedReason::Deferred); n];
        let mut stack = vec![Frame::new(
            instance,
            config,
            0,
            Timeline::new(instance),
            Cost::default(),
        )];
        let deadline = config.time_limit();

        loop {
            let depth = stack.len().saturating_sub(1);
            let Some(frame) = stack.last_mut() else {
                break Termination::Exhausted;
            };
            if frame.cursor == frame.options.len() {
                stack.pop();
                continue;
            }

            if nodes >= config.node_limit {
                break Termination::NodeLimit;
            }
            if nodes % CLOCK_CHECK_INTERVAL == 0
                && deadline.is_some_and(|limit| started.elapsed() >= limit)
            {
                break Termination::TimeLimit;
            }
            nodes += 1;

            let option = frame.options[frame.cursor].clone();
            frame.cursor += 1;

            let cost = frame.cost + Cost::of(&option);
            let bound = Cost {
                delay_ms: cost.delay_ms.saturating_add(bounds[depth + 1]),
                ..cost
            };
            if !best.admits(bound) {
                continue;
            }

            let mut timeline = frame.timeline.clone();
            if let Decision::Place(placement) = &option {
                timeline.commit(placement);
            }
            choices[depth] = option;

            if depth + 1 == n {
                debug!(
                    nodes,
                    unassigned = cost.unassigned,
                    total_delay_ms = cost.delay_ms,
                    "new incumbent"
                );
                best = Incumbent {
                    decisions: choices.clone(),
                    cost,
                    from_search: true,
                };
                updates += 1;
                continue;
            }

            stack.push(Frame::new(instance, config, depth + 1, timeline, cost));
        }
    };

    let is_optimal = termination == Termination::Exhausted;
    if !is_optimal {
        warn!(
            ?termination,
            nodes,
            node_limit = config.node_limit,
            "branch-and-bound budget exhausted; returning best found"
        );
    }

    let schedule = build_schedule(instance, &best.decisions);
    info!(
        strategy = "optimal",
        mode = config.crane_mode.label(),
        nodes,
        is_optimal,
        total_delay_ms = schedule.total_delay_ms(),
        unassigned = schedule.unassigned.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "schedule computed"
    );

    let description = format!(
        "branch-and-bound: {nodes} nodes, {updates} incumbent updates, {}",
        if is_optimal { "proven optimal" } else { "budget exhausted" }
    );
    let step = summary_step(Strategy::Optimal, &schedule, description);

    StrategyOutcome {
        schedule,
        steps: vec![step],
        is_optimal,
        nodes_explored: nodes,
    }
}
