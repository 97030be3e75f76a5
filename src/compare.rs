//! Single-crane vs. multi-crane comparison.
//!
//! Runs one strategy twice over the same instance, once with every
//! operation held to one crane and once with each dock's full parallelism.
//! Both runs execute on scoped threads and are joined before the results
//! are merged.

use std::thread;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{CraneMode, SearchConfig};
use crate::instance::Instance;
use crate::models::{DailySchedule, OptimizationStep};
use crate::strategy::{Strategy, StrategyOutcome};

/// Outcome of a crane-mode comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Strategy used for both runs.
    pub strategy: Strategy,
    /// Schedule with one crane per operation.
    pub single_crane_schedule: DailySchedule,
    /// Schedule with full crane parallelism.
    pub multi_crane_schedule: DailySchedule,
    /// Total delay of the single-crane schedule (ms).
    pub single_total_delay: i64,
    /// Total delay of the multi-crane schedule (ms).
    pub multi_total_delay: i64,
    /// Crane-hours of the single-crane schedule.
    pub single_crane_hours: f64,
    /// Crane-hours of the multi-crane schedule.
    pub multi_crane_hours: f64,
    /// `single_total_delay - multi_total_delay` (ms).
    pub delay_reduction: i64,
    /// `multi_crane_hours - single_crane_hours`.
    pub crane_hours_difference: f64,
    /// Single-crane steps followed by multi-crane steps.
    pub optimization_steps: Vec<OptimizationStep>,
}

fn run_mode(
    instance: &Instance,
    strategy: Strategy,
    config: &SearchConfig,
    mode: CraneMode,
) -> StrategyOutcome {
    let config = config.clone().with_crane_mode(mode);
    let mut outcome = strategy.run(instance, &config);
    for step in &mut outcome.steps {
        step.description = format!("[{}] {}", mode.label(), step.description);
    }
    outcome
}

/// Runs `strategy` in both crane modes and reports the difference.
///
/// `config.crane_mode` is ignored; every other setting applies to both runs.
pub fn compare(instance: &Instance, strategy: Strategy, config: &SearchConfig) -> ComparisonResult {
    let (single, multi) = thread::scope(|scope| {
        let single = scope.spawn(|| run_mode(instance, strategy, config, CraneMode::Single));
        let multi = scope.spawn(|| run_mode(instance, strategy, config, CraneMode::Full));
        (
            single.join().unwrap_or_else(|p| std::panic::resume_unwind(p)),
            multi.join().unwrap_or_else(|p| std::panic::resume_unwind(p)),
        )
    });

    let single_total_delay = single.schedule.total_delay_ms();
    let multi_total_delay = multi.schedule.total_delay_ms();
    let single_crane_hours = single.schedule.total_crane_hours();
    let multi_crane_hours = multi.schedule.total_crane_hours();

    info!(
        %strategy,
        single_total_delay_ms = single_total_delay,
        multi_total_delay_ms = multi_total_delay,
        single_crane_hours,
        multi_crane_hours,
        "crane modes compared"
    );

    let mut optimization_steps = single.steps;
    optimization_steps.extend(multi.steps);

    ComparisonResult {
        strategy,
        single_crane_schedule: single.schedule,
        multi_crane_schedule: multi.schedule,
        single_total_delay,
        multi_total_delay,
        single_crane_hours,
        multi_crane_hours,
        delay_reduction: single_total_delay - multi_total_delay,
        crane_hours_difference: multi_crane_hours - single_crane_hours,
        optimization_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dock, MINUTE_MS};
    use crate::testing;

    #[test]
    fn test_multi_crane_reduces_delay() {
        let instance = testing::single_dock_instance();
        let docks = vec![Dock::new("A", 2)];
        let visits: Vec<_> = instance.visits().to_vec();
        let instance =
            Instance::build(&visits, &docks, &testing::all_day_staff(1), testing::day()).unwrap();

        let result = compare(&instance, Strategy::Optimal, &SearchConfig::default());
        // One crane: V2 waits the full hour. Two cranes: each visit takes
        // 30 minutes and both leave on time.
        assert_eq!(result.single_total_delay, 60 * MINUTE_MS);
        assert_eq!(result.multi_total_delay, 0);
        assert_eq!(
            result.delay_reduction,
            result.single_total_delay - result.multi_total_delay
        );
        assert!(result
            .single_crane_schedule
            .operations
            .iter()
            .all(|o| o.crane_count == 1));
    }

    #[test]
    fn test_step_trace_order() {
        let instance = testing::multi_crane_instance();
        let result = compare(&instance, Strategy::Greedy, &SearchConfig::default());

        assert_eq!(result.optimization_steps.len(), 2);
        assert!(result.optimization_steps[0]
            .description
            .starts_with("[single-crane]"));
        assert!(result.optimization_steps[1]
            .description
            .starts_with("[multi-crane]"));
    }

    #[test]
    fn test_crane_hours_difference() {
        let instance = testing::two_dock_instance();
        let result = compare(&instance, Strategy::Greedy, &SearchConfig::default());
        // Single-crane docks: both modes coincide.
        assert_eq!(result.single_crane_schedule, result.multi_crane_schedule);
        assert!(result.crane_hours_difference.abs() < 1e-10);
        assert!((result.single_crane_hours - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_comparison_serializes_camel_case() {
        let instance = testing::two_dock_instance();
        let result = compare(&instance, Strategy::Greedy, &SearchConfig::default());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("singleTotalDelay").is_some());
        assert!(json.get("multiCraneHours").is_some());
        assert!(json.get("optimizationSteps").is_some());
        let back: ComparisonResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
