//! Schedule quality metrics (KPIs).
//!
//! Computes dock scheduling performance indicators from a completed
//! daily schedule and the instance it was produced for.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest operation end |
//! | Total Delay | Sum of max(0, end - ETD) |
//! | Maximum Delay | Largest single delay |
//! | On-Time Rate | Fraction of placed visits leaving by ETD |
//! | Dock Utilization | Busy time / day length, per dock |
//! | Avg Turnaround | Mean time from ETA to departure |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::instance::Instance;
use crate::models::DailySchedule;

/// Schedule performance indicators.
///
/// All time values are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleKpi {
    /// Latest operation end (ms).
    pub makespan_ms: i64,
    /// Sum of departure delays (ms).
    pub total_delay_ms: i64,
    /// Largest departure delay (ms).
    pub max_delay_ms: i64,
    /// Fraction of placed visits leaving on time (0.0..1.0).
    pub on_time_rate: f64,
    /// Visits without an operation.
    pub unassigned_count: usize,
    /// Mean dock utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Per-dock utilization, every dock of the instance included.
    pub utilization_by_dock: BTreeMap<String, f64>,
    /// Crane-hours over all operations.
    pub total_crane_hours: f64,
    /// Mean `departure - ETA` over placed visits (ms).
    pub avg_turnaround_ms: f64,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its instance.
    pub fn calculate(schedule: &DailySchedule, instance: &Instance) -> Self {
        let mut on_time_count: usize = 0;
        let mut total_turnaround: f64 = 0.0;

        for op in &schedule.operations {
            if op.departure_delay_ms() == 0 {
                on_time_count += 1;
            }
            let eta = instance
                .visit_index(&op.visit_id)
                .map_or(op.start_ms, |v| instance.visits()[v].eta_ms);
            total_turnaround += (op.real_departure_ms() - eta) as f64;
        }

        let day_ms = instance.day().window().duration_ms() as f64;
        let utilization_by_dock: BTreeMap<String, f64> = instance
            .docks()
            .iter()
            .map(|dock| {
                let busy: i64 = schedule
                    .operations_on_dock(&dock.code)
                    .iter()
                    .map(|o| o.duration_ms())
                    .sum();
                (dock.code.clone(), busy as f64 / day_ms)
            })
            .collect();

        let avg_utilization = if utilization_by_dock.is_empty() {
            0.0
        } else {
            utilization_by_dock.values().sum::<f64>() / utilization_by_dock.len() as f64
        };

        let placed = schedule.operation_count();
        let (on_time_rate, avg_turnaround_ms) = if placed == 0 {
            (1.0, 0.0)
        } else {
            (
                on_time_count as f64 / placed as f64,
                total_turnaround / placed as f64,
            )
        };

        Self {
            makespan_ms: schedule.makespan_ms(),
            total_delay_ms: schedule.total_delay_ms(),
            max_delay_ms: schedule.max_delay_ms(),
            on_time_rate,
            unassigned_count: schedule.unassigned.len(),
            avg_utilization,
            utilization_by_dock,
            total_crane_hours: schedule.total_crane_hours(),
            avg_turnaround_ms,
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_delay_ms: i64, min_utilization: f64) -> bool {
        self.unassigned_count == 0
            && self.max_delay_ms <= max_delay_ms
            && self.avg_utilization >= min_utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::models::{Dock, DAY_MS, MINUTE_MS};
    use crate::strategy::Strategy;
    use crate::testing;

    #[test]
    fn test_kpi_two_dock_scenario() {
        let instance = testing::two_dock_instance();
        let schedule = Strategy::Greedy
            .run(&instance, &SearchConfig::default())
            .schedule;
        let kpi = ScheduleKpi::calculate(&schedule, &instance);

        assert_eq!(kpi.makespan_ms, 60 * MINUTE_MS);
        assert_eq!(kpi.total_delay_ms, 0);
        assert!((kpi.on_time_rate - 1.0).abs() < 1e-10);
        assert_eq!(kpi.unassigned_count, 0);
        assert!((kpi.total_crane_hours - 1.5).abs() < 1e-10);
        // A busy 60 min, B busy 30 min.
        let a = 60.0 * MINUTE_MS as f64 / DAY_MS as f64;
        let b = 30.0 * MINUTE_MS as f64 / DAY_MS as f64;
        assert!((kpi.utilization_by_dock["A"] - a).abs() < 1e-10);
        assert!((kpi.avg_utilization - (a + b) / 2.0).abs() < 1e-10);
        assert!((kpi.avg_turnaround_ms - 30.0 * MINUTE_MS as f64).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_with_delay() {
        let instance = testing::single_dock_instance();
        let schedule = Strategy::Greedy
            .run(&instance, &SearchConfig::default())
            .schedule;
        let kpi = ScheduleKpi::calculate(&schedule, &instance);

        assert_eq!(kpi.max_delay_ms, 60 * MINUTE_MS);
        assert!((kpi.on_time_rate - 0.5).abs() < 1e-10);
        assert!(kpi.meets_thresholds(60 * MINUTE_MS, 0.0));
        assert!(!kpi.meets_thresholds(30 * MINUTE_MS, 0.0));
    }

    #[test]
    fn test_kpi_empty_schedule() {
        let instance =
            Instance::build(&[], &[Dock::new("A", 1)], &[], testing::day()).unwrap();
        let schedule = DailySchedule::new(*instance.day());
        let kpi = ScheduleKpi::calculate(&schedule, &instance);

        assert!((kpi.on_time_rate - 1.0).abs() < 1e-10);
        assert_eq!(kpi.avg_turnaround_ms, 0.0);
        assert_eq!(kpi.utilization_by_dock["A"], 0.0);
        assert_eq!(kpi.makespan_ms, instance.day().start_ms);
    }
}
