//! Seeded synthetic instances.
//!
//! Produces reproducible visit, dock and staff rosters for one day, used
//! for benchmarking the strategies against each other and for property
//! tests. The same configuration and seed always give the same roster.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::instance::Instance;
use crate::models::{DayWindow, Dock, StaffMember, VesselVisit, DAY_MS, HOUR_MS, MINUTE_MS};

/// Qualification some generated docks require.
pub const CRANE_OPERATOR: &str = "crane_operator";

/// Shape of a generated roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Day the visits fall on; also the time-axis epoch.
    pub date: NaiveDate,
    /// Number of visits.
    pub visits: usize,
    /// Number of docks.
    pub docks: usize,
    /// Upper bound on cranes per dock.
    pub max_cranes: u32,
    /// Number of staff members.
    pub staff: usize,
    /// Vessel types drawn for visits and docks.
    pub vessel_types: Vec<String>,
    /// Single-crane work per visit, in minutes (inclusive range).
    pub work_minutes: (i64, i64),
    /// Slack between earliest finish and ETD, in minutes (inclusive range).
    pub slack_minutes: (i64, i64),
    /// Latest ETA, in hours after midnight.
    pub arrival_window_hours: i64,
    /// Probability that a dock beyond the first restricts vessel types.
    pub restricted_dock_ratio: f64,
    /// Probability that a dock requires [`CRANE_OPERATOR`].
    pub qualified_dock_ratio: f64,
    /// Probability that a staff member holds [`CRANE_OPERATOR`].
    pub qualified_staff_ratio: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            date: NaiveDate::default(),
            visits: 10,
            docks: 3,
            max_cranes: 3,
            staff: 4,
            vessel_types: vec!["container".into(), "bulk".into(), "tanker".into()],
            work_minutes: (30, 240),
            slack_minutes: (0, 180),
            arrival_window_hours: 16,
            restricted_dock_ratio: 0.3,
            qualified_dock_ratio: 0.3,
            qualified_staff_ratio: 0.5,
        }
    }
}

impl GeneratorConfig {
    /// A roster small enough for exhaustive branch-and-bound.
    pub fn small() -> Self {
        Self {
            visits: 6,
            docks: 2,
            max_cranes: 2,
            staff: 3,
            ..Self::default()
        }
    }
}

/// A generated roster plus the day it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedInstance {
    /// The day to schedule.
    pub day: DayWindow,
    /// Visits.
    pub visits: Vec<VesselVisit>,
    /// Docks.
    pub docks: Vec<Dock>,
    /// Staff.
    pub staff: Vec<StaffMember>,
}

impl GeneratedInstance {
    /// Builds the scheduling instance.
    ///
    /// # Errors
    /// Only if the roster fails validation, which generated rosters do not.
    pub fn instance(&self) -> Result<Instance> {
        Instance::build(&self.visits, &self.docks, &self.staff, self.day)
    }
}

/// Generates a roster from `seed`.
pub fn generate(config: &GeneratorConfig, seed: u64) -> GeneratedInstance {
    let mut rng = StdRng::seed_from_u64(seed);
    let day = DayWindow::from_date(config.date, config.date);

    let docks = gen_docks(config, &mut rng);
    let visits = gen_visits(config, &mut rng);
    let staff = gen_staff(config, &mut rng);

    GeneratedInstance {
        day,
        visits,
        docks,
        staff,
    }
}

/// A ratio as a valid probability; NaN counts as 0.
fn probability(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

fn gen_docks(config: &GeneratorConfig, rng: &mut StdRng) -> Vec<Dock> {
    (0..config.docks.max(1))
        .map(|i| {
            let cranes = rng.random_range(1..=config.max_cranes.max(1));
            let mut dock =
                Dock::new(format!("D{:02}", i + 1), cranes).with_max_parallel(rng.random_range(1..=cranes));

            // The first dock accepts everything, so every visit has a home.
            if i > 0
                && !config.vessel_types.is_empty()
                && rng.random_bool(probability(config.restricted_dock_ratio))
            {
                let pick = rng.random_range(0..config.vessel_types.len());
                dock = dock.with_vessel_type(config.vessel_types[pick].clone());
            }
            if rng.random_bool(probability(config.qualified_dock_ratio)) {
                dock = dock.with_required_qualification(CRANE_OPERATOR);
            }
            dock
        })
        .collect()
}

fn gen_visits(config: &GeneratorConfig, rng: &mut StdRng) -> Vec<VesselVisit> {
    let (work_lo, work_hi) = config.work_minutes;
    let (slack_lo, slack_hi) = config.slack_minutes;
    let arrival_hi = (config.arrival_window_hours * HOUR_MS).clamp(0, DAY_MS - 1);

    (0..config.visits)
        .map(|i| {
            let eta = rng.random_range(0..=arrival_hi / MINUTE_MS) * MINUTE_MS;
            let work = rng.random_range(work_lo.max(0)..=work_hi.max(work_lo).max(0)) * MINUTE_MS;
            let loading = rng.random_range(0..=work / MINUTE_MS) * MINUTE_MS;
            let slack = rng.random_range(slack_lo.max(0)..=slack_hi.max(slack_lo).max(0)) * MINUTE_MS;

            let mut visit = VesselVisit::new(
                format!("VV{:03}", i + 1),
                format!("Vessel {}", i + 1),
                eta,
                eta + work + slack,
            )
            .with_loading(loading)
            .with_unloading(work - loading);
            if !config.vessel_types.is_empty() {
                let pick = rng.random_range(0..config.vessel_types.len());
                visit = visit.with_vessel_type(config.vessel_types[pick].clone());
            }
            visit
        })
        .collect()
}

fn gen_staff(config: &GeneratorConfig, rng: &mut StdRng) -> Vec<StaffMember> {
    (0..config.staff)
        .map(|i| {
            let mut member = StaffMember::new(format!("ST{:02}", i + 1));
            if i == 0 {
                member = member.with_window(0, DAY_MS);
            } else {
                // One or two shifts of 6-10 hours.
                let first_start = rng.random_range(0..=8) * HOUR_MS;
                let first_end = first_start + rng.random_range(6..=10) * HOUR_MS;
                member = member.with_window(first_start, first_end);
                if rng.random_bool(0.5) {
                    let second_start = first_end + rng.random_range(1..=3) * HOUR_MS;
                    let second_end = (second_start + rng.random_range(2..=6) * HOUR_MS).min(DAY_MS);
                    if second_start < second_end {
                        member = member.with_window(second_start, second_end);
                    }
                }
            }
            if rng.random_bool(probability(config.qualified_staff_ratio)) {
                member = member.with_qualification(CRANE_OPERATOR);
            }
            member
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_input;

    #[test]
    fn test_generate_is_reproducible() {
        let config = GeneratorConfig::default();
        assert_eq!(generate(&config, 42), generate(&config, 42));
        assert_ne!(generate(&config, 42), generate(&config, 43));
    }

    #[test]
    fn test_generated_rosters_validate() {
        for seed in 0..20 {
            let g = generate(&GeneratorConfig::default(), seed);
            assert!(validate_input(&g.visits, &g.docks, &g.staff).is_ok(), "seed {seed}");
            assert_eq!(g.visits.len(), 10);
            assert_eq!(g.docks.len(), 3);
            assert_eq!(g.staff.len(), 4);
        }
    }

    #[test]
    fn test_generated_visits_fall_on_day() {
        let config = GeneratorConfig::small();
        let g = generate(&config, 7);
        let instance = g.instance().unwrap();
        assert_eq!(instance.visit_count(), config.visits);
        for v in instance.visits() {
            assert!(v.eta_ms >= 0 && v.eta_ms <= 16 * HOUR_MS);
            assert!(v.etd_ms >= v.eta_ms + v.base_duration_ms());
        }
    }

    #[test]
    fn test_out_of_range_ratios_are_clamped() {
        let config: GeneratorConfig = serde_json::from_str(
            r#"{"qualified_dock_ratio": 1.5, "qualified_staff_ratio": -0.2, "restricted_dock_ratio": 7}"#,
        )
        .unwrap();
        let g = generate(&config, 3);
        assert!(g
            .docks
            .iter()
            .all(|d| d.required_qualifications.contains(CRANE_OPERATOR)));
        assert!(g.staff.iter().all(|m| m.qualifications.is_empty()));
        assert!(g.docks[1..].iter().all(|d| !d.vessel_types.is_empty()));

        assert_eq!(probability(f64::NAN), 0.0);
        assert_eq!(probability(0.25), 0.25);
    }

    #[test]
    fn test_config_from_json() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"visits": 4, "docks": 1, "work_minutes": [60, 60]}"#).unwrap();
        let g = generate(&config, 1);
        assert_eq!(g.visits.len(), 4);
        assert!(g
            .visits
            .iter()
            .all(|v| v.base_duration_ms() == 60 * MINUTE_MS));
    }
}
