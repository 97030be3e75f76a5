//! Shared fixtures for unit tests.

use chrono::NaiveDate;
use tracing_subscriber::{fmt, EnvFilter};

use crate::instance::Instance;
use crate::models::{DayWindow, Dock, StaffMember, VesselVisit, DAY_MS, MINUTE_MS};

/// Routes `tracing` output to the test harness. `RUST_LOG` overrides the
/// default `warn` filter.
pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

pub(crate) fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

pub(crate) fn day() -> DayWindow {
    DayWindow::from_date(epoch(), epoch())
}

pub(crate) fn all_day_staff(count: usize) -> Vec<StaffMember> {
    (1..=count)
        .map(|n| StaffMember::new(format!("S{n}")).with_window(0, DAY_MS))
        .collect()
}

/// A visit with `work_min` minutes of single-crane work split evenly
/// between loading and unloading, due to leave `slack_min` minutes after
/// that work could finish.
pub(crate) fn visit(id: &str, eta_min: i64, work_min: i64, slack_min: i64) -> VesselVisit {
    let work = work_min * MINUTE_MS;
    VesselVisit::new(
        id,
        format!("{id}-vessel"),
        eta_min * MINUTE_MS,
        (eta_min + work_min + slack_min) * MINUTE_MS,
    )
    .with_loading(work / 2)
    .with_unloading(work - work / 2)
}

/// Two single-crane docks, visits arriving at 0, 0 and 30 minutes with
/// 30 minutes of work each and no slack.
pub(crate) fn two_dock_instance() -> Instance {
    let visits = vec![visit("V1", 0, 30, 0), visit("V2", 0, 30, 0), visit("V3", 30, 30, 0)];
    let docks = vec![Dock::new("A", 1), Dock::new("B", 1)];
    Instance::build(&visits, &docks, &all_day_staff(3), day()).unwrap()
}

/// One single-crane dock, two visits at time 0 needing 60 minutes each.
pub(crate) fn single_dock_instance() -> Instance {
    let visits = vec![visit("V1", 0, 60, 0), visit("V2", 0, 60, 0)];
    let docks = vec![Dock::new("A", 1)];
    Instance::build(&visits, &docks, &all_day_staff(1), day()).unwrap()
}

/// Two docks with two parallel cranes each and a tight arrival wave, so
/// crane count and dock choice both matter.
pub(crate) fn multi_crane_instance() -> Instance {
    let visits = vec![
        visit("V1", 0, 120, 30),
        visit("V2", 0, 120, 30),
        visit("V3", 10, 90, 0),
        visit("V4", 20, 60, 10),
        visit("V5", 40, 120, 0),
    ];
    let docks = vec![Dock::new("A", 2), Dock::new("B", 2)];
    Instance::build(&visits, &docks, &all_day_staff(4), day()).unwrap()
}
