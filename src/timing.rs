//! Operation timing and staff cover.
//!
//! # Duration Model
//! Each cargo phase runs `ceil(base / k)` with `k` cranes working in
//! parallel; loading and unloading do not overlap, so the operation takes
//! the sum of both phases. Work starts when the vessel has arrived, the
//! dock is free and the day has begun, and must end within the day.
//!
//! # Staff Cover
//! The operation interval must be covered end to end by qualified staff
//! who are not booked elsewhere, using as few distinct members as possible.
//! Crews are tried by size, and within a size in staff-id order; the first
//! crew whose free time covers the interval wins. Its hand-over points come
//! from a farthest-reach sweep (Cormen et al., interval point cover), which
//! also bounds the crew size before the search starts.

use std::collections::BTreeSet;

use crate::config::CraneMode;
use crate::instance::Instance;
use crate::models::{subtract_windows, DayWindow, Dock, StaffMember, TimeWindow, VesselVisit};

/// Timing of one visit at one dock with a fixed crane count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTiming {
    /// Start (ms).
    pub start_ms: i64,
    /// End (ms).
    pub end_ms: i64,
    /// Loading phase with crane speed-up (ms).
    pub loading_ms: i64,
    /// Unloading phase with crane speed-up (ms).
    pub unloading_ms: i64,
    /// `max(0, end - ETD)` (ms).
    pub delay_ms: i64,
}

impl OperationTiming {
    /// Occupied interval.
    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_ms, self.end_ms)
    }
}

/// Duration of one phase worked by `cranes` cranes.
#[inline]
pub fn phase_duration_ms(base_ms: i64, cranes: u32) -> i64 {
    let k = i64::from(cranes.max(1));
    base_ms / k + i64::from(base_ms % k != 0)
}

/// Computes when a visit would be worked at a dock.
///
/// Returns `None` when `cranes` is outside `1..=dock.usable_cranes()` or the
/// work would run past the end of `day` (or past the end of the time axis).
pub fn compute_timing(
    visit: &VesselVisit,
    dock: &Dock,
    cranes: u32,
    dock_free_ms: i64,
    day: &DayWindow,
) -> Option<OperationTiming> {
    if cranes == 0 || cranes > dock.usable_cranes() {
        return None;
    }

    let loading_ms = phase_duration_ms(visit.loading_ms, cranes);
    let unloading_ms = phase_duration_ms(visit.unloading_ms, cranes);
    let start_ms = visit.eta_ms.max(dock_free_ms).max(day.start_ms);
    let end_ms = start_ms
        .checked_add(loading_ms)
        .and_then(|t| t.checked_add(unloading_ms))
        .filter(|&end| end <= day.end_ms)?;

    Some(OperationTiming {
        start_ms,
        end_ms,
        loading_ms,
        unloading_ms,
        delay_ms: end_ms.saturating_sub(visit.etd_ms).max(0),
    })
}

/// Free time of one qualified staff member: `(staff index, pieces)`.
type FreeTime = (usize, Vec<TimeWindow>);

/// Picks the fewest distinct staff members covering `window`.
///
/// `booked[i]` holds the intervals staff member `i` already works. Returns
/// `(staff index, sub-interval)` pairs in time order, or `None` when some
/// instant of the window has no qualified free member. Among crews of equal
/// size the one with the lowest staff indices wins.
pub fn assign_staff(
    staff: &[StaffMember],
    booked: &[Vec<TimeWindow>],
    required: &BTreeSet<String>,
    window: TimeWindow,
) -> Option<Vec<(usize, TimeWindow)>> {
    let free: Vec<FreeTime> = staff
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_qualified_for(required))
        .map(|(i, m)| {
            let busy = booked.get(i).map(Vec::as_slice).unwrap_or_default();
            let pieces: Vec<TimeWindow> = subtract_windows(&m.availability, busy)
                .into_iter()
                .filter(|p| p.overlaps(&window))
                .collect();
            (i, pieces)
        })
        .filter(|(_, pieces)| !pieces.is_empty())
        .collect();

    let everyone: Vec<usize> = (0..free.len()).collect();
    let fallback = sweep(&free, &everyone, window)?;
    let bound = crew_size(&fallback);

    let mut crew = Vec::with_capacity(bound);
    for size in 1..bound {
        if let Some(picks) = smallest_crew(&free, window, size, 0, &mut crew) {
            return Some(picks);
        }
    }
    Some(fallback)
}

/// Number of distinct members in a cover.
fn crew_size(picks: &[(usize, TimeWindow)]) -> usize {
    picks.iter().map(|(i, _)| *i).collect::<BTreeSet<_>>().len()
}

/// First crew of exactly `size` members, drawn from `free[from..]` in order,
/// that covers `window`.
fn smallest_crew(
    free: &[FreeTime],
    window: TimeWindow,
    size: usize,
    from: usize,
    crew: &mut Vec<usize>,
) -> Option<Vec<(usize, TimeWindow)>> {
    if crew.len() == size {
        return sweep(free, crew, window);
    }
    let needed = size - crew.len();
    for next in from..=free.len().saturating_sub(needed) {
        crew.push(next);
        let found = smallest_crew(free, window, size, next + 1, crew);
        crew.pop();
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Farthest-reach cover of `window` using the members `free[crew]`.
/// Adjacent pieces of the same member are merged.
fn sweep(free: &[FreeTime], crew: &[usize], window: TimeWindow) -> Option<Vec<(usize, TimeWindow)>> {
    let mut picks: Vec<(usize, TimeWindow)> = Vec::new();
    let mut cursor = window.start_ms;

    while cursor < window.end_ms {
        let mut best: Option<(usize, i64)> = None;
        for (i, pieces) in crew.iter().map(|&c| &free[c]) {
            for piece in pieces.iter().filter(|p| p.contains(cursor)) {
                let reach = piece.end_ms.min(window.end_ms);
                if best.map_or(true, |(_, b)| reach > b) {
                    best = Some((*i, reach));
                }
            }
        }

        let (member, reach) = best?;
        match picks.last_mut() {
            Some((last, piece)) if *last == member && piece.end_ms == cursor => {
                piece.end_ms = reach;
            }
            _ => picks.push((member, TimeWindow::new(cursor, reach))),
        }
        cursor = reach;
    }

    Some(picks)
}

/// A feasible placement of one visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Placement {
    pub visit: usize,
    pub dock: usize,
    pub cranes: u32,
    pub timing: OperationTiming,
    pub staff: Vec<(usize, TimeWindow)>,
}

/// Per-run mutable state: when each dock frees up and what staff time is
/// already booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Timeline {
    dock_free: Vec<i64>,
    staff_busy: Vec<Vec<TimeWindow>>,
}

impl Timeline {
    pub fn new(instance: &Instance) -> Self {
        Self {
            dock_free: vec![instance.day().start_ms; instance.docks().len()],
            staff_busy: vec![Vec::new(); instance.staff().len()],
        }
    }

    /// Tries to place `visit` on `dock` with `cranes` cranes.
    pub fn plan(
        &self,
        instance: &Instance,
        visit: usize,
        dock: usize,
        cranes: u32,
    ) -> Option<Placement> {
        let d = &instance.docks()[dock];
        let timing = compute_timing(
            &instance.visits()[visit],
            d,
            cranes,
            self.dock_free[dock],
            instance.day(),
        )?;
        let staff = assign_staff(
            instance.staff(),
            &self.staff_busy,
            &d.required_qualifications,
            timing.window(),
        )?;
        Some(Placement {
            visit,
            dock,
            cranes,
            timing,
            staff,
        })
    }

    /// Books a placement.
    pub fn commit(&mut self, placement: &Placement) {
        self.dock_free[placement.dock] = placement.timing.end_ms;
        for (member, window) in &placement.staff {
            self.staff_busy[*member].push(*window);
        }
    }
}

/// `(dock, cranes)` pairs a visit may try, in dock-code then crane order.
pub(crate) fn candidate_pairs(
    instance: &Instance,
    visit: usize,
    mode: CraneMode,
) -> Vec<(usize, u32)> {
    instance
        .compatible_docks(visit)
        .iter()
        .flat_map(|&d| (1..=mode.max_cranes(&instance.docks()[d])).map(move |k| (d, k)))
        .collect()
}
