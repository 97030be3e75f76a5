//! Scheduling instance for one day.
//!
//! An [`Instance`] is the validated, normalized snapshot every strategy,
//! the comparator and the rebalancer read from. Visits are restricted to
//! the requested day and kept in `(ETA, id)` order; positions in that order
//! index every per-visit array in the crate.

use tracing::debug;

use crate::error::{PlanningError, Result};
use crate::models::{DayWindow, Dock, StaffMember, VesselVisit};
use crate::validation::validate_input;

/// Immutable scheduling input for one day.
#[derive(Debug, Clone)]
pub struct Instance {
    day: DayWindow,
    visits: Vec<VesselVisit>,
    docks: Vec<Dock>,
    staff: Vec<StaffMember>,
    compatible: Vec<Vec<usize>>,
}

impl Instance {
    /// Validates the rosters and builds the instance for `day`.
    ///
    /// Validation covers the whole roster, not only the day's visits, so a
    /// broken record is reported whichever day is requested.
    ///
    /// # Errors
    /// [`PlanningError::Validation`] listing every detected problem.
    pub fn build(
        visits: &[VesselVisit],
        docks: &[Dock],
        staff: &[StaffMember],
        day: DayWindow,
    ) -> Result<Self> {
        validate_input(visits, docks, staff).map_err(PlanningError::Validation)?;

        let mut docks = docks.to_vec();
        docks.sort_by(|a, b| a.code.cmp(&b.code));

        let mut staff = staff.to_vec();
        staff.sort_by(|a, b| a.id.cmp(&b.id));
        for member in &mut staff {
            member.availability.sort();
        }

        let mut visits: Vec<VesselVisit> = visits
            .iter()
            .filter(|v| day.intersects(v.eta_ms, v.etd_ms))
            .cloned()
            .collect();
        visits.sort_by(|a, b| a.eta_ms.cmp(&b.eta_ms).then_with(|| a.id.cmp(&b.id)));

        let compatible = visits
            .iter()
            .map(|v| {
                docks
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| v.allows_dock(&d.code) && d.accepts_vessel_type(&v.vessel_type))
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        debug!(
            day = %day.date,
            visits = visits.len(),
            docks = docks.len(),
            staff = staff.len(),
            "built scheduling instance"
        );

        Ok(Self {
            day,
            visits,
            docks,
            staff,
            compatible,
        })
    }

    /// The scheduled day.
    #[inline]
    pub fn day(&self) -> &DayWindow {
        &self.day
    }

    /// The day's visits in `(ETA, id)` order.
    #[inline]
    pub fn visits(&self) -> &[VesselVisit] {
        &self.visits
    }

    /// Docks in code order.
    #[inline]
    pub fn docks(&self) -> &[Dock] {
        &self.docks
    }

    /// Staff in ID order.
    #[inline]
    pub fn staff(&self) -> &[StaffMember] {
        &self.staff
    }

    /// Dock indices (code order) the visit at position `visit` may use.
    #[inline]
    pub fn compatible_docks(&self, visit: usize) -> &[usize] {
        &self.compatible[visit]
    }

    /// Whether the visit at `visit` may use the dock at `dock`.
    pub fn is_compatible(&self, visit: usize, dock: usize) -> bool {
        self.compatible[visit].contains(&dock)
    }

    /// Position of a visit by ID.
    pub fn visit_index(&self, id: &str) -> Option<usize> {
        self.visits.iter().position(|v| v.id == id)
    }

    /// Position of a dock by code.
    pub fn dock_index(&self, code: &str) -> Option<usize> {
        self.docks
            .binary_search_by(|d| d.code.as_str().cmp(code))
            .ok()
    }

    /// Position of a staff member by ID.
    pub fn staff_index(&self, id: &str) -> Option<usize> {
        self.staff.binary_search_by(|s| s.id.as_str().cmp(id)).ok()
    }

    /// Number of visits on the day.
    #[inline]
    pub fn visit_count(&self) -> usize {
        self.visits.len()
    }

    /// Whether the day has no demand.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}
