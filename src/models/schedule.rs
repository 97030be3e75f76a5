//! Schedule (solution) model.
//!
//! A daily schedule lists the dock operations placed on one calendar day
//! and the visits that could not be placed. Producers build it once;
//! consumers (comparator, rebalancer) derive new schedules from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{DayWindow, TimeWindow, HOUR_MS};

/// A staff member's share of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffAssignment {
    /// Assigned staff ID.
    pub staff_id: String,
    /// Sub-interval of the operation the member covers.
    pub window: TimeWindow,
}

impl StaffAssignment {
    /// Creates a staff assignment.
    pub fn new(staff_id: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            staff_id: staff_id.into(),
            window,
        }
    }
}

/// A cargo operation: one visit worked at one dock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Visit ID.
    pub visit_id: String,
    /// Vessel reference (denormalized).
    pub vessel: String,
    /// Assigned dock code.
    pub dock: String,
    /// Labels of the cranes used.
    pub cranes: Vec<String>,
    /// Cranes working the vessel in parallel.
    pub crane_count: u32,
    /// Cranes installed on the dock.
    pub dock_cranes: u32,
    /// Start time (ms).
    pub start_ms: i64,
    /// End time (ms).
    pub end_ms: i64,
    /// Loading phase duration after crane speed-up (ms).
    pub loading_ms: i64,
    /// Unloading phase duration after crane speed-up (ms).
    pub unloading_ms: i64,
    /// Staff covering the operation.
    pub staff: Vec<StaffAssignment>,
    /// The visit's ETD, kept for delay computation.
    pub etd_ms: i64,
}

impl Operation {
    /// Occupied interval.
    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_ms, self.end_ms)
    }

    /// Total duration (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Realized departure: the vessel leaves when work ends.
    #[inline]
    pub fn real_departure_ms(&self) -> i64 {
        self.end_ms
    }

    /// `max(0, real departure - ETD)`.
    #[inline]
    pub fn departure_delay_ms(&self) -> i64 {
        (self.end_ms - self.etd_ms).max(0)
    }

    /// Duration times crane count, in hours.
    pub fn crane_hours(&self) -> f64 {
        (self.duration_ms() * i64::from(self.crane_count)) as f64 / HOUR_MS as f64
    }
}

/// Why a visit has no operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnassignedReason {
    /// No dock/crane/staff combination fits within the day.
    NoFeasiblePlacement,
    /// The search left the visit out in favour of a cheaper overall plan.
    Deferred,
}

/// A visit that appears in the day's demand but not in its operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignedVisit {
    /// Visit ID.
    pub visit_id: String,
    /// Vessel reference.
    pub vessel: String,
    /// Cause.
    pub reason: UnassignedReason,
}

/// One day's operations plus unplaced visits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySchedule {
    /// The day scheduled.
    pub day: DayWindow,
    /// Operations ordered by start time, then dock code, then visit ID.
    pub operations: Vec<Operation>,
    /// Visits without an operation.
    pub unassigned: Vec<UnassignedVisit>,
}

/// Trace record emitted by a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationStep {
    /// Step number within its run, starting at 1.
    pub step: usize,
    /// Total departure delay after the step (ms).
    pub total_delay_ms: i64,
    /// Cranes in use summed over all operations.
    pub total_cranes: u32,
    /// Strategy that produced the step.
    pub strategy: String,
    /// What changed.
    pub description: String,
}

impl DailySchedule {
    /// Creates an empty schedule for `day`.
    pub fn new(day: DayWindow) -> Self {
        Self {
            day,
            operations: Vec::new(),
            unassigned: Vec::new(),
        }
    }

    /// Adds an operation.
    pub fn add_operation(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Adds an unassigned visit.
    pub fn add_unassigned(&mut self, visit: UnassignedVisit) {
        self.unassigned.push(visit);
    }

    /// Puts operations and unassigned visits into canonical order.
    pub fn normalize(&mut self) {
        self.operations.sort_by(|a, b| {
            a.start_ms
                .cmp(&b.start_ms)
                .then_with(|| a.dock.cmp(&b.dock))
                .then_with(|| a.visit_id.cmp(&b.visit_id))
        });
        self.unassigned.sort_by(|a, b| a.visit_id.cmp(&b.visit_id));
    }

    /// Sum of departure delays (ms).
    pub fn total_delay_ms(&self) -> i64 {
        self.operations.iter().map(Operation::departure_delay_ms).sum()
    }

    /// Largest single departure delay (ms).
    pub fn max_delay_ms(&self) -> i64 {
        self.operations
            .iter()
            .map(Operation::departure_delay_ms)
            .max()
            .unwrap_or(0)
    }

    /// Cranes in use summed over operations.
    pub fn total_cranes(&self) -> u32 {
        self.operations.iter().map(|o| o.crane_count).sum()
    }

    /// Crane-hours over all operations.
    pub fn total_crane_hours(&self) -> f64 {
        self.operations.iter().map(Operation::crane_hours).sum()
    }

    /// Crane-hours per dock that has at least one operation.
    pub fn crane_hours_by_dock(&self) -> BTreeMap<String, f64> {
        let mut loads = BTreeMap::new();
        for op in &self.operations {
            *loads.entry(op.dock.clone()).or_insert(0.0) += op.crane_hours();
        }
        loads
    }

    /// Finds the operation for a visit.
    pub fn operation_for_visit(&self, visit_id: &str) -> Option<&Operation> {
        self.operations.iter().find(|o| o.visit_id == visit_id)
    }

    /// Returns all operations on a dock.
    pub fn operations_on_dock(&self, dock: &str) -> Vec<&Operation> {
        self.operations.iter().filter(|o| o.dock == dock).collect()
    }

    /// Whether a visit is listed as unassigned.
    pub fn is_unassigned(&self, visit_id: &str) -> bool {
        self.unassigned.iter().any(|u| u.visit_id == visit_id)
    }

    /// Latest end time across operations (ms).
    pub fn makespan_ms(&self) -> i64 {
        self.operations
            .iter()
            .map(|o| o.end_ms)
            .max()
            .unwrap_or(self.day.start_ms)
    }

    /// Number of operations.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }
}
