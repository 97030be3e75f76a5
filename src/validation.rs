//! Input validation and schedule verification.
//!
//! [`validate_input`] checks the structural integrity of visit, dock and
//! staff records before an instance is built. Detects:
//! - Duplicate IDs
//! - Unknown dock references and visits no dock accepts
//! - Inverted ETA/ETD windows and negative durations
//! - Malformed or overlapping staff availability
//!
//! [`verify_schedule`] checks a produced schedule against its instance and
//! reports every broken invariant as a [`Violation`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instance::Instance;
use crate::models::{DailySchedule, Dock, StaffMember, TimeWindow, VesselVisit};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A visit names a dock that is not in the roster.
    UnknownDock,
    /// No dock in the roster accepts the visit.
    IncompatibleVesselType,
    /// ETA is after ETD.
    InvalidTimeWindow,
    /// A base duration is negative.
    InvalidDuration,
    /// A dock has no usable cranes or a negative capacity ceiling.
    InvalidDock,
    /// A staff interval has `start >= end`.
    MalformedInterval,
    /// Two intervals of one staff member overlap.
    OverlappingAvailability,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DuplicateId => "duplicate id",
            Self::UnknownDock => "unknown dock",
            Self::IncompatibleVesselType => "incompatible vessel type",
            Self::InvalidTimeWindow => "invalid time window",
            Self::InvalidDuration => "invalid duration",
            Self::InvalidDock => "invalid dock",
            Self::MalformedInterval => "malformed interval",
            Self::OverlappingAvailability => "overlapping availability",
        };
        f.write_str(name)
    }
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input records of a scheduling run.
///
/// Checks:
/// 1. No duplicate visit, dock, or staff IDs
/// 2. Every dock has at least one usable crane and a non-negative ceiling
/// 3. Every visit has `ETA <= ETD` and non-negative durations
/// 4. Every dock a visit names exists
/// 5. At least one dock accepts each visit
/// 6. Staff intervals are well-formed and do not overlap per member
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    visits: &[VesselVisit],
    docks: &[Dock],
    staff: &[StaffMember],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut dock_codes = HashSet::new();
    for dock in docks {
        if !dock_codes.insert(dock.code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate dock code: {}", dock.code),
            ));
        }
        if dock.usable_cranes() == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDock,
                format!("Dock '{}' has no usable cranes", dock.code),
            ));
        }
        if let Some(ceiling) = dock.capacity_ceiling {
            if ceiling.is_nan() || ceiling < 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidDock,
                    format!("Dock '{}' has capacity ceiling {ceiling}", dock.code),
                ));
            }
        }
    }

    let mut visit_ids = HashSet::new();
    for visit in visits {
        if !visit_ids.insert(visit.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate visit ID: {}", visit.id),
            ));
        }

        if visit.eta_ms > visit.etd_ms {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeWindow,
                format!(
                    "Visit '{}' arrives at {} after its departure {}",
                    visit.id, visit.eta_ms, visit.etd_ms
                ),
            ));
        }

        if visit.loading_ms < 0 || visit.unloading_ms < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("Visit '{}' has a negative base duration", visit.id),
            ));
        }

        let mut unknown = false;
        for code in &visit.allowed_docks {
            if !dock_codes.contains(code.as_str()) {
                unknown = true;
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownDock,
                    format!("Visit '{}' references unknown dock '{code}'", visit.id),
                ));
            }
        }

        let accepted = docks
            .iter()
            .any(|d| visit.allows_dock(&d.code) && d.accepts_vessel_type(&visit.vessel_type));
        if !accepted && !unknown {
            errors.push(ValidationError::new(
                ValidationErrorKind::IncompatibleVesselType,
                format!(
                    "No dock accepts visit '{}' (vessel type '{}')",
                    visit.id, visit.vessel_type
                ),
            ));
        }
    }

    let mut staff_ids = HashSet::new();
    for member in staff {
        if !staff_ids.insert(member.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate staff ID: {}", member.id),
            ));
        }
        errors.extend(check_availability(member));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_availability(member: &StaffMember) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for w in &member.availability {
        if w.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MalformedInterval,
                format!(
                    "Staff '{}' has interval [{}, {})",
                    member.id, w.start_ms, w.end_ms
                ),
            ));
        }
    }

    let mut sorted: Vec<TimeWindow> = member
        .availability
        .iter()
        .copied()
        .filter(|w| !w.is_empty())
        .collect();
    sorted.sort();
    for pair in sorted.windows(2) {
        if pair[0].overlaps(&pair[1]) {
            errors.push(ValidationError::new(
                ValidationErrorKind::OverlappingAvailability,
                format!(
                    "Staff '{}' intervals [{}, {}) and [{}, {}) overlap",
                    member.id, pair[0].start_ms, pair[0].end_ms, pair[1].start_ms, pair[1].end_ms
                ),
            ));
        }
    }

    errors
}

/// A broken schedule invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity ID (visit, dock, or staff member).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Two operations share a dock at the same time.
    DockOverlap,
    /// Work starts before the vessel arrives.
    StartsBeforeArrival,
    /// Work falls outside the scheduled day.
    OutsideDay,
    /// More cranes than the dock allows per operation.
    CraneLimitExceeded,
    /// Operation placed on a dock the visit may not use.
    IncompatibleDock,
    /// Part of an operation has no staff.
    StaffUncovered,
    /// Staff assigned outside their availability or without qualification.
    StaffUnavailable,
    /// Staff assigned to overlapping operations.
    StaffDoubleBooked,
    /// A visit of the day is neither scheduled nor listed unassigned.
    MissingVisit,
}

impl Violation {
    fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}

/// Verifies a schedule against the instance it was produced for.
///
/// Returns an empty list for a valid schedule.
pub fn verify_schedule(schedule: &DailySchedule, instance: &Instance) -> Vec<Violation> {
    let mut violations = Vec::new();
    let day = instance.day().window();

    let mut by_dock: BTreeMap<&str, Vec<TimeWindow>> = BTreeMap::new();
    let mut by_staff: BTreeMap<&str, Vec<TimeWindow>> = BTreeMap::new();

    for op in &schedule.operations {
        let window = op.window();

        if !day.covers(&window) {
            violations.push(Violation::new(
                ViolationType::OutsideDay,
                &op.visit_id,
                format!("[{}, {}) leaves the day", op.start_ms, op.end_ms),
            ));
        }

        let (Some(v), Some(d)) = (
            instance.visit_index(&op.visit_id),
            instance.dock_index(&op.dock),
        ) else {
            violations.push(Violation::new(
                ViolationType::IncompatibleDock,
                &op.visit_id,
                format!("unknown visit or dock '{}'", op.dock),
            ));
            continue;
        };
        let visit = &instance.visits()[v];
        let dock = &instance.docks()[d];

        if op.start_ms < visit.eta_ms {
            violations.push(Violation::new(
                ViolationType::StartsBeforeArrival,
                &op.visit_id,
                format!("starts at {} before ETA {}", op.start_ms, visit.eta_ms),
            ));
        }
        if !instance.is_compatible(v, d) {
            violations.push(Violation::new(
                ViolationType::IncompatibleDock,
                &op.visit_id,
                format!("dock '{}' does not accept the visit", op.dock),
            ));
        }
        if op.crane_count == 0 || op.crane_count > dock.usable_cranes() {
            violations.push(Violation::new(
                ViolationType::CraneLimitExceeded,
                &op.visit_id,
                format!("{} cranes on dock '{}'", op.crane_count, op.dock),
            ));
        }

        let mut covered = op.start_ms;
        let mut pieces: Vec<&TimeWindow> = op.staff.iter().map(|s| &s.window).collect();
        pieces.sort();
        for piece in pieces {
            if piece.start_ms > covered {
                break;
            }
            covered = covered.max(piece.end_ms);
        }
        if covered < op.end_ms {
            violations.push(Violation::new(
                ViolationType::StaffUncovered,
                &op.visit_id,
                format!("staff cover ends at {covered}, work ends at {}", op.end_ms),
            ));
        }

        for assignment in &op.staff {
            let member = instance
                .staff()
                .iter()
                .find(|s| s.id == assignment.staff_id);
            let ok = member.is_some_and(|m| {
                m.is_available_for(&assignment.window)
                    && m.is_qualified_for(&dock.required_qualifications)
                    && window.covers(&assignment.window)
            });
            if !ok {
                violations.push(Violation::new(
                    ViolationType::StaffUnavailable,
                    &assignment.staff_id,
                    format!("cannot work visit '{}'", op.visit_id),
                ));
            }
            by_staff
                .entry(assignment.staff_id.as_str())
                .or_default()
                .push(assignment.window);
        }

        by_dock.entry(op.dock.as_str()).or_default().push(window);
    }

    for (dock, mut windows) in by_dock {
        windows.sort();
        if windows.windows(2).any(|p| p[0].overlaps(&p[1])) {
            violations.push(Violation::new(
                ViolationType::DockOverlap,
                dock,
                "operations overlap",
            ));
        }
    }

    for (staff, mut windows) in by_staff {
        windows.sort();
        if windows.windows(2).any(|p| p[0].overlaps(&p[1])) {
            violations.push(Violation::new(
                ViolationType::StaffDoubleBooked,
                staff,
                "assigned to overlapping work",
            ));
        }
    }

    for visit in instance.visits() {
        if schedule.operation_for_visit(&visit.id).is_none() && !schedule.is_unassigned(&visit.id)
        {
            violations.push(Violation::new(
                ViolationType::MissingVisit,
                &visit.id,
                "dropped from the schedule",
            ));
        }
    }

    violations
}
