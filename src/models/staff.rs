//! Staff model.
//!
//! Staff members carry shift availability and qualifications. Operations
//! need their whole interval covered by qualified, unbooked staff.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::TimeWindow;

/// A staff member who can work dock operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    /// Unique staff identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Availability intervals, ordered and non-overlapping.
    #[serde(default)]
    pub availability: Vec<TimeWindow>,
    /// Qualifications held.
    #[serde(default)]
    pub qualifications: BTreeSet<String>,
}

impl StaffMember {
    /// Creates a staff member with no availability.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            availability: Vec::new(),
            qualifications: BTreeSet::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds an availability interval.
    pub fn with_window(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.availability.push(TimeWindow::new(start_ms, end_ms));
        self
    }

    /// Adds a qualification.
    pub fn with_qualification(mut self, qualification: impl Into<String>) -> Self {
        self.qualifications.insert(qualification.into());
        self
    }

    /// Whether the member holds every qualification in `required`.
    pub fn is_qualified_for(&self, required: &BTreeSet<String>) -> bool {
        required.is_subset(&self.qualifications)
    }

    /// Whether one availability interval covers `window` entirely.
    pub fn is_available_for(&self, window: &TimeWindow) -> bool {
        self.availability.iter().any(|a| a.covers(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_builder() {
        let s = StaffMember::new("S1")
            .with_name("Ana")
            .with_window(0, 8_000)
            .with_window(16_000, 24_000)
            .with_qualification("crane_operator");

        assert_eq!(s.id, "S1");
        assert_eq!(s.name, "Ana");
        assert_eq!(s.availability.len(), 2);
        assert!(s.qualifications.contains("crane_operator"));
    }

    #[test]
    fn test_qualification_subset() {
        let s = StaffMember::new("S1")
            .with_qualification("crane_operator")
            .with_qualification("lashing");

        let mut required = BTreeSet::new();
        assert!(s.is_qualified_for(&required));

        required.insert("crane_operator".to_string());
        assert!(s.is_qualified_for(&required));

        required.insert("hazmat".to_string());
        assert!(!s.is_qualified_for(&required));
    }

    #[test]
    fn test_available_for_window() {
        let s = StaffMember::new("S1").with_window(0, 8_000);
        assert!(s.is_available_for(&TimeWindow::new(1_000, 8_000)));
        assert!(!s.is_available_for(&TimeWindow::new(7_000, 9_000)));
    }
}
