//! Dock model.
//!
//! A dock berths one vessel at a time and works it with up to
//! `max_parallel_cranes` of its `crane_count` cranes. Docks restrict which
//! vessel types they accept and which staff qualifications are needed to
//! operate them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A dock (berth) that handles vessel operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dock {
    /// Unique dock code. Docks are ordered by code for tie-breaking.
    pub code: String,
    /// Total cranes installed on the dock.
    pub crane_count: u32,
    /// Maximum cranes usable in parallel by a single operation.
    pub max_parallel_cranes: u32,
    /// Vessel types the dock accepts. Empty = all types.
    #[serde(default)]
    pub vessel_types: BTreeSet<String>,
    /// Qualifications every assigned staff member must hold.
    #[serde(default)]
    pub required_qualifications: BTreeSet<String>,
    /// Maximum load in crane-hours the rebalancer may put on this dock.
    #[serde(default)]
    pub capacity_ceiling: Option<f64>,
    /// Location and geometry (carried through, not used for scheduling).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Dock {
    /// Creates a dock whose cranes may all work one vessel in parallel.
    pub fn new(code: impl Into<String>, crane_count: u32) -> Self {
        Self {
            code: code.into(),
            crane_count,
            max_parallel_cranes: crane_count,
            vessel_types: BTreeSet::new(),
            required_qualifications: BTreeSet::new(),
            capacity_ceiling: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets the per-operation crane parallelism.
    pub fn with_max_parallel(mut self, max_parallel_cranes: u32) -> Self {
        self.max_parallel_cranes = max_parallel_cranes;
        self
    }

    /// Adds an accepted vessel type.
    pub fn with_vessel_type(mut self, vessel_type: impl Into<String>) -> Self {
        self.vessel_types.insert(vessel_type.into());
        self
    }

    /// Adds a required staff qualification.
    pub fn with_required_qualification(mut self, qualification: impl Into<String>) -> Self {
        self.required_qualifications.insert(qualification.into());
        self
    }

    /// Sets the crane-hour capacity ceiling.
    pub fn with_capacity_ceiling(mut self, crane_hours: f64) -> Self {
        self.capacity_ceiling = Some(crane_hours);
        self
    }

    /// Adds a location/geometry attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Cranes a single operation can actually use.
    #[inline]
    pub fn usable_cranes(&self) -> u32 {
        self.max_parallel_cranes.min(self.crane_count)
    }

    /// Whether the dock accepts the given vessel type.
    pub fn accepts_vessel_type(&self, vessel_type: &str) -> bool {
        self.vessel_types.is_empty() || self.vessel_types.contains(vessel_type)
    }

    /// Labels of the first `count` cranes, e.g. `["A-C1", "A-C2"]`.
    pub fn crane_labels(&self, count: u32) -> Vec<String> {
        (1..=count).map(|n| format!("{}-C{n}", self.code)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dock_builder() {
        let d = Dock::new("A", 4)
            .with_max_parallel(2)
            .with_vessel_type("container")
            .with_required_qualification("crane_operator")
            .with_capacity_ceiling(12.5)
            .with_attribute("quay", "north");

        assert_eq!(d.code, "A");
        assert_eq!(d.crane_count, 4);
        assert_eq!(d.usable_cranes(), 2);
        assert!(d.accepts_vessel_type("container"));
        assert!(!d.accepts_vessel_type("tanker"));
        assert!(d.required_qualifications.contains("crane_operator"));
        assert_eq!(d.capacity_ceiling, Some(12.5));
        assert_eq!(d.attributes["quay"], "north");
    }

    #[test]
    fn test_dock_accepts_any_type_when_unrestricted() {
        let d = Dock::new("B", 1);
        assert!(d.accepts_vessel_type("tanker"));
        assert!(d.accepts_vessel_type("ro-ro"));
    }

    #[test]
    fn test_usable_cranes_capped_by_installed() {
        let d = Dock::new("C", 2).with_max_parallel(5);
        assert_eq!(d.usable_cranes(), 2);
    }

    #[test]
    fn test_crane_labels() {
        let d = Dock::new("Q7", 3);
        assert_eq!(d.crane_labels(2), vec!["Q7-C1", "Q7-C2"]);
        assert!(d.crane_labels(0).is_empty());
    }

    #[test]
    fn test_dock_deserialize_defaults() {
        let d: Dock =
            serde_json::from_str(r#"{"code":"A","crane_count":2,"max_parallel_cranes":1}"#)
                .unwrap();
        assert!(d.vessel_types.is_empty());
        assert_eq!(d.capacity_ceiling, None);
        assert_eq!(d.usable_cranes(), 1);
    }
}
