//! Vessel visit model.
//!
//! A visit is one call of a vessel at the port: it arrives at its ETA,
//! needs loading and unloading work, and should leave by its ETD.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A vessel visit awaiting cargo operations.
///
/// # Time Representation
/// ETA/ETD and durations are in milliseconds on the scheduling time axis.
/// Base durations assume a single crane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselVisit {
    /// Unique visit identifier (visit notification number).
    pub id: String,
    /// Vessel reference (name or IMO number).
    pub vessel: String,
    /// Vessel type, matched against dock compatibility.
    #[serde(default)]
    pub vessel_type: String,
    /// Estimated time of arrival (ms).
    pub eta_ms: i64,
    /// Estimated time of departure (ms).
    pub etd_ms: i64,
    /// Single-crane loading duration (ms).
    #[serde(default)]
    pub loading_ms: i64,
    /// Single-crane unloading duration (ms).
    #[serde(default)]
    pub unloading_ms: i64,
    /// Dock codes this visit may use. Empty = any dock accepting its type.
    #[serde(default)]
    pub allowed_docks: BTreeSet<String>,
}

impl VesselVisit {
    /// Creates a visit with no cargo work.
    pub fn new(id: impl Into<String>, vessel: impl Into<String>, eta_ms: i64, etd_ms: i64) -> Self {
        Self {
            id: id.into(),
            vessel: vessel.into(),
            vessel_type: String::new(),
            eta_ms,
            etd_ms,
            loading_ms: 0,
            unloading_ms: 0,
            allowed_docks: BTreeSet::new(),
        }
    }

    /// Sets the vessel type.
    pub fn with_vessel_type(mut self, vessel_type: impl Into<String>) -> Self {
        self.vessel_type = vessel_type.into();
        self
    }

    /// Sets the base loading duration.
    pub fn with_loading(mut self, loading_ms: i64) -> Self {
        self.loading_ms = loading_ms;
        self
    }

    /// Sets the base unloading duration.
    pub fn with_unloading(mut self, unloading_ms: i64) -> Self {
        self.unloading_ms = unloading_ms;
        self
    }

    /// Restricts the visit to a dock (may be called repeatedly).
    pub fn with_allowed_dock(mut self, code: impl Into<String>) -> Self {
        self.allowed_docks.insert(code.into());
        self
    }

    /// Total single-crane work (ms).
    #[inline]
    pub fn base_duration_ms(&self) -> i64 {
        self.loading_ms.saturating_add(self.unloading_ms)
    }

    /// Whether the visit's own dock list permits `code`.
    pub fn allows_dock(&self, code: &str) -> bool {
        self.allowed_docks.is_empty() || self.allowed_docks.contains(code)
    }
}
