//! Port scheduling domain models.
//!
//! Provides the input records supplied by the surrounding system and the
//! schedule records the engine produces.
//!
//! # Domain Mappings
//!
//! | dock-schedule | Scheduling theory | Port operations |
//! |---------------|-------------------|-----------------|
//! | VesselVisit | Job with release/due date | Vessel call (ETA/ETD) |
//! | Dock | Machine with parallel speed-up | Berth with quay cranes |
//! | StaffMember | Renewable human resource | Crane operator shift |
//! | DailySchedule | Schedule | Berth plan for one day |

mod calendar;
mod dock;
mod schedule;
mod staff;
mod visit;

pub use calendar::{subtract_windows, DayWindow, TimeWindow, DAY_MS, HOUR_MS, MINUTE_MS};
pub use dock::Dock;
pub use schedule::{
    DailySchedule, Operation, OptimizationStep, StaffAssignment, UnassignedReason,
    UnassignedVisit,
};
pub use staff::StaffMember;
pub use visit::VesselVisit;
