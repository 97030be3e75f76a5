//! Time windows and planning days.
//!
//! # Time Model
//! All times are in milliseconds relative to a scheduling epoch, which is
//! midnight of a configured calendar date. A [`DayWindow`] maps a
//! `chrono::NaiveDate` onto the half-open range it covers on that axis.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Milliseconds in one minute.
pub const MINUTE_MS: i64 = 60_000;
/// Milliseconds in one hour.
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeWindow {
    /// Interval start (ms, inclusive).
    pub start_ms: i64,
    /// Interval end (ms, exclusive).
    pub end_ms: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Duration of this window (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Whether the window is empty or inverted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end_ms <= self.start_ms
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Whether `other` lies entirely inside this window.
    #[inline]
    pub fn covers(&self, other: &Self) -> bool {
        self.start_ms <= other.start_ms && other.end_ms <= self.end_ms
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    /// The common part of two windows, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start_ms.max(other.start_ms);
        let end = self.end_ms.min(other.end_ms);
        if end > start {
            Some(Self::new(start, end))
        } else {
            None
        }
    }
}

/// Removes `busy` periods from `windows`.
///
/// Both inputs may be unsorted. The result is sorted by start and contains
/// only non-empty pieces.
pub fn subtract_windows(windows: &[TimeWindow], busy: &[TimeWindow]) -> Vec<TimeWindow> {
    let mut pieces: Vec<TimeWindow> = windows.iter().copied().filter(|w| !w.is_empty()).collect();

    for b in busy {
        let mut next = Vec::with_capacity(pieces.len() + 1);
        for p in pieces {
            if !p.overlaps(b) {
                next.push(p);
                continue;
            }
            if p.start_ms < b.start_ms {
                next.push(TimeWindow::new(p.start_ms, b.start_ms));
            }
            if b.end_ms < p.end_ms {
                next.push(TimeWindow::new(b.end_ms, p.end_ms));
            }
        }
        pieces = next;
    }

    pieces.sort();
    pieces
}

/// One calendar day on the scheduling time axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayWindow {
    /// Calendar date.
    pub date: NaiveDate,
    /// Day start (ms, inclusive).
    pub start_ms: i64,
    /// Day end (ms, exclusive).
    pub end_ms: i64,
}

impl DayWindow {
    /// Places `date` on the axis whose t=0 is midnight of `epoch`.
    pub fn from_date(epoch: NaiveDate, date: NaiveDate) -> Self {
        let start_ms = date.signed_duration_since(epoch).num_milliseconds();
        Self {
            date,
            start_ms,
            end_ms: start_ms + DAY_MS,
        }
    }

    /// The day as a plain window.
    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_ms, self.end_ms)
    }

    /// Whether the closed range `[from_ms, to_ms]` touches this day.
    pub fn intersects(&self, from_ms: i64, to_ms: i64) -> bool {
        from_ms < self.end_ms && to_ms >= self.start_ms
    }
}
