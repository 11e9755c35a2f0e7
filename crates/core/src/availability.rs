//! Interval arithmetic for designer availability.
//!
//! A booking blocks its designer for the half-open window
//! `[start - BUFFER_MINUTES, end)`. The same padded shape is used for the
//! stored booking (its *occupied interval*) and for a proposed booking (the
//! *effective query interval*), so two bookings of one designer always keep
//! at least `BUFFER_MINUTES` of preparation time before each start.
//!
//! The buffer protects the leading edge only. A booking ending at 11:00
//! leaves the designer free from 11:00, but the next booking still needs its
//! own hour of preparation, so the earliest conflict-free start is 12:00.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Fixed preparation buffer in front of every booking.
pub const BUFFER_MINUTES: i64 = 60;

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted ranges.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, CoreError> {
        if start >= end {
            return Err(CoreError::Validation(format!(
                "Time window start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Half-open intersection test. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, instant: Timestamp) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// The leading buffer as a duration.
pub fn buffer() -> Duration {
    Duration::minutes(BUFFER_MINUTES)
}

/// The window a stored booking blocks on its designer's schedule.
///
/// The padded start saturates at the earliest representable instant.
pub fn occupied_interval(start: Timestamp, end: Timestamp) -> TimeWindow {
    TimeWindow {
        start: start
            .checked_sub_signed(buffer())
            .unwrap_or(Timestamp::MIN_UTC),
        end,
    }
}

/// The padded window used when checking a proposed booking `[start, end)`.
pub fn effective_query_interval(start: Timestamp, end: Timestamp) -> TimeWindow {
    occupied_interval(start, end)
}

/// Whether a proposed booking `[start, end)` collides with any of the given
/// occupied intervals.
pub fn conflicts<I>(start: Timestamp, end: Timestamp, occupied: I) -> bool
where
    I: IntoIterator<Item = TimeWindow>,
{
    let query = effective_query_interval(start, end);
    occupied.into_iter().any(|window| window.overlaps(&query))
}
