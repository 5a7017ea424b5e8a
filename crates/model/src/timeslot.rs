use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Timelike as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Time of day with minute precision, rendered and stored as "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub fn new(minutes: u32) -> Option<TimeOfDay> {
        if minutes < MINUTES_PER_DAY {
            Some(TimeOfDay(minutes))
        } else {
            None
        }
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn hour(&self) -> u32 {
        self.0 / 60
    }

    pub fn minute(&self) -> u32 {
        self.0 % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid time of day: {0}")]
pub struct ParseTimeError(String);

impl FromStr for TimeOfDay {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hh, mm) = s
            .split_once(':')
            .ok_or_else(|| ParseTimeError(s.to_string()))?;
        let hour: u32 = hh.parse().map_err(|_| ParseTimeError(s.to_string()))?;
        let minute: u32 = mm.parse().map_err(|_| ParseTimeError(s.to_string()))?;
        if hour >= 24 || minute >= 60 {
            return Err(ParseTimeError(s.to_string()));
        }
        Ok(TimeOfDay(hour * 60 + minute))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One lesson's place on the calendar: date, start and duration.
///
/// End time is always derived, never stored. Both the availability checker
/// and the completion sweeper go through this type, so the interval
/// arithmetic cannot diverge between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonSlot {
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub duration_min: u32,
}

impl LessonSlot {
    pub fn new(date: NaiveDate, start: TimeOfDay, duration_min: u32) -> LessonSlot {
        LessonSlot {
            date,
            start,
            duration_min,
        }
    }

    /// End of the slot in minutes since midnight. Unlike `TimeOfDay` this
    /// may reach 24:00 (1440) for a lesson running to midnight.
    pub fn end_minutes(&self) -> u32 {
        self.start.minutes() + self.duration_min
    }

    /// Half-open `[start, end)` overlap on the same date. Adjacent slots
    /// (one ending exactly when the other starts) do not overlap, and a
    /// zero-duration slot overlaps nothing.
    pub fn overlaps(&self, other: &LessonSlot) -> bool {
        if self.date != other.date {
            return false;
        }

        let start = self.start.minutes();
        let end = self.end_minutes();
        let other_start = other.start.minutes();
        let other_end = other.end_minutes();

        start < other_end && other_start < end
    }

    /// Whether the slot lies entirely in the past: any earlier date, or
    /// today with the computed end at or before the current minute.
    pub fn has_ended(&self, now: DateTime<Local>) -> bool {
        let today = now.date_naive();
        if self.date < today {
            return true;
        }
        if self.date > today {
            return false;
        }
        let now_min = now.time().hour() * 60 + now.time().minute();
        self.end_minutes() <= now_min
    }
}

impl fmt::Display for LessonSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.end_minutes().min(MINUTES_PER_DAY);
        write!(f, "{} - {:02}:{:02}", self.start, end / 60, end % 60)
    }
}
