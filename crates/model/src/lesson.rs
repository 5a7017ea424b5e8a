use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::timeslot::{LessonSlot, TimeOfDay};

/// Price of one lesson in credits.
pub const LESSON_COST: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[non_exhaustive]
pub struct Lesson {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub tenant_id: ObjectId,
    pub instructor: ObjectId,
    pub student: ObjectId,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub duration_min: u32,
    pub status: LessonStatus,
    #[serde(default)]
    pub version: u64,
}

impl Lesson {
    pub fn new(
        tenant_id: ObjectId,
        instructor: ObjectId,
        student: ObjectId,
        date: NaiveDate,
        start: TimeOfDay,
        duration_min: u32,
    ) -> Lesson {
        Lesson {
            id: ObjectId::new(),
            tenant_id,
            instructor,
            student,
            date,
            start,
            duration_min,
            status: LessonStatus::Pending,
            version: 0,
        }
    }

    pub fn slot(&self) -> LessonSlot {
        LessonSlot::new(self.date, self.start, self.duration_min)
    }
}

/// Lesson lifecycle. `Pending` is the initial state; `Cancelled` and
/// `Completed` are terminal. `Completed` is reachable only from `Accepted`
/// and only via the completion sweeper.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    Pending,
    Accepted,
    Cancelled,
    Completed,
}

impl LessonStatus {
    /// Non-cancelled lessons keep their calendar slot occupied.
    pub fn blocks_slot(&self) -> bool {
        !matches!(self, LessonStatus::Cancelled)
    }

    pub fn can_accept(&self) -> bool {
        matches!(self, LessonStatus::Pending)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, LessonStatus::Pending | LessonStatus::Accepted)
    }

    pub fn can_complete(&self) -> bool {
        matches!(self, LessonStatus::Accepted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Pending => "pending",
            LessonStatus::Accepted => "accepted",
            LessonStatus::Cancelled => "cancelled",
            LessonStatus::Completed => "completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(LessonStatus::Pending.can_accept());
        assert!(LessonStatus::Pending.can_cancel());
        assert!(!LessonStatus::Pending.can_complete());

        assert!(!LessonStatus::Accepted.can_accept());
        assert!(LessonStatus::Accepted.can_cancel());
        assert!(LessonStatus::Accepted.can_complete());

        assert!(!LessonStatus::Cancelled.can_accept());
        assert!(!LessonStatus::Cancelled.can_cancel());
        assert!(!LessonStatus::Cancelled.can_complete());

        assert!(!LessonStatus::Completed.can_cancel());
        assert!(!LessonStatus::Completed.can_complete());
    }

    #[test]
    fn test_blocks_slot() {
        assert!(LessonStatus::Pending.blocks_slot());
        assert!(LessonStatus::Accepted.blocks_slot());
        assert!(LessonStatus::Completed.blocks_slot());
        assert!(!LessonStatus::Cancelled.blocks_slot());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&LessonStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
        let status: LessonStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, LessonStatus::Completed);
    }
}
