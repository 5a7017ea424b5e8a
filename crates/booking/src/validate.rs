//! Pure booking validation: no I/O, no locking. Callers pass a snapshot of
//! existing lessons and the student's credit balance; two concurrent
//! bookings validated against the same snapshot can both pass. Atomicity
//! lives in the storage layer (transaction plus guarded credit debit).

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use model::{
    lesson::{Lesson, LESSON_COST},
    timeslot::{LessonSlot, TimeOfDay},
};

/// Which side of a lesson a party is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Instructor,
    Student,
}

impl Role {
    fn party(&self, lesson: &Lesson) -> ObjectId {
        match self {
            Role::Instructor => lesson.instructor,
            Role::Student => lesson.student,
        }
    }

    fn busy(&self, slot: LessonSlot) -> Reject {
        match self {
            Role::Instructor => Reject::InstructorBusy(slot),
            Role::Student => Reject::StudentBusy(slot),
        }
    }
}

/// A rejected booking. The messages are shown to end users as-is.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Reject {
    #[error("De instructeur heeft al een les van {0}")]
    InstructorBusy(LessonSlot),
    #[error("De leerling heeft al een les van {0}")]
    StudentBusy(LessonSlot),
    #[error("Onvoldoende credits: {available} beschikbaar, {required} nodig")]
    InsufficientCredits { available: u32, required: u32 },
    #[error("Ongeldige lesduur: {0} minuten")]
    InvalidDuration(u32),
}

#[derive(Debug, Clone, Copy)]
pub struct BookingRequest {
    pub instructor: ObjectId,
    pub student: ObjectId,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub duration_min: u32,
}

impl BookingRequest {
    pub fn slot(&self) -> LessonSlot {
        LessonSlot::new(self.date, self.start, self.duration_min)
    }
}

/// Checks one party's calendar for an overlap with the proposed slot.
///
/// Candidates are the party's non-cancelled lessons on the same date,
/// minus `exclude` (so editing a lesson does not conflict with itself).
/// When several candidates overlap, the earliest-starting one is reported,
/// independent of input order.
pub fn check_availability(
    party: ObjectId,
    role: Role,
    slot: LessonSlot,
    lessons: &[Lesson],
    exclude: Option<ObjectId>,
) -> Result<(), Reject> {
    let conflict = lessons
        .iter()
        .filter(|lesson| role.party(lesson) == party)
        .filter(|lesson| lesson.status.blocks_slot())
        .filter(|lesson| exclude != Some(lesson.id))
        .filter(|lesson| lesson.slot().overlaps(&slot))
        .min_by_key(|lesson| lesson.start);

    match conflict {
        Some(lesson) => Err(role.busy(lesson.slot())),
        None => Ok(()),
    }
}

/// Valid iff `available >= required`.
pub fn check_credits(available: u32, required: u32) -> Result<(), Reject> {
    if available >= required {
        Ok(())
    } else {
        Err(Reject::InsufficientCredits {
            available,
            required,
        })
    }
}

/// Full pass/fail decision for a new booking. Order matters: credits are
/// the cheapest and most common rejection, then the instructor's calendar,
/// then the student's. The first failure is returned verbatim.
pub fn validate_new_lesson(
    req: &BookingRequest,
    lessons: &[Lesson],
    available_credits: u32,
) -> Result<(), Reject> {
    if req.duration_min == 0 {
        return Err(Reject::InvalidDuration(req.duration_min));
    }

    check_credits(available_credits, LESSON_COST)?;

    let slot = req.slot();
    check_availability(req.instructor, Role::Instructor, slot, lessons, None)?;
    check_availability(req.student, Role::Student, slot, lessons, None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use model::lesson::LessonStatus;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn lesson(instructor: ObjectId, student: ObjectId, start: &str, duration_min: u32) -> Lesson {
        let mut lesson = Lesson::new(
            ObjectId::new(),
            instructor,
            student,
            date(),
            start.parse().unwrap(),
            duration_min,
        );
        lesson.status = LessonStatus::Accepted;
        lesson
    }

    fn request(instructor: ObjectId, student: ObjectId, start: &str) -> BookingRequest {
        BookingRequest {
            instructor,
            student,
            date: date(),
            start: start.parse().unwrap(),
            duration_min: 30,
        }
    }

    #[test]
    fn test_overlapping_booking_rejected_with_range() {
        let instructor = ObjectId::new();
        let existing = vec![lesson(instructor, ObjectId::new(), "10:00", 30)];

        let req = request(instructor, ObjectId::new(), "10:15");
        let err = validate_new_lesson(&req, &existing, 5).unwrap_err();
        assert!(err.to_string().contains("10:00 - 10:30"), "{}", err);
        assert!(matches!(err, Reject::InstructorBusy(_)));
    }

    #[test]
    fn test_adjacent_booking_accepted() {
        let instructor = ObjectId::new();
        let existing = vec![lesson(instructor, ObjectId::new(), "10:00", 30)];

        let req = request(instructor, ObjectId::new(), "10:30");
        assert_eq!(validate_new_lesson(&req, &existing, 5), Ok(()));
    }

    #[test]
    fn test_credit_error_takes_precedence() {
        let instructor = ObjectId::new();
        let existing = vec![lesson(instructor, ObjectId::new(), "10:00", 30)];

        // Conflicting slot and no credits: the credit rejection wins.
        let req = request(instructor, ObjectId::new(), "10:15");
        let err = validate_new_lesson(&req, &existing, 0).unwrap_err();
        assert_eq!(
            err,
            Reject::InsufficientCredits {
                available: 0,
                required: 1
            }
        );
        assert!(err.to_string().contains('0'));
        assert!(err.to_string().contains('1'));
    }

    #[test]
    fn test_credit_boundary() {
        assert_eq!(check_credits(1, 1), Ok(()));
        assert_eq!(
            check_credits(0, 1),
            Err(Reject::InsufficientCredits {
                available: 0,
                required: 1
            })
        );
    }

    #[test]
    fn test_student_conflict_detected() {
        let student = ObjectId::new();
        let existing = vec![lesson(ObjectId::new(), student, "09:00", 60)];

        let req = request(ObjectId::new(), student, "09:30");
        let err = validate_new_lesson(&req, &existing, 3).unwrap_err();
        assert!(matches!(err, Reject::StudentBusy(_)));
    }

    #[test]
    fn test_cancelled_lessons_ignored() {
        let instructor = ObjectId::new();
        let mut cancelled = lesson(instructor, ObjectId::new(), "10:00", 30);
        cancelled.status = LessonStatus::Cancelled;

        let req = request(instructor, ObjectId::new(), "10:15");
        assert_eq!(validate_new_lesson(&req, &[cancelled], 3), Ok(()));
    }

    #[test]
    fn test_other_party_ignored() {
        let existing = vec![lesson(ObjectId::new(), ObjectId::new(), "10:00", 30)];

        let req = request(ObjectId::new(), ObjectId::new(), "10:15");
        assert_eq!(validate_new_lesson(&req, &existing, 3), Ok(()));
    }

    #[test]
    fn test_excluded_lesson_does_not_conflict_with_itself() {
        let instructor = ObjectId::new();
        let existing = lesson(instructor, ObjectId::new(), "10:00", 60);
        let lessons = vec![existing.clone()];

        let slot = LessonSlot::new(date(), "10:00".parse().unwrap(), 60);
        assert!(
            check_availability(instructor, Role::Instructor, slot, &lessons, None).is_err()
        );
        assert_eq!(
            check_availability(
                instructor,
                Role::Instructor,
                slot,
                &lessons,
                Some(existing.id)
            ),
            Ok(())
        );
    }

    #[test]
    fn test_earliest_conflict_reported() {
        let instructor = ObjectId::new();
        // Out of order on purpose: the 09:00 lesson must win.
        let lessons = vec![
            lesson(instructor, ObjectId::new(), "10:00", 60),
            lesson(instructor, ObjectId::new(), "09:00", 60),
        ];

        let slot = LessonSlot::new(date(), "09:30".parse().unwrap(), 120);
        let err =
            check_availability(instructor, Role::Instructor, slot, &lessons, None).unwrap_err();
        assert!(err.to_string().contains("09:00 - 10:00"), "{}", err);
    }

    #[test]
    fn test_checker_is_pure() {
        let instructor = ObjectId::new();
        let lessons = vec![lesson(instructor, ObjectId::new(), "10:00", 30)];
        let slot = LessonSlot::new(date(), "10:15".parse().unwrap(), 30);

        let first = check_availability(instructor, Role::Instructor, slot, &lessons, None);
        let second = check_availability(instructor, Role::Instructor, slot, &lessons, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut req = request(ObjectId::new(), ObjectId::new(), "10:00");
        req.duration_min = 0;
        assert_eq!(
            validate_new_lesson(&req, &[], 3),
            Err(Reject::InvalidDuration(0))
        );
    }
}
