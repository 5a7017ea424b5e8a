use async_trait::async_trait;
use booking::Planner;
use chrono::{DateTime, Local};
use eyre::{Error, Result};
use log::info;
use model::lesson::Lesson;
use mongodb::bson::oid::ObjectId;

use crate::Task;

/// Sweeps `accepted` lessons whose computed end time has passed into
/// `completed`. The only transition this job performs; it touches no
/// credits and sends no notifications. The batch update filters on
/// `accepted`, so overlapping or retried runs are no-ops on rows that
/// already moved.
#[derive(Clone)]
pub struct CompletionBg {
    planner: Planner,
}

impl CompletionBg {
    pub fn new(planner: Planner) -> CompletionBg {
        CompletionBg { planner }
    }
}

#[async_trait]
impl Task for CompletionBg {
    const NAME: &'static str = "lesson-completion";

    async fn process(&mut self) -> Result<(), Error> {
        let lessons = self.planner.lessons.find_accepted().await?;
        let eligible = eligible_for_completion(&lessons, Local::now());
        if eligible.is_empty() {
            return Ok(());
        }

        let completed = self.planner.lessons.complete_accepted(&eligible).await?;
        info!("Completed {} of {} ended lessons", completed, eligible.len());
        Ok(())
    }
}

/// Lessons whose slot lies entirely in the past: any earlier date, or
/// today with end time at or before `now`'s minute. Same arithmetic as the
/// availability checker via `LessonSlot`.
pub fn eligible_for_completion(lessons: &[Lesson], now: DateTime<Local>) -> Vec<ObjectId> {
    lessons
        .iter()
        .filter(|lesson| lesson.status.can_complete())
        .filter(|lesson| lesson.slot().has_ended(now))
        .map(|lesson| lesson.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone as _};
    use model::lesson::LessonStatus;

    use super::*;

    fn lesson(date: NaiveDate, start: &str, duration_min: u32, status: LessonStatus) -> Lesson {
        let mut lesson = Lesson::new(
            ObjectId::new(),
            ObjectId::new(),
            ObjectId::new(),
            date,
            start.parse().unwrap(),
            duration_min,
        );
        lesson.status = status;
        lesson
    }

    #[test]
    fn test_yesterday_always_completes() {
        let yesterday = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        let now = Local
            .with_ymd_and_hms(2024, 5, 1, 0, 5, 0)
            .single()
            .unwrap();

        // Stored time is irrelevant for past dates.
        let lessons = vec![lesson(yesterday, "23:30", 60, LessonStatus::Accepted)];
        assert_eq!(eligible_for_completion(&lessons, now), vec![lessons[0].id]);
    }

    #[test]
    fn test_today_minute_boundary() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let now = Local
            .with_ymd_and_hms(2024, 5, 1, 10, 30, 0)
            .single()
            .unwrap();

        // Ends 10:31, one minute in the future.
        let future = lesson(today, "10:01", 30, LessonStatus::Accepted);
        // Ends 10:29, one minute in the past.
        let past = lesson(today, "09:59", 30, LessonStatus::Accepted);

        let lessons = vec![future, past.clone()];
        assert_eq!(eligible_for_completion(&lessons, now), vec![past.id]);
    }

    #[test]
    fn test_only_accepted_lessons_are_swept() {
        let yesterday = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        let now = Local
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .unwrap();

        let lessons = vec![
            lesson(yesterday, "10:00", 60, LessonStatus::Pending),
            lesson(yesterday, "11:00", 60, LessonStatus::Cancelled),
            lesson(yesterday, "12:00", 60, LessonStatus::Completed),
        ];
        assert!(eligible_for_completion(&lessons, now).is_empty());
    }
}
