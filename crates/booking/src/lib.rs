use eyre::Result;
use log::info;
use model::{
    lesson::{Lesson, LessonStatus, LESSON_COST},
    session::Session,
    timeslot::LessonSlot,
};
use mongodb::bson::oid::ObjectId;
use service::credits::{Credits, CreditsError};
use service::lessons::Lessons;
use storage::Storage;
use thiserror::Error;
use validate::{check_availability, validate_new_lesson, BookingRequest, Reject, Role};

pub mod service;
pub mod validate;

/// Booking facade of the driving school: composes the lesson and credit
/// services and owns the multi-store operations.
#[derive(Clone)]
pub struct Planner {
    pub db: storage::session::Db,
    pub lessons: Lessons,
    pub credits: Credits,
}

impl Planner {
    pub fn new(storage: Storage) -> Self {
        Planner {
            lessons: Lessons::new(storage.lessons),
            credits: Credits::new(storage.credits),
            db: storage.db,
        }
    }

    /// Books a new lesson: validates the request against a same-transaction
    /// snapshot of the day's calendar and the student's balance, then
    /// inserts the pending lesson and debits one credit. The debit is
    /// guarded in the store, so of two racing bookings for the last credit
    /// one aborts.
    pub async fn book_lesson(
        &self,
        session: &mut Session,
        req: BookingRequest,
    ) -> Result<ObjectId, BookError> {
        session.start_transaction().await?;
        match self.book_lesson_inner(session, req).await {
            Ok(id) => {
                session.commit_transaction().await?;
                Ok(id)
            }
            Err(err) => {
                session.abort_transaction().await?;
                Err(err)
            }
        }
    }

    async fn book_lesson_inner(
        &self,
        session: &mut Session,
        req: BookingRequest,
    ) -> Result<ObjectId, BookError> {
        let day = self.lessons.day_snapshot(session, req.date).await?;
        let available = self.credits.available(session, req.student).await?;

        validate_new_lesson(&req, &day, available)?;

        let lesson = Lesson::new(
            session.tenant(),
            req.instructor,
            req.student,
            req.date,
            req.start,
            req.duration_min,
        );
        self.lessons.add(session, &lesson).await?;
        self.credits
            .debit(session, req.student, LESSON_COST)
            .await?;

        info!("Booked lesson {} at {}", lesson.id, lesson.slot());
        Ok(lesson.id)
    }

    /// `pending -> accepted`, an instructor/admin decision.
    pub async fn accept_lesson(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<(), AcceptError> {
        let lesson = self
            .lessons
            .get(session, id)
            .await?
            .ok_or(AcceptError::LessonNotFound)?;
        if !lesson.status.can_accept() {
            return Err(AcceptError::NotPending(lesson.status));
        }
        self.lessons
            .set_status(session, id, &[LessonStatus::Pending], LessonStatus::Accepted)
            .await?;
        Ok(())
    }

    /// Cancels a pending or accepted lesson and refunds the credit taken
    /// at booking time.
    pub async fn cancel_lesson(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<(), CancelError> {
        session.start_transaction().await?;
        match self.cancel_lesson_inner(session, id).await {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(err) => {
                session.abort_transaction().await?;
                Err(err)
            }
        }
    }

    async fn cancel_lesson_inner(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<(), CancelError> {
        let lesson = self
            .lessons
            .get(session, id)
            .await?
            .ok_or(CancelError::LessonNotFound)?;
        if !lesson.status.can_cancel() {
            return Err(CancelError::NotCancellable(lesson.status));
        }

        self.lessons
            .set_status(
                session,
                id,
                &[LessonStatus::Pending, LessonStatus::Accepted],
                LessonStatus::Cancelled,
            )
            .await?;
        self.credits
            .refund(session, lesson.student, LESSON_COST)
            .await?;
        Ok(())
    }

    /// Moves a pending or accepted lesson to a new slot. Availability is
    /// rechecked for both parties with the lesson itself excluded, so it
    /// cannot conflict with its own old slot. No credit movement: the
    /// lesson was already paid for.
    pub async fn reschedule_lesson(
        &self,
        session: &mut Session,
        id: ObjectId,
        slot: LessonSlot,
    ) -> Result<(), RescheduleError> {
        session.start_transaction().await?;
        match self.reschedule_lesson_inner(session, id, slot).await {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(err) => {
                session.abort_transaction().await?;
                Err(err)
            }
        }
    }

    async fn reschedule_lesson_inner(
        &self,
        session: &mut Session,
        id: ObjectId,
        slot: LessonSlot,
    ) -> Result<(), RescheduleError> {
        if slot.duration_min == 0 {
            return Err(Reject::InvalidDuration(slot.duration_min).into());
        }

        let lesson = self
            .lessons
            .get(session, id)
            .await?
            .ok_or(RescheduleError::LessonNotFound)?;
        if !lesson.status.can_cancel() {
            return Err(RescheduleError::AlreadyFinished(lesson.status));
        }

        let day = self.lessons.day_snapshot(session, slot.date).await?;
        check_availability(lesson.instructor, Role::Instructor, slot, &day, Some(id))?;
        check_availability(lesson.student, Role::Student, slot, &day, Some(id))?;

        self.lessons
            .set_slot(session, id, slot.date, slot.start, slot.duration_min)
            .await?;
        Ok(())
    }

    /// Credit top-up for a student, upserting the balance document.
    pub async fn grant_credits(
        &self,
        session: &mut Session,
        student: ObjectId,
        amount: u32,
    ) -> Result<()> {
        if amount == 0 {
            return Err(eyre::eyre!("Grant amount must be positive"));
        }
        self.credits.grant(session, student, amount).await
    }
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error("{0}")]
    Rejected(#[from] Reject),
    #[error("{0}")]
    Credits(#[from] CreditsError),
    #[error("Common error:{0}")]
    Common(#[from] eyre::Error),
}

impl From<mongodb::error::Error> for BookError {
    fn from(e: mongodb::error::Error) -> Self {
        BookError::Common(e.into())
    }
}

#[derive(Debug, Error)]
pub enum AcceptError {
    #[error("Lesson not found")]
    LessonNotFound,
    #[error("Lesson is not pending: {0:?}")]
    NotPending(LessonStatus),
    #[error("Common error:{0}")]
    Common(#[from] eyre::Error),
}

impl From<mongodb::error::Error> for AcceptError {
    fn from(e: mongodb::error::Error) -> Self {
        AcceptError::Common(e.into())
    }
}

#[derive(Debug, Error)]
pub enum RescheduleError {
    #[error("Lesson not found")]
    LessonNotFound,
    #[error("Lesson is already finished: {0:?}")]
    AlreadyFinished(LessonStatus),
    #[error("{0}")]
    Rejected(#[from] Reject),
    #[error("Common error:{0}")]
    Common(#[from] eyre::Error),
}

impl From<mongodb::error::Error> for RescheduleError {
    fn from(e: mongodb::error::Error) -> Self {
        RescheduleError::Common(e.into())
    }
}

#[derive(Debug, Error)]
pub enum CancelError {
    #[error("Lesson not found")]
    LessonNotFound,
    #[error("Lesson can not be cancelled: {0:?}")]
    NotCancellable(LessonStatus),
    #[error("Common error:{0}")]
    Common(#[from] eyre::Error),
}

impl From<mongodb::error::Error> for CancelError {
    fn from(e: mongodb::error::Error) -> Self {
        CancelError::Common(e.into())
    }
}
