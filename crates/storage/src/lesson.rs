use chrono::NaiveDate;
use eyre::Result;
use futures_util::stream::TryStreamExt as _;
use log::info;
use model::{
    lesson::{Lesson, LessonStatus},
    session::Session,
    timeslot::TimeOfDay,
};
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, IndexModel,
};

use crate::session::Db;

const COLLECTION: &str = "lessons";

#[derive(Clone)]
pub struct LessonStore {
    store: Collection<Lesson>,
}

impl LessonStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let lessons = db.collection(COLLECTION);
        lessons
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "tenant_id": 1, "date": 1 })
                    .build(),
            )
            .await?;
        lessons
            .create_index(IndexModel::builder().keys(doc! { "status": 1 }).build())
            .await?;
        Ok(LessonStore { store: lessons })
    }

    pub async fn add(&self, session: &mut Session, lesson: &Lesson) -> Result<()> {
        info!("Add lesson: {:?}", lesson);
        self.store
            .insert_one(lesson)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<Lesson>> {
        let filter = doc! { "_id": id, "tenant_id": session.tenant() };
        Ok(self
            .store
            .find_one(filter)
            .session(&mut *session)
            .await?)
    }

    /// All lessons of the tenant on one calendar date, cancelled included.
    /// The availability checker filters by status itself.
    pub async fn on_date(&self, session: &mut Session, date: NaiveDate) -> Result<Vec<Lesson>> {
        let filter = doc! {
            "tenant_id": session.tenant(),
            "date": date.to_string(),
        };
        let mut cursor = self.store.find(filter).session(&mut *session).await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    /// Guarded status transition: matches only when the lesson is still in
    /// one of the expected states, so a stale caller fails instead of
    /// overwriting a newer transition.
    pub async fn set_status(
        &self,
        session: &mut Session,
        id: ObjectId,
        expected: &[LessonStatus],
        to: LessonStatus,
    ) -> Result<()> {
        info!("Set lesson {} status: {:?}", id, to);
        let expected = expected.iter().map(|s| s.as_str()).collect::<Vec<_>>();
        let filter = doc! {
            "_id": id,
            "tenant_id": session.tenant(),
            "status": { "$in": &expected },
        };
        let update = doc! {
            "$set": { "status": to.as_str() },
            "$inc": { "version": 1 },
        };
        let result = self
            .store
            .update_one(filter, update)
            .session(&mut *session)
            .await?;

        if result.modified_count != 1 {
            return Err(eyre::eyre!("Lesson not found or not in {:?}", expected));
        }
        Ok(())
    }

    /// Moves a lesson to another slot. Guarded on the live statuses so a
    /// lesson that was cancelled or completed in the meantime stays put.
    pub async fn set_slot(
        &self,
        session: &mut Session,
        id: ObjectId,
        date: NaiveDate,
        start: TimeOfDay,
        duration_min: u32,
    ) -> Result<()> {
        info!("Move lesson {} to {} {}", id, date, start);
        let filter = doc! {
            "_id": id,
            "tenant_id": session.tenant(),
            "status": { "$in": [
                LessonStatus::Pending.as_str(),
                LessonStatus::Accepted.as_str(),
            ] },
        };
        let update = doc! {
            "$set": {
                "date": date.to_string(),
                "start": start.to_string(),
                "duration_min": duration_min as i64,
            },
            "$inc": { "version": 1 },
        };
        let result = self
            .store
            .update_one(filter, update)
            .session(&mut *session)
            .await?;

        if result.modified_count != 1 {
            return Err(eyre::eyre!("Lesson not found or already finished: {}", id));
        }
        Ok(())
    }

    /// All accepted lessons across tenants. Runs outside any transaction;
    /// the sweeper's batch update is idempotent, so a stale read is safe.
    pub async fn find_accepted(&self) -> Result<Vec<Lesson>> {
        let filter = doc! { "status": LessonStatus::Accepted.as_str() };
        Ok(self.store.find(filter).await?.try_collect().await?)
    }

    /// Batch `accepted -> completed` transition. The status filter makes
    /// re-marking an already completed lesson a no-op.
    pub async fn complete_accepted(&self, ids: &[ObjectId]) -> Result<u64> {
        let filter = doc! {
            "_id": { "$in": ids.to_vec() },
            "status": LessonStatus::Accepted.as_str(),
        };
        let update = doc! {
            "$set": { "status": LessonStatus::Completed.as_str() },
            "$inc": { "version": 1 },
        };
        let result = self.store.update_many(filter, update).await?;
        Ok(result.modified_count)
    }
}
