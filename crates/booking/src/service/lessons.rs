use std::{ops::Deref, sync::Arc};

use chrono::NaiveDate;
use eyre::Result;
use model::{lesson::Lesson, session::Session};
use storage::lesson::LessonStore;

#[derive(Clone)]
pub struct Lessons {
    store: Arc<LessonStore>,
}

impl Lessons {
    pub(crate) fn new(store: LessonStore) -> Self {
        Lessons {
            store: Arc::new(store),
        }
    }

    /// Snapshot of the tenant's calendar for one date, the input of the
    /// availability checker.
    pub async fn day_snapshot(
        &self,
        session: &mut Session,
        date: NaiveDate,
    ) -> Result<Vec<Lesson>> {
        self.store.on_date(session, date).await
    }
}

impl Deref for Lessons {
    type Target = LessonStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}
