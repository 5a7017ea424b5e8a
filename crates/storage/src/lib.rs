pub mod credit;
pub mod lesson;
pub mod session;

use eyre::Result;
use session::Db;

const DB_NAME: &str = "rijles_db";

#[derive(Clone)]
pub struct Storage {
    pub db: Db,
    pub lessons: lesson::LessonStore,
    pub credits: credit::CreditStore,
}

impl Storage {
    pub async fn new(uri: &str) -> Result<Self> {
        let db = Db::new(uri, DB_NAME).await?;
        let lessons = lesson::LessonStore::new(&db).await?;
        let credits = credit::CreditStore::new(&db).await?;

        Ok(Storage {
            db,
            lessons,
            credits,
        })
    }
}
