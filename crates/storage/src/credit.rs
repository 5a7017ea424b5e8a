use eyre::{eyre, Result};
use log::info;
use model::{credit::CreditBalance, session::Session};
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::{IndexOptions, UpdateOptions},
    Collection, IndexModel,
};

use crate::session::Db;

const COLLECTION: &str = "credits";

#[derive(Clone)]
pub struct CreditStore {
    store: Collection<CreditBalance>,
}

impl CreditStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let credits = db.collection(COLLECTION);
        let index = IndexModel::builder()
            .keys(doc! { "tenant_id": 1, "student": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        credits.create_index(index).await?;
        Ok(CreditStore { store: credits })
    }

    pub async fn get(
        &self,
        session: &mut Session,
        student: ObjectId,
    ) -> Result<Option<CreditBalance>> {
        let filter = doc! { "tenant_id": session.tenant(), "student": student };
        Ok(self
            .store
            .find_one(filter)
            .session(&mut *session)
            .await?)
    }

    pub async fn grant(&self, session: &mut Session, student: ObjectId, amount: u32) -> Result<()> {
        info!("Grant {} credits to student {}", amount, student);
        let filter = doc! { "tenant_id": session.tenant(), "student": student };
        let update = doc! {
            "$inc": { "total": amount as i64, "version": 1 },
            "$setOnInsert": { "_id": ObjectId::new(), "used": 0 },
        };
        self.store
            .update_one(filter, update)
            .with_options(UpdateOptions::builder().upsert(true).build())
            .session(&mut *session)
            .await?;
        Ok(())
    }

    /// Debit credits with a server-side `used + amount <= total` guard.
    /// Two racing bookings cannot both take the last credit: one of the
    /// updates matches nothing and the transaction aborts.
    pub async fn debit(&self, session: &mut Session, student: ObjectId, amount: u32) -> Result<()> {
        info!("Debit {} credits from student {}", amount, student);
        let filter = doc! {
            "tenant_id": session.tenant(),
            "student": student,
            "$expr": { "$lte": [ { "$add": ["$used", amount as i64] }, "$total" ] },
        };
        let update = doc! { "$inc": { "used": amount as i64, "version": 1 } };
        let result = self
            .store
            .update_one(filter, update)
            .session(&mut *session)
            .await?;

        if result.modified_count != 1 {
            return Err(eyre!("Not enough credits for student {}", student));
        }
        Ok(())
    }

    pub async fn refund(
        &self,
        session: &mut Session,
        student: ObjectId,
        amount: u32,
    ) -> Result<()> {
        info!("Refund {} credits to student {}", amount, student);
        let filter = doc! {
            "tenant_id": session.tenant(),
            "student": student,
            "$expr": { "$gte": ["$used", amount as i64] },
        };
        let update = doc! { "$inc": { "used": -(amount as i64), "version": 1 } };
        let result = self
            .store
            .update_one(filter, update)
            .session(&mut *session)
            .await?;

        if result.modified_count != 1 {
            return Err(eyre!("Nothing to refund for student {}", student));
        }
        Ok(())
    }
}
