use std::{ops::Deref, sync::Arc};

use eyre::Result;
use model::{credit::CreditIntegrityError, session::Session};
use mongodb::bson::oid::ObjectId;
use storage::credit::CreditStore;
use thiserror::Error;

#[derive(Clone)]
pub struct Credits {
    store: Arc<CreditStore>,
}

impl Credits {
    pub(crate) fn new(store: CreditStore) -> Self {
        Credits {
            store: Arc::new(store),
        }
    }

    /// Spendable credits of a student. A missing balance document means
    /// zero credits; a corrupted one (`used > total`) is surfaced.
    pub async fn available(
        &self,
        session: &mut Session,
        student: ObjectId,
    ) -> Result<u32, CreditsError> {
        let balance = self.store.get(session, student).await?;
        match balance {
            Some(balance) => Ok(balance.available()?),
            None => Ok(0),
        }
    }
}

impl Deref for Credits {
    type Target = CreditStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

#[derive(Debug, Error)]
pub enum CreditsError {
    #[error("{0}")]
    Integrity(#[from] CreditIntegrityError),
    #[error("Common error:{0}")]
    Common(#[from] eyre::Error),
}
