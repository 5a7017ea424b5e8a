use std::ops::{Deref, DerefMut};

use bson::oid::ObjectId;
use mongodb::ClientSession;

/// Mongo session plus the tenant (driving school) the operation acts for.
/// Tenant-scoped stores take this instead of a bare `ClientSession` so a
/// query can never forget the partition key.
pub struct Session {
    client_session: ClientSession,
    tenant: ObjectId,
}

impl Session {
    pub fn new(client_session: ClientSession, tenant: ObjectId) -> Self {
        Session {
            client_session,
            tenant,
        }
    }

    pub fn tenant(&self) -> ObjectId {
        self.tenant
    }

    pub fn set_tenant(&mut self, tenant: ObjectId) {
        self.tenant = tenant;
    }
}

impl Deref for Session {
    type Target = ClientSession;

    fn deref(&self) -> &Self::Target {
        &self.client_session
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.client_session
    }
}

impl<'a> From<&'a mut Session> for &'a mut ClientSession {
    fn from(session: &'a mut Session) -> &'a mut ClientSession {
        &mut session.client_session
    }
}
