use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credit balance of one student within one tenant. `available` is always
/// derived; only `total` and `used` are stored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreditBalance {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub tenant_id: ObjectId,
    pub student: ObjectId,
    pub total: u32,
    pub used: u32,
    #[serde(default)]
    pub version: u64,
}

impl CreditBalance {
    pub fn new(tenant_id: ObjectId, student: ObjectId) -> CreditBalance {
        CreditBalance {
            id: ObjectId::new(),
            tenant_id,
            student,
            total: 0,
            used: 0,
            version: 0,
        }
    }

    /// Credits left to spend. `used > total` means an external mutation
    /// corrupted the balance; that is surfaced, never clamped to zero.
    pub fn available(&self) -> Result<u32, CreditIntegrityError> {
        self.total
            .checked_sub(self.used)
            .ok_or(CreditIntegrityError {
                student: self.student,
                total: self.total,
                used: self.used,
            })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Negative credit balance for student {student}: total {total}, used {used}")]
pub struct CreditIntegrityError {
    pub student: ObjectId,
    pub total: u32,
    pub used: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available() {
        let mut balance = CreditBalance::new(ObjectId::new(), ObjectId::new());
        assert_eq!(balance.available().unwrap(), 0);

        balance.total = 10;
        balance.used = 4;
        assert_eq!(balance.available().unwrap(), 6);
    }

    #[test]
    fn test_negative_balance_is_surfaced() {
        let mut balance = CreditBalance::new(ObjectId::new(), ObjectId::new());
        balance.total = 2;
        balance.used = 3;

        let err = balance.available().unwrap_err();
        assert_eq!(err.total, 2);
        assert_eq!(err.used, 3);
    }
}
