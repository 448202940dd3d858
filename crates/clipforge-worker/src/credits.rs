//! Credit ledger.
//!
//! One credit funds one started minute of source video. The pre-flight
//! check runs before detection; the debit itself is written together with
//! the job's completion so a failed run never charges.

use clipforge_db::CreditRepository;
use clipforge_models::credits_for_duration;
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

/// `ceil(duration_secs / 60)`.
pub fn required_units(duration_secs: f64) -> u32 {
    credits_for_duration(duration_secs)
}

#[derive(Clone)]
pub struct CreditLedger {
    repo: CreditRepository,
}

impl CreditLedger {
    pub fn new(repo: CreditRepository) -> Self {
        Self { repo }
    }

    pub async fn balance(&self, user_id: &str) -> WorkerResult<u32> {
        Ok(self.repo.balance(user_id).await?)
    }

    pub async fn check_balance(&self, user_id: &str, required: u32) -> WorkerResult<bool> {
        Ok(self.balance(user_id).await? >= required)
    }

    /// Fail with [`WorkerError::InsufficientCredits`] unless the balance covers `required`.
    pub async fn ensure_affordable(&self, user_id: &str, required: u32) -> WorkerResult<()> {
        let balance = self.balance(user_id).await?;
        debug!(user_id, required, balance, "Credit pre-flight check");
        if balance < required {
            return Err(WorkerError::InsufficientCredits { required, balance });
        }
        Ok(())
    }

    /// Guarded debit; never takes the balance below zero.
    pub async fn debit(&self, user_id: &str, units: u32) -> WorkerResult<u32> {
        Ok(self.repo.debit(user_id, units).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipforge_db::Database;

    #[test]
    fn test_required_units_rounds_up() {
        assert_eq!(required_units(0.0), 0);
        assert_eq!(required_units(1.0), 1);
        assert_eq!(required_units(60.0), 1);
        assert_eq!(required_units(60.5), 2);
        assert_eq!(required_units(300.0), 5);
    }

    #[tokio::test]
    async fn test_check_and_debit() {
        let db = Database::in_memory().await.unwrap();
        db.credits().grant("u", 2).await.unwrap();
        let ledger = CreditLedger::new(db.credits());

        assert!(ledger.check_balance("u", 2).await.unwrap());
        assert!(!ledger.check_balance("u", 5).await.unwrap());
        assert!(matches!(
            ledger.ensure_affordable("u", 5).await,
            Err(WorkerError::InsufficientCredits {
                required: 5,
                balance: 2
            })
        ));

        assert_eq!(ledger.debit("u", 2).await.unwrap(), 0);
        assert!(ledger.debit("u", 1).await.is_err());
        assert_eq!(ledger.balance("u").await.unwrap(), 0);
    }
}
