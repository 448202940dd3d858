//! Prepaid credit balances.

use chrono::Utc;
use clipforge_models::CreditAccount;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::convert::{to_millis, to_u32};
use crate::error::{DbError, DbResult};

/// Repository for the `credit_accounts` table.
#[derive(Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a zero-balance account if none exists.
    pub async fn ensure_account(&self, user_id: &str) -> DbResult<()> {
        let now = to_millis(Utc::now());
        sqlx::query(
            "INSERT OR IGNORE INTO credit_accounts (user_id, balance, created_at, updated_at) \
             VALUES (?, 0, ?, ?)",
        )
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn account(&self, user_id: &str) -> DbResult<Option<CreditAccount>> {
        let row = sqlx::query("SELECT user_id, balance FROM credit_accounts WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> DbResult<CreditAccount> {
            Ok(CreditAccount {
                user_id: row.try_get("user_id")?,
                balance: to_u32(row.try_get("balance")?, "balance")?,
            })
        })
        .transpose()
    }

    /// Current balance; a missing account reads as zero.
    pub async fn balance(&self, user_id: &str) -> DbResult<u32> {
        Ok(self.account(user_id).await?.map(|a| a.balance).unwrap_or(0))
    }

    /// Subtract `amount` if the balance covers it. Returns the new balance.
    pub async fn debit(&self, user_id: &str, amount: u32) -> DbResult<u32> {
        let result = sqlx::query(
            "UPDATE credit_accounts SET balance = balance - ?, updated_at = ? \
             WHERE user_id = ? AND balance >= ?",
        )
        .bind(amount as i64)
        .bind(to_millis(Utc::now()))
        .bind(user_id)
        .bind(amount as i64)
        .execute(&self.pool)
        .await?;

        let balance = self.balance(user_id).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::InsufficientCredits {
                required: amount,
                balance,
            });
        }
        Ok(balance)
    }

    /// Add `amount`, creating the account if needed. Returns the new balance.
    pub async fn grant(&self, user_id: &str, amount: u32) -> DbResult<u32> {
        let now = to_millis(Utc::now());
        sqlx::query(
            "INSERT INTO credit_accounts (user_id, balance, created_at, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (user_id) DO UPDATE SET \
             balance = balance + excluded.balance, updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(amount as i64)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let balance = self.balance(user_id).await?;
        info!(user_id, amount, balance, "Credits granted");
        Ok(balance)
    }
}
