use crate::models::account::{Account, Credit, CreditOutcome};
use crate::models::types::AccountId;
use async_trait::async_trait;
use sqlx::PgPool;

/// Persistence for accounts and their credited payments.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, sqlx::Error>;

    /// Applies `credit` unless its payment id was already credited to this account.
    /// The check and the update are one atomic step.
    async fn credit_payment(&self, id: &AccountId, credit: &Credit) -> Result<CreditOutcome, sqlx::Error>;
}

pub struct PgAccountStore {
    pub pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, sqlx::Error> {
        log::debug!("Querying for account {}", id);

        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, balance, usd_balance, processed_transactions
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn credit_payment(&self, id: &AccountId, credit: &Credit) -> Result<CreditOutcome, sqlx::Error> {
        let updated = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance = balance + $2,
                usd_balance = usd_balance + $3,
                processed_transactions = array_append(processed_transactions, $4)
            WHERE id = $1 AND NOT ($4 = ANY(processed_transactions))
            RETURNING id, balance, usd_balance, processed_transactions
            "#,
        )
        .bind(id)
        .bind(&credit.crypto_amount)
        .bind(&credit.usd_amount)
        .bind(&credit.payment_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(account) = updated {
            return Ok(CreditOutcome::Credited(account));
        }

        // Nothing updated: either the account is missing or the id is already recorded.
        let exists: Option<(AccountId,)> = sqlx::query_as("SELECT id FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match exists {
            Some(_) => CreditOutcome::AlreadyProcessed,
            None => CreditOutcome::AccountNotFound,
        })
    }
}
