use crate::models::account::{Account, Credit, CreditOutcome};
use crate::models::types::AccountId;
use crate::services::account_service::AccountStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Account store kept in process memory.
///
/// Used when no `DATABASE_URL` is configured and by the test suite. Credits
/// run under the write lock, so the duplicate check and the update cannot
/// interleave with another delivery.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, account: Account) {
        self.accounts.write().await.insert(account.id, account);
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, sqlx::Error> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn credit_payment(&self, id: &AccountId, credit: &Credit) -> Result<CreditOutcome, sqlx::Error> {
        let mut accounts = self.accounts.write().await;
        let account = match accounts.get_mut(id) {
            Some(account) => account,
            None => return Ok(CreditOutcome::AccountNotFound),
        };

        if account.has_processed(&credit.payment_id) {
            return Ok(CreditOutcome::AlreadyProcessed);
        }

        account.balance += &credit.crypto_amount;
        account.usd_balance += &credit.usd_amount;
        account.processed_transactions.push(credit.payment_id.clone());

        Ok(CreditOutcome::Credited(account.clone()))
    }
}
