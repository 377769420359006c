use serde::{Deserialize, Serialize};
use bigdecimal::BigDecimal;
use crate::models::types::{AccountId, PaymentId};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Account {
    pub id: AccountId,
    pub balance: BigDecimal,     // crypto balance
    pub usd_balance: BigDecimal,
    pub processed_transactions: Vec<PaymentId>, // processor payment ids already credited
}

impl Account {
    pub fn new(id: AccountId) -> Self {
        Account {
            id,
            balance: BigDecimal::from(0),
            usd_balance: BigDecimal::from(0),
            processed_transactions: Vec::new(),
        }
    }

    pub fn has_processed(&self, payment_id: &str) -> bool {
        self.processed_transactions.iter().any(|id| id == payment_id)
    }
}

/// Public view of an account; the processed id list stays server side.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AccountBalance {
    pub id: AccountId,
    pub balance: BigDecimal,
    pub usd_balance: BigDecimal,
}

impl From<Account> for AccountBalance {
    fn from(account: Account) -> Self {
        AccountBalance {
            id: account.id,
            balance: account.balance,
            usd_balance: account.usd_balance,
        }
    }
}

/// Amounts credited to an account for one settled payment.
#[derive(Debug, Clone)]
pub struct Credit {
    pub payment_id: PaymentId,
    pub crypto_amount: BigDecimal,
    pub usd_amount: BigDecimal,
}

/// Result of an attempt to apply a [`Credit`].
#[derive(Debug, Clone, PartialEq)]
pub enum CreditOutcome {
    Credited(Account),
    AlreadyProcessed,
    AccountNotFound,
}
