//! Transaction domain model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::Money;

/// Kind of ledger event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    InterestCredit,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::InterestCredit => "INTEREST_CREDIT",
        };
        write!(f, "{s}")
    }
}

/// Immutable record of a completed ledger event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub tx_type: TransactionType,
    pub amount: Money,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// Destination account, set only for transfers
    pub counterpart_account_id: Option<Uuid>,
}

impl Transaction {
    /// Record a single-account event
    pub fn new(
        account_id: Uuid,
        tx_type: TransactionType,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            tx_type,
            amount,
            timestamp: Utc::now(),
            description: description.into(),
            counterpart_account_id: None,
        }
    }

    /// Record a transfer, held against the debited account
    pub fn transfer(
        from: Uuid,
        to: Uuid,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        let mut tx = Self::new(from, TransactionType::Transfer, amount, description);
        tx.counterpart_account_id = Some(to);
        tx
    }

    /// True when the account appears on either side of the event
    pub fn involves(&self, account_id: Uuid) -> bool {
        self.account_id == account_id || self.counterpart_account_id == Some(account_id)
    }
}
