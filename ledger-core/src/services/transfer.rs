//! Transfer coordinator - deposits, withdrawals and transfers

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Money, Transaction, TransactionType};
use crate::ports::TransactionLog;
use crate::services::store::AccountStore;

/// Orchestrates balance movements and records completed ledger events
///
/// A transaction is appended only after the balance change has fully
/// succeeded; a failed operation leaves the log untouched. Account and
/// money errors pass through unchanged.
pub struct TransferCoordinator {
    store: Arc<AccountStore>,
    log: Arc<dyn TransactionLog>,
}

impl TransferCoordinator {
    pub fn new(store: Arc<AccountStore>, log: Arc<dyn TransactionLog>) -> Self {
        Self { store, log }
    }

    /// Credit an account and record a DEPOSIT
    pub fn deposit(&self, account_id: Uuid, amount: Money, description: &str) -> Result<Transaction> {
        self.store
            .mutate(account_id, |account| account.deposit(&amount))?;
        let transaction =
            Transaction::new(account_id, TransactionType::Deposit, amount, description);
        self.log.append(transaction.clone())?;
        info!(account_id = %account_id, transaction_id = %transaction.id, "recorded deposit");
        Ok(transaction)
    }

    /// Debit an account and record a WITHDRAWAL
    pub fn withdraw(
        &self,
        account_id: Uuid,
        amount: Money,
        description: &str,
    ) -> Result<Transaction> {
        self.store
            .mutate(account_id, |account| account.withdraw(&amount))?;
        let transaction =
            Transaction::new(account_id, TransactionType::Withdrawal, amount, description);
        self.log.append(transaction.clone())?;
        info!(account_id = %account_id, transaction_id = %transaction.id, "recorded withdrawal");
        Ok(transaction)
    }

    /// Move funds between two accounts and record one TRANSFER against the
    /// debited account
    ///
    /// The debit runs first so the sufficiency check happens before any
    /// balance changes. If the credit leg then fails, a compensating deposit
    /// restores the source before the original error is surfaced, keeping
    /// the sum of both balances invariant across a failed transfer.
    pub fn transfer(
        &self,
        from: Uuid,
        to: Uuid,
        amount: Money,
        description: &str,
    ) -> Result<Transaction> {
        if from == to {
            // Both legs under a single lock acquisition: the id's lock is
            // never taken twice, and the net effect is zero.
            self.store.mutate(from, |account| {
                account.withdraw(&amount)?;
                account.deposit(&amount)
            })?;
        } else {
            self.store.mutate(from, |account| account.withdraw(&amount))?;
            if let Err(credit_err) = self.store.mutate(to, |account| account.deposit(&amount)) {
                return match self.store.mutate(from, |account| account.deposit(&amount)) {
                    Ok(_) => Err(credit_err),
                    Err(reversal_err) => {
                        warn!(from = %from, to = %to, "transfer reversal failed, balances inconsistent");
                        Err(Error::CompensationFailed(format!(
                            "credit to {to} failed ({credit_err}); reversal to {from} also failed: {reversal_err}"
                        )))
                    }
                };
            }
        }

        let transaction = Transaction::transfer(from, to, amount, description);
        self.log.append(transaction.clone())?;
        info!(from = %from, to = %to, transaction_id = %transaction.id, "recorded transfer");
        Ok(transaction)
    }

    /// Transactions where the account appears on either side
    pub fn transactions_for_account(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        self.log.find_by_account(account_id)
    }

    /// Fetch a single transaction
    pub fn transaction(&self, id: Uuid) -> Result<Transaction> {
        self.log
            .find_by_id(id)?
            .ok_or_else(|| Error::not_found(format!("transaction {id}")))
    }

    /// Every recorded transaction
    pub fn all_transactions(&self) -> Result<Vec<Transaction>> {
        self.log.find_all()
    }
}
