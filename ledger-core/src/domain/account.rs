//! Account domain model

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::Money;
use crate::domain::result::{Error, Result};

/// Product category of an account. Not considered sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Savings,
    Checking,
    Current,
    FixedDeposit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "SAVINGS",
            AccountType::Checking => "CHECKING",
            AccountType::Current => "CURRENT",
            AccountType::FixedDeposit => "FIXED_DEPOSIT",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bank account with its balance and lifecycle state
///
/// Two invariants hold at all observable times: the balance is never
/// negative, and an inactive account rejects every balance mutation.
/// Accounts are never deleted - deactivation is the terminal retained state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub owner_id: String,
    pub account_type: AccountType,
    pub balance: Money,
    pub active: bool,
}

impl Account {
    /// Create a new active account with a freshly generated id
    pub fn new(
        owner_id: impl Into<String>,
        account_type: AccountType,
        initial_balance: Money,
    ) -> Result<Self> {
        let owner_id = owner_id.into();
        if owner_id.trim().is_empty() {
            return Err(Error::invalid_input("owner id cannot be empty"));
        }
        if initial_balance.is_negative() {
            return Err(Error::invalid_input("initial balance cannot be negative"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            account_type,
            balance: initial_balance,
            active: true,
        })
    }

    /// Rebuild an account from its stored parts
    pub(crate) fn from_parts(
        id: Uuid,
        owner_id: String,
        account_type: AccountType,
        balance: Money,
        active: bool,
    ) -> Self {
        Self {
            id,
            owner_id,
            account_type,
            balance,
            active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Credit the balance. Requires an active account and a positive amount.
    pub fn deposit(&mut self, amount: &Money) -> Result<()> {
        self.ensure_active()?;
        if !amount.is_positive() {
            return Err(Error::InvalidAmount(
                "deposit amount must be positive".to_string(),
            ));
        }
        self.balance = self.balance.add(amount)?;
        Ok(())
    }

    /// Debit the balance. Requires an active account, a positive amount and
    /// sufficient funds; the sufficiency check runs before any mutation.
    pub fn withdraw(&mut self, amount: &Money) -> Result<()> {
        self.ensure_active()?;
        if !amount.is_positive() {
            return Err(Error::InvalidAmount(
                "withdrawal amount must be positive".to_string(),
            ));
        }
        if self.balance.is_less_than(amount)? {
            return Err(Error::InsufficientFunds(format!(
                "balance {}, requested {}",
                self.balance, amount
            )));
        }
        self.balance = self.balance.subtract(amount)?;
        Ok(())
    }

    /// Idempotent: deactivating an inactive account is a no-op
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Idempotent: activating an active account is a no-op
    pub fn activate(&mut self) {
        self.active = true;
    }

    fn ensure_active(&self) -> Result<()> {
        if !self.active {
            return Err(Error::invalid_account(format!(
                "account {} is not active",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn usd(cents: i64) -> Money {
        Money::new(Decimal::new(cents, 2), "USD")
    }

    #[test]
    fn test_account_creation() {
        let account = Account::new("CUST001", AccountType::Savings, usd(10000)).unwrap();
        assert_eq!(account.owner_id, "CUST001");
        assert!(account.active);
        assert_eq!(account.balance, usd(10000));
    }

    #[test]
    fn test_creation_rejects_bad_input() {
        assert!(matches!(
            Account::new("  ", AccountType::Savings, usd(100)),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            Account::new("CUST001", AccountType::Savings, usd(-1)),
            Err(Error::InvalidInput(_))
        ));
        // A zero opening balance is allowed
        assert!(Account::new("CUST001", AccountType::Savings, usd(0)).is_ok());
    }

    #[test]
    fn test_deposit_and_withdraw_round_trip() {
        let mut account = Account::new("CUST001", AccountType::Checking, usd(10000)).unwrap();
        account.deposit(&usd(5000)).unwrap();
        assert_eq!(account.balance, usd(15000));
        account.withdraw(&usd(5000)).unwrap();
        assert_eq!(account.balance, usd(10000));
    }

    #[test]
    fn test_withdraw_insufficient_funds() {
        let mut account = Account::new("CUST001", AccountType::Checking, usd(10000)).unwrap();
        let err = account.withdraw(&usd(10001)).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds(_)));
        // The failed withdrawal must not touch the balance
        assert_eq!(account.balance, usd(10000));
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let mut account = Account::new("CUST001", AccountType::Checking, usd(10000)).unwrap();
        assert!(matches!(
            account.deposit(&usd(0)),
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            account.withdraw(&usd(-100)),
            Err(Error::InvalidAmount(_))
        ));
        assert_eq!(account.balance, usd(10000));
    }

    #[test]
    fn test_inactive_account_rejects_mutation() {
        let mut account = Account::new("CUST001", AccountType::Checking, usd(10000)).unwrap();
        account.deactivate();
        assert!(matches!(
            account.deposit(&usd(100)),
            Err(Error::InvalidAccount(_))
        ));
        assert!(matches!(
            account.withdraw(&usd(100)),
            Err(Error::InvalidAccount(_))
        ));
        assert_eq!(account.balance, usd(10000));
    }

    #[test]
    fn test_activation_is_idempotent() {
        let mut account = Account::new("CUST001", AccountType::Checking, usd(100)).unwrap();
        account.activate();
        assert!(account.active);
        account.deactivate();
        account.deactivate();
        assert!(!account.active);
        account.activate();
        assert!(account.active);
    }

    #[test]
    fn test_currency_mismatch_propagates() {
        let mut account = Account::new("CUST001", AccountType::Checking, usd(10000)).unwrap();
        let eur = Money::new(Decimal::new(100, 2), "EUR");
        assert!(matches!(
            account.deposit(&eur),
            Err(Error::CurrencyMismatch(_, _))
        ));
        assert!(matches!(
            account.withdraw(&eur),
            Err(Error::CurrencyMismatch(_, _))
        ));
        assert_eq!(account.balance, usd(10000));
    }
}
