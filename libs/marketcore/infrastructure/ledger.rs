//! Wallet ledger.
//!
//! Owns every wallet balance on the marketplace. All balance mutation goes
//! through [`Ledger::debit`] and [`Ledger::credit`]; no other component
//! touches a balance directly. The ledger emits no notifications.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// No account exists for the user.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// Non-positive debit or negative credit amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// Debit exceeds the available balance.
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Balance mutation contract.
///
/// Implementations must make `debit` a single atomic check-and-decrement
/// per balance: two concurrent debits against the same account must never
/// both succeed when only one can be afforded.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Atomically decrease a balance. Fails with `InsufficientFunds` when
    /// the balance cannot cover `amount`, leaving the balance untouched.
    async fn debit(&self, user_id: &str, amount: i64) -> Result<()>;

    /// Atomically increase a balance. `amount` must be non-negative.
    ///
    /// Credits never bounce on a missing account: settlement must be able
    /// to pay a seller whose wallet has not been opened yet.
    async fn credit(&self, user_id: &str, amount: i64) -> Result<()>;

    /// Current balance for a user.
    async fn balance(&self, user_id: &str) -> Result<i64>;
}

/// In-memory ledger keyed by user id.
///
/// Each account lives in a [`DashMap`] entry; the entry guard makes the
/// check-then-act of `debit` a single atomic step with no interleaving
/// window for a concurrent caller.
#[derive(Default)]
pub struct MemoryLedger {
    accounts: DashMap<String, i64>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Seed an account with an opening balance. Replaces any existing
    /// balance, so it is only meant for startup seeding.
    pub fn open_account(&self, user_id: &str, opening_balance: i64) -> Result<()> {
        if opening_balance < 0 {
            return Err(LedgerError::InvalidAmount(opening_balance));
        }
        self.accounts.insert(user_id.to_string(), opening_balance);
        debug!(user = %user_id, balance = opening_balance, "account opened");
        Ok(())
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Sum of all wallet balances. Audit helper: together with the escrow
    /// engine's held total this is invariant across purchase operations.
    pub fn total_balance(&self) -> i64 {
        self.accounts.iter().map(|entry| *entry.value()).sum()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn debit(&self, user_id: &str, amount: i64) -> Result<()> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        // Entry guard held for the whole check-and-decrement.
        let mut balance = self
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::UnknownUser(user_id.to_string()))?;

        if *balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance: *balance,
                required: amount,
            });
        }

        *balance -= amount;
        debug!(user = %user_id, amount, balance = *balance, "debit applied");
        Ok(())
    }

    async fn credit(&self, user_id: &str, amount: i64) -> Result<()> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut balance = self.accounts.entry(user_id.to_string()).or_insert(0);
        *balance += amount;
        debug!(user = %user_id, amount, balance = *balance, "credit applied");
        Ok(())
    }

    async fn balance(&self, user_id: &str) -> Result<i64> {
        self.accounts
            .get(user_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| LedgerError::UnknownUser(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_debit_and_credit() {
        let ledger = MemoryLedger::new();
        ledger.open_account("user1", 1500).unwrap();

        ledger.debit("user1", 1000).await.unwrap();
        assert_eq!(ledger.balance("user1").await.unwrap(), 500);

        ledger.credit("user1", 250).await.unwrap();
        assert_eq!(ledger.balance("user1").await.unwrap(), 750);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_balance_untouched() {
        let ledger = MemoryLedger::new();
        ledger.open_account("user1", 500).unwrap();

        let err = ledger.debit("user1", 1000).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                balance: 500,
                required: 1000
            }
        ));
        assert_eq!(ledger.balance("user1").await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_invalid_amounts_rejected() {
        let ledger = MemoryLedger::new();
        ledger.open_account("user1", 100).unwrap();

        assert!(matches!(
            ledger.debit("user1", 0).await.unwrap_err(),
            LedgerError::InvalidAmount(0)
        ));
        assert!(matches!(
            ledger.debit("user1", -5).await.unwrap_err(),
            LedgerError::InvalidAmount(-5)
        ));
        assert!(matches!(
            ledger.credit("user1", -1).await.unwrap_err(),
            LedgerError::InvalidAmount(-1)
        ));

        // Zero credit is a no-op, not an error
        ledger.credit("user1", 0).await.unwrap();
        assert_eq!(ledger.balance("user1").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_debit_unknown_user() {
        let ledger = MemoryLedger::new();
        assert!(matches!(
            ledger.debit("ghost", 10).await.unwrap_err(),
            LedgerError::UnknownUser(_)
        ));
    }

    #[tokio::test]
    async fn test_credit_opens_missing_account() {
        let ledger = MemoryLedger::new();
        ledger.credit("newcomer", 300).await.unwrap();
        assert_eq!(ledger.balance("newcomer").await.unwrap(), 300);
    }

    #[tokio::test]
    async fn test_concurrent_debits_cannot_overdraw() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.open_account("user1", 1000).unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(
                async move { ledger.debit("user1", 300).await },
            ));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        // 1000 affords exactly three debits of 300
        assert_eq!(successes, 3);
        assert_eq!(ledger.balance("user1").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_total_balance() {
        let ledger = MemoryLedger::new();
        ledger.open_account("a", 100).unwrap();
        ledger.open_account("b", 250).unwrap();
        assert_eq!(ledger.total_balance(), 350);
        assert_eq!(ledger.account_count(), 2);
    }
}
