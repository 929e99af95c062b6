//! Treasury: the pooled balance held by the DAO
//!
//! A single aggregate balance. At every observation point
//! `balance == total_contributed - total_disbursed`.

use crate::{Amount, DaoError, DaoResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Treasury {
    /// Funds currently held
    pub balance: Amount,
    /// Sum of all accepted contributions
    pub total_contributed: Amount,
    /// Sum of all executed disbursements
    pub total_disbursed: Amount,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit(&mut self, amount: Amount) -> DaoResult<Amount> {
        if amount.is_zero() {
            return Err(DaoError::InvalidInput(
                "deposit amount must be positive".into(),
            ));
        }
        let overflow = || DaoError::InvalidInput(format!("deposit of {} overflows treasury", amount));
        let balance = self.balance.checked_add(amount).ok_or_else(overflow)?;
        let total = self.total_contributed.checked_add(amount).ok_or_else(overflow)?;

        self.balance = balance;
        self.total_contributed = total;
        Ok(self.balance)
    }

    pub fn withdraw(&mut self, amount: Amount) -> DaoResult<Amount> {
        let balance = self
            .balance
            .checked_sub(amount)
            .ok_or(DaoError::InsufficientFunds {
                required: amount,
                available: self.balance,
            })?;
        let disbursed = self
            .total_disbursed
            .checked_add(amount)
            .ok_or_else(|| DaoError::InvalidInput("disbursement total overflow".into()))?;

        self.balance = balance;
        self.total_disbursed = disbursed;
        Ok(self.balance)
    }

    /// Reverse a prior [`Treasury::withdraw`] of `amount`
    pub fn reverse_withdrawal(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
        self.total_disbursed = self.total_disbursed.saturating_sub(amount);
    }

    pub fn is_balanced(&self) -> bool {
        self.total_contributed.checked_sub(self.total_disbursed) == Some(self.balance)
    }
}
