use rust_decimal::Decimal;
use thiserror::Error;

use crate::credential::Pin;

#[derive(Debug, PartialEq, Eq)]
pub enum AccountEventKind {
    Deposited,
    Withdrawn,
}

#[derive(Debug)]
pub struct AccountEvent {
    amount: Decimal,
    kind: AccountEventKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("PIN does not match the account")]
    PinMismatch,
    #[error("Insufficient funds")]
    InsufficientFunds,
}

/// Authoritative account state held by the ledger service.
#[derive(Debug, Clone)]
pub struct Account {
    pin: Pin,
    balance: Decimal,
}

impl Account {
    pub fn new(pin: Pin, balance: Decimal) -> Self {
        Self { pin, balance }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn verify_pin(&self, pin: &Pin) -> Result<(), AccountError> {
        if &self.pin == pin {
            Ok(())
        } else {
            Err(AccountError::PinMismatch)
        }
    }

    pub fn apply(&mut self, event: &AccountEvent) {
        match event.kind {
            AccountEventKind::Deposited => {
                self.balance += event.amount;
            }
            AccountEventKind::Withdrawn => {
                self.balance -= event.amount;
            }
        }
    }

    pub fn handle_withdrawal(&self, amount: Decimal) -> Result<AccountEvent, AccountError> {
        if self.balance >= amount {
            Ok(AccountEvent {
                amount,
                kind: AccountEventKind::Withdrawn,
            })
        } else {
            Err(AccountError::InsufficientFunds)
        }
    }

    pub fn handle_deposit(&self, amount: Decimal) -> AccountEvent {
        AccountEvent {
            amount,
            kind: AccountEventKind::Deposited,
        }
    }
}
