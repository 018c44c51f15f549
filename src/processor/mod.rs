use rust_decimal::Decimal;
use thiserror::Error;

use crate::{account::AccountError, codec::Status, credential::AccountId, transaction::Transaction};

pub mod in_memory_processor;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unknown account {0}")]
    UnknownAccount(AccountId),
    #[error("Transfer target must differ from the source account")]
    SameAccountTransfer,
    #[error(transparent)]
    AccountErr(#[from] AccountError),
}

impl LedgerError {
    /// Status reported to the terminal for this refusal.
    pub fn status(&self) -> Status {
        match self {
            LedgerError::UnknownAccount(_) => Status::UNKNOWN_ACCOUNT,
            LedgerError::SameAccountTransfer => Status::INVALID_TRANSFER,
            LedgerError::AccountErr(AccountError::InsufficientFunds) => Status::INSUFFICIENT_FUNDS,
            LedgerError::AccountErr(AccountError::PinMismatch) => Status::PIN_MISMATCH,
        }
    }
}

pub trait TransactionProcessor {
    /// Evaluates a transaction against the ledger's own state. An approved
    /// transaction may produce a value to send back (the balance, for an
    /// inquiry).
    fn process_transaction(&mut self, tx: &Transaction) -> Result<Option<Decimal>, LedgerError>;
}
