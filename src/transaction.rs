use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;

use crate::{
    codec::{self, MalformedPacket},
    credential::{AccountId, Credential, Pin},
    devices::{CashDispenser, DepositSlot},
};

pub const WITHDRAWAL_TAG: &str = "With";
pub const DEPOSIT_TAG: &str = "Depo";
pub const BALANCE_TAG: &str = "Bala";
pub const TRANSFER_TAG: &str = "Tran";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Withdrawal,
    Deposit,
    /// The amount field carries the balance returned by the ledger.
    BalanceInquiry,
    Transfer { target: AccountId },
}

impl TransactionKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            TransactionKind::Withdrawal => WITHDRAWAL_TAG,
            TransactionKind::Deposit => DEPOSIT_TAG,
            TransactionKind::BalanceInquiry => BALANCE_TAG,
            TransactionKind::Transfer { .. } => TRANSFER_TAG,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TransactionKind::Withdrawal => "Withdrawal",
            TransactionKind::Deposit => "Deposit",
            TransactionKind::BalanceInquiry => "Balance",
            TransactionKind::Transfer { .. } => "Transfer",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Amount must not be negative for {kind}")]
    NegativeAmount { kind: &'static str },
}

/// Local refusal raised before the ledger is contacted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejected {
    #[error("This terminal does not hold enough cash to give out {requested}")]
    InsufficientLocalCash { requested: Decimal },
    #[error("No deposit envelope was received")]
    EnvelopeNotReceived,
}

/// Local failure after the ledger already approved the transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HardwareFailure {
    #[error("Cash dispenser could not give out {amount}")]
    CashDispenser { amount: Decimal },
}

/// The terminal hardware a transaction may touch during pre/post-processing.
pub struct TerminalContext<'a> {
    pub dispenser: &'a mut dyn CashDispenser,
    pub deposit_slot: &'a mut dyn DepositSlot,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    created_at: DateTime<Utc>,
    credential: Credential,
    amount: Decimal,
    kind: TransactionKind,
}

impl Transaction {
    fn new(
        credential: Credential,
        amount: Decimal,
        kind: TransactionKind,
    ) -> Result<Self, TransactionError> {
        if amount < Decimal::zero() {
            return Err(TransactionError::NegativeAmount { kind: kind.name() });
        }
        Ok(Self {
            created_at: Utc::now(),
            credential,
            amount: codec::truncate_amount(amount),
            kind,
        })
    }

    pub fn withdrawal(credential: Credential, amount: Decimal) -> Result<Self, TransactionError> {
        Self::new(credential, amount, TransactionKind::Withdrawal)
    }

    pub fn deposit(credential: Credential, amount: Decimal) -> Result<Self, TransactionError> {
        Self::new(credential, amount, TransactionKind::Deposit)
    }

    pub fn balance_inquiry(credential: Credential) -> Self {
        Self {
            created_at: Utc::now(),
            credential,
            amount: Decimal::zero(),
            kind: TransactionKind::BalanceInquiry,
        }
    }

    pub fn transfer(
        credential: Credential,
        target: AccountId,
        amount: Decimal,
    ) -> Result<Self, TransactionError> {
        Self::new(credential, amount, TransactionKind::Transfer { target })
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn source_account(&self) -> &AccountId {
        &self.credential.account
    }

    pub fn pin(&self) -> &Pin {
        &self.credential.pin
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn target_account(&self) -> Option<&AccountId> {
        match &self.kind {
            TransactionKind::Transfer { target } => Some(target),
            _ => None,
        }
    }

    /// Local checks before the round trip to the ledger.
    pub fn preprocess(&self, ctx: &mut TerminalContext<'_>) -> Result<(), Rejected> {
        match self.kind {
            TransactionKind::Withdrawal => {
                if ctx.dispenser.has_funds(self.amount) {
                    Ok(())
                } else {
                    Err(Rejected::InsufficientLocalCash {
                        requested: self.amount,
                    })
                }
            }
            TransactionKind::Deposit => {
                if ctx.deposit_slot.take_envelope() {
                    Ok(())
                } else {
                    Err(Rejected::EnvelopeNotReceived)
                }
            }
            TransactionKind::BalanceInquiry | TransactionKind::Transfer { .. } => Ok(()),
        }
    }

    /// Local completion once the ledger approved the transaction.
    pub fn postprocess(&self, ctx: &mut TerminalContext<'_>) -> Result<(), HardwareFailure> {
        match self.kind {
            TransactionKind::Withdrawal => {
                if ctx.dispenser.dispense(self.amount) {
                    Ok(())
                } else {
                    Err(HardwareFailure::CashDispenser {
                        amount: self.amount,
                    })
                }
            }
            _ => Ok(()),
        }
    }

    /// Applies the payload of an approving response. Only a balance inquiry
    /// expects one; anything else carrying a payload is a protocol anomaly.
    pub fn apply_remote_update(&mut self, payload: &str) -> Result<(), MalformedPacket> {
        match self.kind {
            TransactionKind::BalanceInquiry => {
                if payload.is_empty() {
                    return Err(MalformedPacket::MissingPayload {
                        tag: BALANCE_TAG,
                    });
                }
                self.amount = codec::truncate_amount(codec::parse_amount(payload)?);
                Ok(())
            }
            _ if payload.is_empty() => Ok(()),
            _ => Err(MalformedPacket::UnexpectedPayload {
                tag: self.type_tag(),
                payload: payload.to_owned(),
            }),
        }
    }
}

/// Two transactions are equal when everything that travels on the wire is.
impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.credential.account == other.credential.account
            && self.credential.pin == other.credential.pin
            && self.amount == other.amount
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\tAccount: {}\tAmount: {}",
            self.kind.name(),
            self.credential.account,
            codec::format_amount(self.amount)
        )?;
        if let Some(target) = self.target_account() {
            write!(f, "\tTarget: {target}")?;
        }
        Ok(())
    }
}
