//! Wire records exchanged between the terminal and the ledger service.
//!
//! Request: `<tag><account> <pin> <amount>[ <target>]`, where the tag is four
//! characters, the account seven digits, the PIN four digits and the amount
//! has exactly two fractional digits. Response: a four digit status,
//! optionally followed by one space and a payload.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    credential::{AccountId, AccountType, Credential, CredentialError},
    transaction::{
        BALANCE_TAG, DEPOSIT_TAG, TRANSFER_TAG, Transaction, TransactionError, WITHDRAWAL_TAG,
    },
};

pub const TAG_LEN: usize = 4;
pub const STATUS_LEN: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedPacket {
    #[error("Packet is empty")]
    Empty,
    #[error("Packet contains non-ASCII data")]
    NonAscii,
    #[error("Unknown transaction type `{0}`")]
    UnknownType(String),
    #[error("`{tag}` packet needs {expected} fields, got {actual}")]
    MissingFields {
        tag: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("`{tag}` packet has unexpected trailing field `{field}`")]
    TrailingField { tag: &'static str, field: String },
    #[error("Invalid amount `{0}`")]
    InvalidAmount(String),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error("Response `{0}` is not a 4-character status optionally followed by a space and payload")]
    ResponseShape(String),
    #[error("Response status `{0}` is not a 4 digit number")]
    Status(String),
    #[error("Approved `{tag}` response is missing its payload")]
    MissingPayload { tag: &'static str },
    #[error("Approved `{tag}` response carries unexpected payload `{payload}`")]
    UnexpectedPayload { tag: &'static str, payload: String },
}

pub const AMOUNT_SCALE: u32 = 2;

/// Drops any precision beyond cents. Never rounds.
pub fn truncate_amount(amount: Decimal) -> Decimal {
    amount.trunc_with_scale(AMOUNT_SCALE)
}

/// Formats an amount with exactly two fractional digits, truncating any
/// further precision.
pub fn format_amount(amount: Decimal) -> String {
    let mut amount = truncate_amount(amount);
    amount.rescale(AMOUNT_SCALE);
    amount.to_string()
}

pub fn parse_amount(s: &str) -> Result<Decimal, MalformedPacket> {
    Decimal::from_str(s).map_err(|_| MalformedPacket::InvalidAmount(s.to_owned()))
}

pub fn encode_request(tx: &Transaction) -> String {
    let mut record = format!(
        "{}{} {} {}",
        tx.type_tag(),
        tx.source_account(),
        tx.pin().as_str(),
        format_amount(tx.amount())
    );
    if let Some(target) = tx.target_account() {
        record.push(' ');
        record.push_str(target.as_str());
    }
    record
}

/// Parses a request line back into a transaction. The account type is not
/// part of the wire record, so decoded credentials carry the default type.
pub fn decode_request(line: &str) -> Result<Transaction, MalformedPacket> {
    if !line.is_ascii() {
        return Err(MalformedPacket::NonAscii);
    }
    let mut tokens = line.split_whitespace();
    let head = tokens.next().ok_or(MalformedPacket::Empty)?;
    if head.len() < TAG_LEN {
        return Err(MalformedPacket::UnknownType(head.to_owned()));
    }
    let (tag, account) = head.split_at(TAG_LEN);
    let tag = match tag {
        WITHDRAWAL_TAG => WITHDRAWAL_TAG,
        DEPOSIT_TAG => DEPOSIT_TAG,
        BALANCE_TAG => BALANCE_TAG,
        TRANSFER_TAG => TRANSFER_TAG,
        other => return Err(MalformedPacket::UnknownType(other.to_owned())),
    };
    let fields: Vec<&str> = tokens.collect();

    // account, pin, amount, target
    let (required, allowed) = match tag {
        BALANCE_TAG => (2, 3),
        TRANSFER_TAG => (4, 4),
        _ => (3, 3),
    };
    let actual = fields.len() + 1;
    if actual < required {
        return Err(MalformedPacket::MissingFields {
            tag,
            expected: required,
            actual,
        });
    }
    if actual > allowed {
        return Err(MalformedPacket::TrailingField {
            tag,
            field: fields[allowed - 1].to_owned(),
        });
    }

    let credential = Credential::new(account.parse()?, fields[0].parse()?, AccountType::default());
    let tx = match tag {
        WITHDRAWAL_TAG => Transaction::withdrawal(credential, parse_amount(fields[1])?)?,
        DEPOSIT_TAG => Transaction::deposit(credential, parse_amount(fields[1])?)?,
        BALANCE_TAG => {
            if let Some(amount) = fields.get(1) {
                parse_amount(amount)?;
            }
            Transaction::balance_inquiry(credential)
        }
        _ => {
            let amount = parse_amount(fields[1])?;
            let target: AccountId = fields[2].parse()?;
            Transaction::transfer(credential, target, amount)?
        }
    };
    Ok(tx)
}

/// Four digit status code. Zero approves, anything else refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(u16);

impl Status {
    pub const APPROVED: Status = Status(0);
    pub const INSUFFICIENT_FUNDS: Status = Status(1);
    pub const UNKNOWN_ACCOUNT: Status = Status(2);
    pub const PIN_MISMATCH: Status = Status(3);
    pub const INVALID_TRANSFER: Status = Status(4);

    pub fn new(code: u16) -> Option<Self> {
        (code <= 9999).then_some(Self(code))
    }

    pub fn code(self) -> u16 {
        self.0
    }

    pub fn is_approved(self) -> bool {
        self == Self::APPROVED
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub payload: String,
}

impl Response {
    pub fn approved(payload: impl Into<String>) -> Self {
        Self {
            status: Status::APPROVED,
            payload: payload.into(),
        }
    }

    pub fn refused(status: Status) -> Self {
        Self {
            status,
            payload: String::new(),
        }
    }
}

pub fn encode_response(response: &Response) -> String {
    if response.payload.is_empty() {
        response.status.to_string()
    } else {
        format!("{} {}", response.status, response.payload)
    }
}

pub fn decode_response(line: &str) -> Result<Response, MalformedPacket> {
    if !line.is_ascii() {
        return Err(MalformedPacket::NonAscii);
    }
    let payload = match line.as_bytes().get(STATUS_LEN) {
        None if line.len() == STATUS_LEN => "",
        Some(b' ') => &line[STATUS_LEN + 1..],
        _ => return Err(MalformedPacket::ResponseShape(line.to_owned())),
    };
    let status = &line[..STATUS_LEN];
    if !status.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedPacket::Status(status.to_owned()));
    }
    let code = status
        .parse::<u16>()
        .ok()
        .and_then(Status::new)
        .ok_or_else(|| MalformedPacket::Status(status.to_owned()))?;
    Ok(Response {
        status: code,
        payload: payload.to_owned(),
    })
}
