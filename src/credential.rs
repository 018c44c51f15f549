use std::{fmt, str::FromStr};

use thiserror::Error;

pub const ACCOUNT_ID_LEN: usize = 7;
pub const PIN_LEN: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Account identifier must be exactly {ACCOUNT_ID_LEN} digits, got `{0}`")]
    MalformedAccount(String),
    #[error("PIN must be exactly {PIN_LEN} digits")]
    MalformedPin,
    #[error("Unknown account type `{0}`, expected S or C")]
    UnknownAccountType(String),
    #[error("Card data is missing the {0} field")]
    MissingField(&'static str),
    #[error("Card data has unexpected trailing field `{0}`")]
    TrailingField(String),
}

fn is_numeric_of_len(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Seven digit account identifier. Never contains spaces, so it is always
/// safe to place on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_numeric_of_len(s, ACCOUNT_ID_LEN) {
            Ok(Self(s.to_owned()))
        } else {
            Err(CredentialError::MalformedAccount(s.to_owned()))
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Four digit PIN. `Debug` is redacted so it never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Pin {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_numeric_of_len(s, PIN_LEN) {
            Ok(Self(s.to_owned()))
        } else {
            Err(CredentialError::MalformedPin)
        }
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccountType {
    Savings,
    #[default]
    Checking,
}

impl FromStr for AccountType {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" | "s" => Ok(Self::Savings),
            "C" | "c" => Ok(Self::Checking),
            other => Err(CredentialError::UnknownAccountType(other.to_owned())),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Savings => f.write_str("S"),
            AccountType::Checking => f.write_str("C"),
        }
    }
}

/// What a bank card carries: account, PIN and account type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub account: AccountId,
    pub pin: Pin,
    pub account_type: AccountType,
}

impl Credential {
    pub fn new(account: AccountId, pin: Pin, account_type: AccountType) -> Self {
        Self {
            account,
            pin,
            account_type,
        }
    }

    /// Parses the first line of a card: `AAAAAAA PPPP` optionally followed by
    /// a space and the account type tag. A missing tag means checking.
    pub fn parse_card(line: &str) -> Result<Self, CredentialError> {
        let mut fields = line.trim_end_matches(['\r', '\n']).split(' ');
        let account = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or(CredentialError::MissingField("account"))?
            .parse()?;
        let pin = fields
            .next()
            .ok_or(CredentialError::MissingField("PIN"))?
            .parse()?;
        let account_type = match fields.next() {
            Some(tag) => tag.parse()?,
            None => AccountType::default(),
        };
        if let Some(extra) = fields.next() {
            return Err(CredentialError::TrailingField(extra.to_owned()));
        }
        Ok(Self::new(account, pin, account_type))
    }

    pub fn verify_pin(&self, candidate: &str) -> bool {
        self.pin.as_str() == candidate
    }
}
