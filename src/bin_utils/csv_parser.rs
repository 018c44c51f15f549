use std::io::Read;

use anyhow::{Context, Result};
use csv::{DeserializeRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    account::Account, credential::AccountId, processor::in_memory_processor::InMemoryLedger,
};

#[derive(Debug, Deserialize)]
pub struct AccountRecord {
    pub account: String,
    pub pin: String,
    pub balance: Decimal,
}

/// Parses the ledger's account list in CSV format (`account,pin,balance`).
pub struct CsvAccountParser<R> {
    iter: DeserializeRecordsIntoIter<R, AccountRecord>,
}

impl<R> CsvAccountParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvAccountParser<R>
where
    R: Read,
{
    type Item = (u64, csv::Result<AccountRecord>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row))
    }
}

/// Builds a ledger from an account list. Any bad row fails the whole load.
pub fn load_ledger<R>(source: R) -> Result<InMemoryLedger>
where
    R: Read,
{
    let mut ledger = InMemoryLedger::default();
    for (line, row) in CsvAccountParser::new(source) {
        let row = row.with_context(|| format!("Invalid account row at line {line}"))?;
        let account_id: AccountId = row
            .account
            .parse()
            .with_context(|| format!("Invalid account at line {line}"))?;
        let pin = row
            .pin
            .parse()
            .with_context(|| format!("Invalid PIN at line {line}"))?;
        if ledger.accounts.contains_key(&account_id) {
            anyhow::bail!("Duplicate account {account_id} at line {line}");
        }
        ledger.open_account(account_id, Account::new(pin, row.balance));
    }
    Ok(ledger)
}
