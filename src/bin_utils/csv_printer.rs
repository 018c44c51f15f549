use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::warn;

use crate::{codec::format_amount, devices::ReceiptPrinter, transaction::Transaction};

const RECEIPT_HEADER: [&str; 5] = ["timestamp", "type", "account", "target", "amount"];

#[derive(Debug, Serialize)]
pub struct ReceiptLine {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub account: String,
    pub target: Option<String>,
    pub amount: String,
}

impl From<&Transaction> for ReceiptLine {
    fn from(tx: &Transaction) -> Self {
        Self {
            timestamp: tx.created_at(),
            kind: tx.type_tag(),
            account: tx.source_account().to_string(),
            target: tx.target_account().map(ToString::to_string),
            amount: format_amount(tx.amount()),
        }
    }
}

pub fn print_receipt<W>(output: &mut W, transactions: &[Transaction]) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(output);
    if let Err(err) = writer.write_record(RECEIPT_HEADER) {
        anyhow::bail!("Failed to write receipt header: {err}")
    }
    for tx in transactions {
        writer
            .serialize(ReceiptLine::from(tx))
            .with_context(|| format!("Failed to write receipt line for {}", tx.type_tag()))?;
    }
    writer.flush().context("Failed to flush receipt")?;
    Ok(())
}

/// Writes each receipt to a file, or to stdout when the file cannot be
/// created.
#[derive(Debug)]
pub struct ReceiptFile {
    path: PathBuf,
}

impl ReceiptFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReceiptPrinter for ReceiptFile {
    fn print(&mut self, transactions: &[Transaction]) -> anyhow::Result<()> {
        match File::create(&self.path) {
            Ok(mut file) => print_receipt(&mut file, transactions)
                .with_context(|| format!("Failed to print receipt to {}", self.path.display())),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "receipt file unavailable, using stdout");
                print_receipt(&mut io::stdout().lock(), transactions)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::{Decimal, prelude::FromPrimitive};

    use super::*;
    use crate::credential::Credential;

    #[test]
    fn receipt_lists_every_transaction() {
        let credential = Credential::parse_card("1234567 4321").unwrap();
        let txs = [
            Transaction::withdrawal(credential.clone(), Decimal::from_u32(105).unwrap()).unwrap(),
            Transaction::transfer(credential, "7654321".parse().unwrap(), Decimal::ONE).unwrap(),
        ];
        let mut output = Vec::new();
        print_receipt(&mut output, &txs).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,type,account,target,amount");
        assert!(lines[1].ends_with(",With,1234567,,105.00"));
        assert!(lines[2].ends_with(",Tran,1234567,7654321,1.00"));
    }

    #[test]
    fn empty_receipt_still_has_a_header() {
        let mut output = Vec::new();
        print_receipt(&mut output, &[]).unwrap();
        assert_eq!(output, b"timestamp,type,account,target,amount\n");
    }

    #[test]
    fn receipt_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt");
        let mut printer = ReceiptFile::new(&path);
        printer.print(&[]).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().starts_with("timestamp"));
    }
}
