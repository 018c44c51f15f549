//! Glue shared by the `terminal` and `ledger-service` binaries. It lives in
//! the library so the integration tests can drive it too.

use std::io::{BufRead, Read, Write};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::{channel::StreamChannel, service::LedgerService};

pub mod csv_parser;
pub mod csv_printer;

/// Logs go to stderr; stdout is reserved for the display and the wire.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Ledger service answering one request per input line.
pub struct StdioLedger<A, R, W> {
    pub accounts: A,
    pub input: R,
    pub output: W,
}

impl<A, R, W> StdioLedger<A, R, W>
where
    A: Read,
    R: BufRead,
    W: Write,
{
    pub fn run(self) -> Result<usize> {
        let ledger = csv_parser::load_ledger(self.accounts)?;
        let mut service = LedgerService::new(ledger);
        let mut channel = StreamChannel::new(self.input, self.output);
        Ok(service.serve(&mut channel)?)
    }
}
