use std::{io, net::TcpStream, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use cute_atm::{
    bin_utils::{csv_printer::ReceiptFile, init_tracing},
    channel::StreamChannel,
    devices::{CashBox, DirectoryCardReader, EnvelopeSlot, LineConsole},
    proxy::LedgerProxy,
    terminal::{Devices, MAX_PIN_ATTEMPTS, MAX_TRANSACTIONS, Terminal, TerminalConfig},
};
use rust_decimal::Decimal;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Self-service terminal backed by a ledger service", long_about = None)]
struct Cli {
    /// Directory where bank cards are inserted
    #[arg(long, env = "ATM_CARD_SLOTS")]
    card_slots: PathBuf,

    /// Directory where confiscated cards are kept
    #[arg(long, env = "ATM_RETAINED_CARDS")]
    retained_cards: PathBuf,

    /// Address of the ledger service
    #[arg(long, env = "ATM_LEDGER", default_value = "127.0.0.1:7878")]
    ledger: String,

    /// Name of the card reader, and of the card file it looks for
    #[arg(long, default_value = "ATM1")]
    name: String,

    /// Cash loaded into the dispenser
    #[arg(long, default_value = "8500.00")]
    cash: Decimal,

    /// Where receipts are written; stdout is used when it cannot be created
    #[arg(long, default_value = "receipt")]
    receipt: PathBuf,

    /// Milliseconds between two looks at an empty card slot
    #[arg(long, default_value_t = 500)]
    poll_interval_ms: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = TerminalConfig {
        max_pin_attempts: MAX_PIN_ATTEMPTS,
        max_transactions: MAX_TRANSACTIONS,
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
    };

    let stream = TcpStream::connect(&cli.ledger)
        .with_context(|| format!("Failed to connect to the ledger at `{}`", cli.ledger))?;
    let channel = StreamChannel::tcp(stream).context("Failed to set up the ledger channel")?;
    info!(ledger = %cli.ledger, terminal = %cli.name, "connected");

    let devices = Devices {
        card_reader: Box::new(DirectoryCardReader::new(
            cli.name,
            cli.card_slots,
            cli.retained_cards,
        )),
        console: Box::new(LineConsole::new(io::stdin().lock(), io::stdout())),
        dispenser: Box::new(CashBox::new(cli.cash)),
        deposit_slot: Box::new(EnvelopeSlot::default()),
        receipt_printer: Box::new(ReceiptFile::new(cli.receipt)),
    };

    let mut terminal = Terminal::new(config, devices, LedgerProxy::new(channel));
    terminal.activate().context("Terminal stopped")
}
