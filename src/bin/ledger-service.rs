use std::{fs::File, io, net::TcpListener, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cute_atm::{
    bin_utils::{StdioLedger, csv_parser::load_ledger, init_tracing},
    channel::StreamChannel,
    service::LedgerService,
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about = "Ledger service answering terminal requests", long_about = None)]
struct Cli {
    /// Account list in CSV format (account,pin,balance)
    accounts: PathBuf,

    /// Address to accept terminal connections on
    #[arg(long, env = "LEDGER_LISTEN", default_value = "127.0.0.1:7878")]
    listen: String,

    /// Answer requests read from stdin on stdout instead of listening
    #[arg(long, conflicts_with = "listen")]
    stdio: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let accounts = File::open(&cli.accounts)
        .with_context(|| format!("Failed to open `{}`", cli.accounts.display()))?;

    if cli.stdio {
        let ledger = StdioLedger {
            accounts,
            input: io::stdin().lock(),
            output: io::stdout().lock(),
        };
        let handled = ledger.run()?;
        info!(handled, "stdin closed");
        return Ok(());
    }

    let ledger = load_ledger(accounts)?;
    info!(accounts = ledger.accounts.len(), "ledger loaded");
    let mut service = LedgerService::new(ledger);

    let listener = TcpListener::bind(&cli.listen)
        .with_context(|| format!("Failed to listen on `{}`", cli.listen))?;
    info!(address = %cli.listen, "waiting for terminals");

    // one terminal at a time
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                warn!(%err, "failed to accept connection");
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_default();
        info!(%peer, "terminal connected");
        let mut channel = StreamChannel::tcp(stream).context("Failed to set up channel")?;
        match service.serve(&mut channel) {
            Ok(handled) => info!(%peer, handled, "terminal disconnected"),
            Err(err) => error!(%peer, %err, "connection dropped"),
        }
    }
    Ok(())
}
