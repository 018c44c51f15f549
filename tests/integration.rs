mod common;

use std::{net::TcpListener, str::from_utf8, thread};

use common::TerminalBuilder;
use cute_atm::{
    bin_utils::{StdioLedger, csv_parser::load_ledger},
    channel::StreamChannel,
    service::LedgerService,
    terminal::SessionOutcome,
};
use rust_decimal::Decimal;

const ACCOUNTS: &str = include_str!("accounts.csv");

#[test]
fn stdio_ledger_answers_each_line() {
    let requests = "Bala1234567 4321 0.00\n\
                    With1234567 4321 105.00\n\
                    Bala1234567 4321 0.00\n\
                    With1234567 0000 1.00\n\
                    Tran1234567 4321 5.00 7654321\n\
                    Bala7654321 1111 0.00\n";
    let mut output = Vec::new();
    let ledger = StdioLedger {
        accounts: ACCOUNTS.as_bytes(),
        input: requests.as_bytes(),
        output: &mut output,
    };

    assert_eq!(ledger.run().unwrap(), 6);
    let lines: Vec<&str> = from_utf8(&output).unwrap().lines().collect();
    assert_eq!(
        lines,
        [
            "0000 8500.00",
            "0000",
            "0000 8395.00",
            "0003",
            "0000",
            "0000 105.00",
        ]
    );
}

#[test]
fn stdio_ledger_stops_on_malformed_request() {
    let mut output = Vec::new();
    let ledger = StdioLedger {
        accounts: ACCOUNTS.as_bytes(),
        input: "Bala1234567 4321 0.00\nXXXX1234567 4321 0.00\nBala1234567 4321 0.00\n"
            .as_bytes(),
        output: &mut output,
    };

    assert!(ledger.run().is_err());
    assert_eq!(from_utf8(&output).unwrap(), "0000 8500.00\n");
}

#[test]
fn terminal_talks_to_ledger_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let mut service = LedgerService::new(load_ledger(ACCOUNTS.as_bytes()).unwrap());
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut channel = StreamChannel::tcp(stream).unwrap();
        let handled = service.serve(&mut channel).unwrap();
        (handled, service.into_processor())
    });

    let stream = std::net::TcpStream::connect(address).unwrap();
    let channel = StreamChannel::tcp(stream).unwrap();
    let (mut terminal, harness) =
        TerminalBuilder::new(&["4321", "W", "105.00", "B", "D", "20", "Q"]).build(channel);

    let outcome = terminal.run_session().unwrap();
    drop(terminal);
    let (handled, ledger) = server.join().unwrap();

    let SessionOutcome::Completed { transactions } = outcome else {
        panic!("session did not complete: {outcome:?}");
    };
    assert_eq!(handled, 3);
    assert_eq!(transactions.len(), 3);
    assert_eq!(transactions[1].amount(), Decimal::new(839500, 2));
    assert_eq!(harness.cash_on_hand(), Decimal::new(8400, 0));
    assert_eq!(
        ledger.balance(&"1234567".parse().unwrap()),
        Some(Decimal::new(841500, 2))
    );
}
