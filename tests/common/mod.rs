#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::VecDeque,
    io,
    rc::Rc,
};

use cute_atm::{
    channel::{Channel, ChannelError},
    devices::{
        CashBox, CashDispenser, Console, CredentialSource, DepositSlot, EnvelopeSlot,
        ReceiptPrinter,
    },
    proxy::LedgerProxy,
    terminal::{Devices, Terminal, TerminalConfig},
    transaction::Transaction,
};
use rust_decimal::{Decimal, prelude::FromPrimitive};

pub const CARD: &str = "1234567 4321 C";

#[derive(Debug, Default)]
pub struct CardSlot {
    /// `Err(())` simulates a card that cannot be read.
    pub card: Option<Result<String, ()>>,
    pub evicted: u32,
    pub confiscated: u32,
}

pub struct SharedCardReader(pub Rc<RefCell<CardSlot>>);

impl CredentialSource for SharedCardReader {
    fn present(&mut self) -> io::Result<Option<String>> {
        match &self.0.borrow().card {
            None => Ok(None),
            Some(Ok(line)) => Ok(Some(line.clone())),
            Some(Err(())) => Err(io::Error::new(io::ErrorKind::InvalidData, "scratched card")),
        }
    }

    fn evict(&mut self) -> io::Result<()> {
        let mut slot = self.0.borrow_mut();
        slot.card = None;
        slot.evicted += 1;
        Ok(())
    }

    fn confiscate(&mut self) -> io::Result<()> {
        let mut slot = self.0.borrow_mut();
        slot.card = None;
        slot.confiscated += 1;
        Ok(())
    }
}

/// Cards waiting in line at the terminal. Once the line is empty the reader
/// reports a hardware fault on every call.
pub struct CardQueue(pub Rc<RefCell<VecDeque<String>>>);

impl CardQueue {
    fn broken() -> io::Error {
        io::Error::other("card reader jammed")
    }
}

impl CredentialSource for CardQueue {
    fn present(&mut self) -> io::Result<Option<String>> {
        self.0.borrow().front().cloned().map(Some).ok_or_else(Self::broken)
    }

    fn evict(&mut self) -> io::Result<()> {
        self.0.borrow_mut().pop_front().map(drop).ok_or_else(Self::broken)
    }

    fn confiscate(&mut self) -> io::Result<()> {
        self.evict()
    }
}

pub struct ScriptedConsole {
    keys: VecDeque<String>,
    display: Rc<RefCell<Vec<String>>>,
}

impl Console for ScriptedConsole {
    fn prompt(&mut self, message: &str) -> io::Result<()> {
        self.display.borrow_mut().push(message.to_owned());
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<String> {
        self.keys
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more keys"))
    }

    fn read_char(&mut self) -> io::Result<char> {
        Ok(self.read_line()?.chars().next().unwrap_or('\n'))
    }
}

pub struct SharedCash(pub Rc<RefCell<CashBox>>);

impl CashDispenser for SharedCash {
    fn has_funds(&self, amount: Decimal) -> bool {
        self.0.borrow().has_funds(amount)
    }

    fn dispense(&mut self, amount: Decimal) -> bool {
        self.0.borrow_mut().dispense(amount)
    }
}

/// Claims to hold plenty of cash but never manages to give any out.
pub struct JammedDispenser;

impl CashDispenser for JammedDispenser {
    fn has_funds(&self, _amount: Decimal) -> bool {
        true
    }

    fn dispense(&mut self, _amount: Decimal) -> bool {
        false
    }
}

pub struct RecordingPrinter(pub Rc<RefCell<Vec<Vec<Transaction>>>>);

impl ReceiptPrinter for RecordingPrinter {
    fn print(&mut self, transactions: &[Transaction]) -> anyhow::Result<()> {
        self.0.borrow_mut().push(transactions.to_vec());
        Ok(())
    }
}

/// Answers with canned response lines and records what was sent.
#[derive(Default)]
pub struct ScriptedChannel {
    pub responses: VecDeque<String>,
    pub sent: Vec<String>,
}

impl ScriptedChannel {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: responses.iter().map(|r| r.to_string()).collect(),
            sent: Vec::new(),
        }
    }
}

impl Channel for ScriptedChannel {
    fn send(&mut self, record: &str) -> Result<(), ChannelError> {
        self.sent.push(record.to_owned());
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<String>, ChannelError> {
        Ok(self.responses.pop_front())
    }
}

pub struct Harness {
    pub card: Rc<RefCell<CardSlot>>,
    pub display: Rc<RefCell<Vec<String>>>,
    pub cash: Rc<RefCell<CashBox>>,
    pub receipts: Rc<RefCell<Vec<Vec<Transaction>>>>,
}

impl Harness {
    pub fn displayed(&self, message: &str) -> bool {
        self.display.borrow().iter().any(|line| line.contains(message))
    }

    pub fn times_displayed(&self, message: &str) -> usize {
        self.display
            .borrow()
            .iter()
            .filter(|line| line.as_str() == message)
            .count()
    }

    pub fn cash_on_hand(&self) -> Decimal {
        self.cash.borrow().cash_on_hand()
    }
}

pub struct TerminalBuilder {
    pub config: TerminalConfig,
    pub card: Option<Result<String, ()>>,
    pub keys: Vec<String>,
    pub cash: Decimal,
    pub dispenser: Option<Box<dyn CashDispenser>>,
    pub deposit_slot: Box<dyn DepositSlot>,
    pub card_reader: Option<Box<dyn CredentialSource>>,
}

impl TerminalBuilder {
    pub fn new(keys: &[&str]) -> Self {
        Self {
            config: TerminalConfig::default(),
            card: Some(Ok(CARD.to_string())),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            cash: Decimal::from_u32(8500).unwrap(),
            dispenser: None,
            deposit_slot: Box::new(EnvelopeSlot::default()),
            card_reader: None,
        }
    }

    pub fn card(mut self, card: Option<Result<String, ()>>) -> Self {
        self.card = card;
        self
    }

    pub fn cash(mut self, cash: u32) -> Self {
        self.cash = Decimal::from_u32(cash).unwrap();
        self
    }

    pub fn dispenser(mut self, dispenser: Box<dyn CashDispenser>) -> Self {
        self.dispenser = Some(dispenser);
        self
    }

    pub fn deposit_slot(mut self, deposit_slot: Box<dyn DepositSlot>) -> Self {
        self.deposit_slot = deposit_slot;
        self
    }

    /// Replaces the single-card slot with another card source.
    pub fn card_reader(mut self, card_reader: Box<dyn CredentialSource>) -> Self {
        self.card_reader = Some(card_reader);
        self
    }

    pub fn max_transactions(mut self, max: usize) -> Self {
        self.config.max_transactions = max;
        self
    }

    pub fn build<C: Channel>(self, channel: C) -> (Terminal<C>, Harness) {
        let harness = Harness {
            card: Rc::new(RefCell::new(CardSlot {
                card: self.card,
                ..Default::default()
            })),
            display: Rc::default(),
            cash: Rc::new(RefCell::new(CashBox::new(self.cash))),
            receipts: Rc::default(),
        };
        let dispenser = self
            .dispenser
            .unwrap_or_else(|| Box::new(SharedCash(harness.cash.clone())));
        let devices = Devices {
            card_reader: self
                .card_reader
                .unwrap_or_else(|| Box::new(SharedCardReader(harness.card.clone()))),
            console: Box::new(ScriptedConsole {
                keys: self.keys.into(),
                display: harness.display.clone(),
            }),
            dispenser,
            deposit_slot: self.deposit_slot,
            receipt_printer: Box::new(RecordingPrinter(harness.receipts.clone())),
        };
        let terminal = Terminal::new(self.config, devices, LedgerProxy::new(channel));
        (terminal, harness)
    }
}
