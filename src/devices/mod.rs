use std::io;

use rust_decimal::Decimal;

use crate::transaction::Transaction;

pub mod card_reader;
pub mod cash;
pub mod console;

pub use card_reader::DirectoryCardReader;
pub use cash::{CashBox, EnvelopeSlot};
pub use console::LineConsole;

/// Marks the end of a keypad entry.
pub const ENTER_KEY: char = '\n';

/// Card reader. A card is the raw line read off it.
pub trait CredentialSource {
    /// `Ok(None)` when the slot is empty, `Err` when a card is inserted but
    /// cannot be read.
    fn present(&mut self) -> io::Result<Option<String>>;

    /// Gives the card back to the user.
    fn evict(&mut self) -> io::Result<()>;

    /// Keeps the card inside the terminal.
    fn confiscate(&mut self) -> io::Result<()>;
}

/// Keypad and display.
pub trait Console {
    fn prompt(&mut self, message: &str) -> io::Result<()>;

    /// Reads one entry up to [`ENTER_KEY`], without the marker.
    fn read_line(&mut self) -> io::Result<String>;

    /// Reads a single key, discarding the rest of the entry.
    fn read_char(&mut self) -> io::Result<char>;
}

pub trait CashDispenser {
    fn has_funds(&self, amount: Decimal) -> bool;

    /// Gives out `amount` rounded down to a multiple of 10. Nothing is given
    /// out when the rounded amount is not available.
    fn dispense(&mut self, amount: Decimal) -> bool;
}

pub trait DepositSlot {
    fn take_envelope(&mut self) -> bool;
}

pub trait ReceiptPrinter {
    fn print(&mut self, transactions: &[Transaction]) -> anyhow::Result<()>;
}
