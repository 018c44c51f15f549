//! Session state machine of the terminal.
//!
//! ```text
//! AwaitingCredential -> VerifyingPin -> SelectingTransaction <-> Authorizing
//!        |                   |                  |
//!        v                   v                  v
//!     Ejecting          Ejecting           TearingDown -> Terminated
//! ```
//!
//! Every session ends in [`SessionState::Terminated`], after which the caller
//! starts over from [`SessionState::AwaitingCredential`].

use std::{io, str::FromStr, thread, time::Duration};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    channel::Channel,
    credential::{AccountId, Credential},
    devices::{CashDispenser, Console, CredentialSource, DepositSlot, ReceiptPrinter},
    proxy::{Authorization, LedgerProxy, ProtocolError},
    transaction::{TerminalContext, Transaction},
};

pub const MAX_PIN_ATTEMPTS: u32 = 3;
pub const MAX_TRANSACTIONS: usize = 20;

pub const WELCOME: [&str; 2] = [
    "Welcome to the Bank of Heuristics!",
    "Please Insert Your Card In the Card Reader",
];
pub const MENU: [&str; 6] = [
    "Select a Transaction",
    "  W)ithdrawal",
    "  D)eposit",
    "  B)alance",
    "  T)ransfer",
    "  Q)uit",
];
pub const PIN_PROMPT: &str = "Enter Pin Number: ";
pub const AMOUNT_PROMPT: &str = "Enter Amount: ";
pub const TARGET_PROMPT: &str = "Enter Target Account Number: ";
pub const CONFISCATED: &str = "Sorry, three strikes and you're out!";
pub const REFUSED: [&str; 2] = [
    "The Bank Refuses Your Transaction",
    "Contact your Bank Representative.",
];
pub const OUT_OF_SERVICE: &str = "This terminal is temporarily out of service.";

/// Limits and pacing of the session loop. Device setup (card directories,
/// cash loaded) belongs to whoever builds the [`Devices`].
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    pub max_pin_attempts: u32,
    pub max_transactions: usize,
    /// How long to wait between two looks at an empty card slot.
    pub poll_interval: Duration,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            max_pin_attempts: MAX_PIN_ATTEMPTS,
            max_transactions: MAX_TRANSACTIONS,
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("Keypad or display failed: {0}")]
    Console(#[source] io::Error),
    #[error("Card reader failed: {0}")]
    CardReader(#[source] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TerminalError {
    /// Whether the terminal can keep serving customers after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TerminalError::Protocol(ProtocolError::Malformed(_)))
    }
}

/// Collaborators the terminal drives. All of them are thin I/O wrappers.
pub struct Devices {
    pub card_reader: Box<dyn CredentialSource>,
    pub console: Box<dyn Console>,
    pub dispenser: Box<dyn CashDispenser>,
    pub deposit_slot: Box<dyn DepositSlot>,
    pub receipt_printer: Box<dyn ReceiptPrinter>,
}

/// One authenticated interaction, from reading the card to teardown.
#[derive(Debug)]
pub struct Session {
    credential: Credential,
    transactions: Vec<Transaction>,
    pin_attempts: u32,
}

impl Session {
    fn new(credential: Credential) -> Self {
        Self {
            credential,
            transactions: Vec::new(),
            pin_attempts: 0,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn pin_attempts(&self) -> u32 {
        self.pin_attempts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ejection {
    /// The card could not be read or does not hold a well-formed credential.
    Reject,
    /// PIN retries are exhausted.
    Confiscate,
}

#[derive(Debug, PartialEq)]
pub enum SessionOutcome {
    NoCredential,
    CredentialRejected,
    Confiscated,
    Completed { transactions: Vec<Transaction> },
}

#[derive(Debug, PartialEq)]
pub enum SessionState {
    AwaitingCredential,
    VerifyingPin,
    SelectingTransaction,
    Authorizing(Transaction),
    TearingDown,
    Ejecting(Ejection),
    Terminated(SessionOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Withdrawal,
    Deposit,
    Balance,
    Transfer,
    Quit,
}

impl Selection {
    fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_uppercase() {
            'W' => Some(Self::Withdrawal),
            'D' => Some(Self::Deposit),
            'B' => Some(Self::Balance),
            'T' => Some(Self::Transfer),
            'Q' => Some(Self::Quit),
            _ => None,
        }
    }
}

pub struct Terminal<C> {
    config: TerminalConfig,
    devices: Devices,
    ledger: LedgerProxy<C>,
    session: Option<Session>,
}

impl<C> Terminal<C>
where
    C: Channel,
{
    pub fn new(config: TerminalConfig, devices: Devices, ledger: LedgerProxy<C>) -> Self {
        Self {
            config,
            devices,
            ledger,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn ledger(&self) -> &LedgerProxy<C> {
        &self.ledger
    }

    /// Serves customers until an unrecoverable error occurs.
    pub fn activate(&mut self) -> Result<(), TerminalError> {
        let mut greet = true;
        loop {
            if greet {
                for line in WELCOME {
                    self.display(line)?;
                }
            }
            match self.run_session() {
                Ok(SessionOutcome::NoCredential) => {
                    greet = false;
                    thread::sleep(self.config.poll_interval);
                }
                Ok(outcome) => {
                    debug!(?outcome, "session finished");
                    greet = true;
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(_) => greet = true,
            }
        }
    }

    /// Drives one session from [`SessionState::AwaitingCredential`] to its
    /// outcome. On error the open session, if any, is torn down before the
    /// error is returned.
    pub fn run_session(&mut self) -> Result<SessionOutcome, TerminalError> {
        let mut state = SessionState::AwaitingCredential;
        loop {
            state = match self.step(state) {
                Ok(SessionState::Terminated(outcome)) => return Ok(outcome),
                Ok(next) => next,
                Err(err) => {
                    error!(%err, "session aborted");
                    self.abort();
                    return Err(err);
                }
            };
        }
    }

    /// Performs a single transition.
    pub fn step(&mut self, state: SessionState) -> Result<SessionState, TerminalError> {
        debug!(state = state_name(&state), "step");
        match state {
            SessionState::AwaitingCredential => self.await_credential(),
            SessionState::VerifyingPin => self.verify_pin(),
            SessionState::SelectingTransaction => self.select_transaction(),
            SessionState::Authorizing(tx) => self.authorize(tx),
            SessionState::TearingDown => self.tear_down(),
            SessionState::Ejecting(ejection) => self.eject(ejection),
            terminated @ SessionState::Terminated(_) => Ok(terminated),
        }
    }

    fn await_credential(&mut self) -> Result<SessionState, TerminalError> {
        let line = match self.devices.card_reader.present() {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(SessionState::Terminated(SessionOutcome::NoCredential)),
            Err(err) => {
                warn!(%err, "unreadable card");
                return Ok(SessionState::Ejecting(Ejection::Reject));
            }
        };
        match Credential::parse_card(&line) {
            Ok(credential) => {
                info!(account = %credential.account, "card accepted");
                self.session = Some(Session::new(credential));
                Ok(SessionState::VerifyingPin)
            }
            Err(err) => {
                warn!(%err, "malformed card");
                Ok(SessionState::Ejecting(Ejection::Reject))
            }
        }
    }

    fn verify_pin(&mut self) -> Result<SessionState, TerminalError> {
        self.display(PIN_PROMPT)?;
        let entered = self.read_line()?;
        let max_attempts = self.config.max_pin_attempts;
        let Some(session) = self.session.as_mut() else {
            return Ok(SessionState::AwaitingCredential);
        };
        session.pin_attempts += 1;
        if session.credential.verify_pin(&entered) {
            info!(attempts = session.pin_attempts, "PIN verified");
            return Ok(SessionState::SelectingTransaction);
        }
        warn!(attempts = session.pin_attempts, "PIN mismatch");
        if session.pin_attempts < max_attempts {
            Ok(SessionState::VerifyingPin)
        } else {
            self.display(CONFISCATED)?;
            Ok(SessionState::Ejecting(Ejection::Confiscate))
        }
    }

    fn select_transaction(&mut self) -> Result<SessionState, TerminalError> {
        let Some(credential) = self.session.as_ref().map(|s| s.credential.clone()) else {
            return Ok(SessionState::AwaitingCredential);
        };
        if self.completed() >= self.config.max_transactions {
            self.display("Transaction limit reached for this session.")?;
            return Ok(SessionState::TearingDown);
        }

        for line in MENU {
            self.display(line)?;
        }
        let key = self.read_char()?;
        let Some(selection) = Selection::from_key(key) else {
            debug!(%key, "invalid selection");
            self.display("Invalid selection, please try again.")?;
            return Ok(SessionState::SelectingTransaction);
        };

        let built = match selection {
            Selection::Quit => return Ok(SessionState::TearingDown),
            Selection::Balance => Ok(Transaction::balance_inquiry(credential)),
            Selection::Withdrawal => {
                let Some(amount) = self.read_amount()? else {
                    return Ok(SessionState::SelectingTransaction);
                };
                Transaction::withdrawal(credential, amount)
            }
            Selection::Deposit => {
                let Some(amount) = self.read_amount()? else {
                    return Ok(SessionState::SelectingTransaction);
                };
                Transaction::deposit(credential, amount)
            }
            Selection::Transfer => {
                let Some(amount) = self.read_amount()? else {
                    return Ok(SessionState::SelectingTransaction);
                };
                let Some(target) = self.read_target()? else {
                    return Ok(SessionState::SelectingTransaction);
                };
                Transaction::transfer(credential, target, amount)
            }
        };
        match built {
            Ok(tx) => Ok(SessionState::Authorizing(tx)),
            Err(err) => {
                self.display(&err.to_string())?;
                Ok(SessionState::SelectingTransaction)
            }
        }
    }

    fn authorize(&mut self, mut tx: Transaction) -> Result<SessionState, TerminalError> {
        let mut ctx = TerminalContext {
            dispenser: &mut *self.devices.dispenser,
            deposit_slot: &mut *self.devices.deposit_slot,
        };
        if let Err(rejected) = tx.preprocess(&mut ctx) {
            warn!(tag = tx.type_tag(), %rejected, "rejected locally");
            self.display(&rejected.to_string())?;
            return Ok(SessionState::SelectingTransaction);
        }

        match self.ledger.authorize(&mut tx)? {
            Authorization::Refused(status) => {
                info!(tag = tx.type_tag(), %status, "ledger refused");
                for line in REFUSED {
                    self.display(line)?;
                }
            }
            Authorization::Approved => {
                info!(tag = tx.type_tag(), "ledger approved");
                let mut ctx = TerminalContext {
                    dispenser: &mut *self.devices.dispenser,
                    deposit_slot: &mut *self.devices.deposit_slot,
                };
                let completion = tx.postprocess(&mut ctx);
                let summary = format!("Approved: {tx}");
                if let Some(session) = self.session.as_mut() {
                    session.transactions.push(tx);
                }
                self.display(&summary)?;
                if let Err(failure) = completion {
                    // the ledger already committed, so the transaction stays recorded
                    error!(%failure, "local completion failed after approval");
                    self.display(&failure.to_string())?;
                }
            }
        }
        Ok(SessionState::SelectingTransaction)
    }

    fn tear_down(&mut self) -> Result<SessionState, TerminalError> {
        let transactions = self.release_session();
        self.devices
            .card_reader
            .evict()
            .map_err(TerminalError::CardReader)?;
        info!(count = transactions.len(), "session closed");
        Ok(SessionState::Terminated(SessionOutcome::Completed {
            transactions,
        }))
    }

    fn eject(&mut self, ejection: Ejection) -> Result<SessionState, TerminalError> {
        self.release_session();
        let reader = &mut self.devices.card_reader;
        match ejection {
            Ejection::Reject => {
                reader.evict().map_err(TerminalError::CardReader)?;
                Ok(SessionState::Terminated(SessionOutcome::CredentialRejected))
            }
            Ejection::Confiscate => {
                reader.confiscate().map_err(TerminalError::CardReader)?;
                Ok(SessionState::Terminated(SessionOutcome::Confiscated))
            }
        }
    }

    /// Prints the receipt and clears the session, returning what it held.
    fn release_session(&mut self) -> Vec<Transaction> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        if let Err(err) = self.devices.receipt_printer.print(&session.transactions) {
            warn!(%err, "could not print receipt");
        }
        session.transactions
    }

    /// Best effort teardown after an error.
    fn abort(&mut self) {
        if self.session.is_none() {
            return;
        }
        if let Err(err) = self.devices.console.prompt(OUT_OF_SERVICE) {
            warn!(%err, "could not show out of service notice");
        }
        self.release_session();
        if let Err(err) = self.devices.card_reader.evict() {
            error!(%err, "could not eject card");
        }
    }

    fn completed(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.transactions.len())
    }

    fn read_amount(&mut self) -> Result<Option<Decimal>, TerminalError> {
        self.display(AMOUNT_PROMPT)?;
        let entry = self.read_line()?;
        match Decimal::from_str(entry.trim()) {
            Ok(amount) => Ok(Some(amount)),
            Err(_) => {
                self.display(&format!("`{entry}` is not a valid amount."))?;
                Ok(None)
            }
        }
    }

    fn read_target(&mut self) -> Result<Option<AccountId>, TerminalError> {
        self.display(TARGET_PROMPT)?;
        let entry = self.read_line()?;
        match entry.trim().parse() {
            Ok(target) => Ok(Some(target)),
            Err(err) => {
                self.display(&err.to_string())?;
                Ok(None)
            }
        }
    }

    fn display(&mut self, message: &str) -> Result<(), TerminalError> {
        self.devices
            .console
            .prompt(message)
            .map_err(TerminalError::Console)
    }

    fn read_line(&mut self) -> Result<String, TerminalError> {
        self.devices
            .console
            .read_line()
            .map_err(TerminalError::Console)
    }

    fn read_char(&mut self) -> Result<char, TerminalError> {
        self.devices
            .console
            .read_char()
            .map_err(TerminalError::Console)
    }
}

fn state_name(state: &SessionState) -> &'static str {
    match state {
        SessionState::AwaitingCredential => "awaiting-credential",
        SessionState::VerifyingPin => "verifying-pin",
        SessionState::SelectingTransaction => "selecting-transaction",
        SessionState::Authorizing(_) => "authorizing",
        SessionState::TearingDown => "tearing-down",
        SessionState::Ejecting(_) => "ejecting",
        SessionState::Terminated(_) => "terminated",
    }
}
