/// Account identifier, PIN and the bank card that carries them.
pub mod credential;

/// The four transaction kinds and their local pre/post-processing.
pub mod transaction;

/// Wire records for requests and responses.
pub mod codec;

/// Line oriented byte channel between the terminal and the ledger service.
pub mod channel;

/// Card reader, keypad/display, cash dispenser, deposit slot and receipt
/// printer, specified only by the traits the terminal drives.
pub mod devices;

/// Terminal side of the round trip to the ledger service.
pub mod proxy;

/// Terminal session state machine.
pub mod terminal;

/// Ledger side account state. State is modified using events, which are
/// created by handling transactions.
pub mod account;

/// Transaction processor interface, plus "in memory" implementation used by
/// the ledger service.
pub mod processor;

/// Ledger service dispatch: decode, evaluate, respond.
pub mod service;

/// Bootstrapping for the two binaries. It could be a crate of its own, but the
/// integration tests use it as well, so it stays here.
pub mod bin_utils;
