use std::io;

use thiserror::Error;

use crate::codec::MalformedPacket;

pub mod loopback;
pub mod stream;

pub use loopback::LoopbackChannel;
pub use stream::StreamChannel;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel was closed by the peer")]
    Closed,
    #[error("Wire record must not contain a line break")]
    EmbeddedNewline,
    #[error("Peer could not parse the record: {0}")]
    PeerMalformed(#[from] MalformedPacket),
    /// The received bytes are not an ASCII record.
    #[error("Received a garbled record: {0}")]
    Garbled(MalformedPacket),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Newline delimited ASCII records in both directions. The terminal sends
/// requests and receives responses, the ledger service does the opposite.
pub trait Channel {
    fn send(&mut self, record: &str) -> Result<(), ChannelError>;

    /// Blocks until the next record arrives. `Ok(None)` once the peer has
    /// closed its side.
    fn receive(&mut self) -> Result<Option<String>, ChannelError>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn send(&mut self, record: &str) -> Result<(), ChannelError> {
        (**self).send(record)
    }

    fn receive(&mut self) -> Result<Option<String>, ChannelError> {
        (**self).receive()
    }
}
