use thiserror::Error;
use tracing::{debug, info};

use crate::{
    channel::{Channel, ChannelError},
    codec::{self, MalformedPacket, Status},
    transaction::Transaction,
};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Channel(ChannelError),
    #[error("Malformed packet from the ledger: {0}")]
    Malformed(#[from] MalformedPacket),
}

impl From<ChannelError> for ProtocolError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Garbled(packet) => ProtocolError::Malformed(packet),
            other => ProtocolError::Channel(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Approved,
    Refused(Status),
}

/// The ledger as seen from the terminal: one request, one response.
pub struct LedgerProxy<C> {
    channel: C,
}

impl<C> LedgerProxy<C>
where
    C: Channel,
{
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Sends the transaction and blocks for the ledger's decision. The
    /// payload of an approval is applied to the transaction.
    pub fn authorize(&mut self, tx: &mut Transaction) -> Result<Authorization, ProtocolError> {
        debug!(tag = tx.type_tag(), account = %tx.source_account(), "sending to ledger");
        self.channel.send(&codec::encode_request(tx))?;

        let line = self.channel.receive()?.ok_or(ChannelError::Closed)?;
        let response = codec::decode_response(&line)?;
        if !response.status.is_approved() {
            info!(status = %response.status, "ledger refused transaction");
            if !response.payload.is_empty() {
                debug!(payload = %response.payload, "ignoring payload of refusal");
            }
            return Ok(Authorization::Refused(response.status));
        }
        tx.apply_remote_update(&response.payload)?;
        Ok(Authorization::Approved)
    }
}
