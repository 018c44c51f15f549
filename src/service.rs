//! Ledger side of the protocol: one request record in, one response record
//! out.

use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    channel::{Channel, ChannelError},
    codec::{self, MalformedPacket, Response},
    processor::TransactionProcessor,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("Malformed request: {0}")]
    Malformed(#[from] MalformedPacket),
}

pub struct LedgerService<P> {
    processor: P,
}

impl<P> LedgerService<P>
where
    P: TransactionProcessor,
{
    pub fn new(processor: P) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn into_processor(self) -> P {
        self.processor
    }

    /// Decodes a request, evaluates it and encodes the response. A request
    /// that cannot be decoded gets no response at all.
    pub fn handle_record(&mut self, record: &str) -> Result<String, MalformedPacket> {
        let tx = codec::decode_request(record)?;
        debug!(tag = tx.type_tag(), account = %tx.source_account(), "request received");
        let response = match self.processor.process_transaction(&tx) {
            Ok(payload) => {
                Response::approved(payload.map(codec::format_amount).unwrap_or_default())
            }
            Err(err) => {
                info!(
                    tag = tx.type_tag(),
                    account = %tx.source_account(),
                    %err,
                    "refusing transaction"
                );
                Response::refused(err.status())
            }
        };
        Ok(codec::encode_response(&response))
    }

    /// Answers requests until the peer closes the channel. Returns how many
    /// requests were answered.
    pub fn serve<C>(&mut self, channel: &mut C) -> Result<usize, ServiceError>
    where
        C: Channel + ?Sized,
    {
        let mut handled = 0;
        loop {
            let record = match channel.receive() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(ChannelError::Garbled(packet)) => {
                    error!(err = %packet, "dropping connection after garbled request");
                    return Err(packet.into());
                }
                Err(err) => return Err(err.into()),
            };
            let response = self.handle_record(&record).inspect_err(|err| {
                error!(%err, "dropping connection after malformed request");
            })?;
            channel.send(&response)?;
            handled += 1;
        }
        info!(handled, "peer closed the channel");
        Ok(handled)
    }
}
