use std::collections::VecDeque;

use crate::{processor::TransactionProcessor, service::LedgerService};

use super::{Channel, ChannelError};

/// Connects a terminal straight to an in-process ledger service. Every sent
/// request is answered immediately and queued for the next `receive`.
pub struct LoopbackChannel<P> {
    service: LedgerService<P>,
    pending: VecDeque<String>,
    sent: usize,
}

impl<P> LoopbackChannel<P>
where
    P: TransactionProcessor,
{
    pub fn new(service: LedgerService<P>) -> Self {
        Self {
            service,
            pending: VecDeque::new(),
            sent: 0,
        }
    }

    pub fn service(&self) -> &LedgerService<P> {
        &self.service
    }

    /// Number of requests sent so far.
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl<P> Channel for LoopbackChannel<P>
where
    P: TransactionProcessor,
{
    fn send(&mut self, record: &str) -> Result<(), ChannelError> {
        self.sent += 1;
        let response = self.service.handle_record(record)?;
        self.pending.push_back(response);
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<String>, ChannelError> {
        Ok(self.pending.pop_front())
    }
}
