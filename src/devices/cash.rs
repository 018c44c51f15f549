use rust_decimal::Decimal;
use tracing::info;

use super::{CashDispenser, DepositSlot};

/// Notes are only available in multiples of this unit.
pub const NOTE_UNIT: Decimal = Decimal::TEN;

#[derive(Debug)]
pub struct CashBox {
    cash_on_hand: Decimal,
}

impl CashBox {
    pub fn new(cash_on_hand: Decimal) -> Self {
        Self { cash_on_hand }
    }

    pub fn cash_on_hand(&self) -> Decimal {
        self.cash_on_hand
    }
}

impl CashDispenser for CashBox {
    fn has_funds(&self, amount: Decimal) -> bool {
        amount <= self.cash_on_hand
    }

    fn dispense(&mut self, amount: Decimal) -> bool {
        let whole = amount.trunc();
        let rounded = whole - whole % NOTE_UNIT;
        if rounded > self.cash_on_hand {
            return false;
        }
        self.cash_on_hand -= rounded;
        info!(%rounded, remaining = %self.cash_on_hand, "dispensing cash");
        true
    }
}

#[derive(Debug)]
pub struct EnvelopeSlot {
    accepts: bool,
}

impl EnvelopeSlot {
    pub fn new(accepts: bool) -> Self {
        Self { accepts }
    }
}

impl Default for EnvelopeSlot {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DepositSlot for EnvelopeSlot {
    fn take_envelope(&mut self) -> bool {
        info!(accepted = self.accepts, "taking deposit envelope");
        self.accepts
    }
}
