use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    account::Account,
    credential::AccountId,
    transaction::{Transaction, TransactionKind},
};

use super::{LedgerError, TransactionProcessor};

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    pub accounts: HashMap<AccountId, Account>,
}

impl InMemoryLedger {
    pub fn open_account(&mut self, account_id: AccountId, account: Account) {
        self.accounts.insert(account_id, account);
    }

    pub fn balance(&self, account_id: &AccountId) -> Option<Decimal> {
        self.accounts.get(account_id).map(Account::balance)
    }

    fn account(&self, account_id: &AccountId) -> Result<&Account, LedgerError> {
        self.accounts
            .get(account_id)
            .ok_or_else(|| LedgerError::UnknownAccount(account_id.clone()))
    }

    fn account_mut(&mut self, account_id: &AccountId) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(account_id)
            .ok_or_else(|| LedgerError::UnknownAccount(account_id.clone()))
    }
}

impl TransactionProcessor for InMemoryLedger {
    fn process_transaction(&mut self, tx: &Transaction) -> Result<Option<Decimal>, LedgerError> {
        let source_id = tx.source_account();
        let source = self.account(source_id)?;
        source.verify_pin(tx.pin())?;

        match tx.kind() {
            TransactionKind::Withdrawal => {
                let evt = source.handle_withdrawal(tx.amount())?;
                self.account_mut(source_id)?.apply(&evt);
                Ok(None)
            }
            TransactionKind::Deposit => {
                let evt = source.handle_deposit(tx.amount());
                self.account_mut(source_id)?.apply(&evt);
                Ok(None)
            }
            TransactionKind::BalanceInquiry => Ok(Some(source.balance())),
            TransactionKind::Transfer { target } => {
                if target == source_id {
                    return Err(LedgerError::SameAccountTransfer);
                }
                let debit = source.handle_withdrawal(tx.amount())?;
                let credit = self.account(target)?.handle_deposit(tx.amount());
                // both accounts exist, so neither apply can fail half way
                self.account_mut(source_id)?.apply(&debit);
                self.account_mut(target)?.apply(&credit);
                debug!(from = %source_id, to = %target, "transfer applied");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use crate::{account::AccountError, credential::Credential};

    use super::*;

    fn ledger() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::default();
        ledger.open_account(
            "1234567".parse().unwrap(),
            Account::new("4321".parse().unwrap(), Decimal::from_u32(8500).unwrap()),
        );
        ledger.open_account(
            "7654321".parse().unwrap(),
            Account::new("0000".parse().unwrap(), Decimal::from_u32(10).unwrap()),
        );
        ledger
    }

    fn credential(card: &str) -> Credential {
        Credential::parse_card(card).unwrap()
    }

    #[test]
    fn process_some_transactions() {
        let mut ledger = ledger();
        let alice: AccountId = "1234567".parse().unwrap();
        let bob: AccountId = "7654321".parse().unwrap();

        let withdrawal =
            Transaction::withdrawal(credential("1234567 4321"), Decimal::from_u32(100).unwrap())
                .unwrap();
        assert_eq!(ledger.process_transaction(&withdrawal), Ok(None));
        assert_eq!(ledger.balance(&alice), Decimal::from_u32(8400));

        let deposit =
            Transaction::deposit(credential("7654321 0000"), Decimal::from_u32(5).unwrap())
                .unwrap();
        assert_eq!(ledger.process_transaction(&deposit), Ok(None));
        assert_eq!(ledger.balance(&bob), Decimal::from_u32(15));

        let inquiry = Transaction::balance_inquiry(credential("1234567 4321"));
        assert_eq!(
            ledger.process_transaction(&inquiry),
            Ok(Decimal::from_u32(8400))
        );

        let transfer = Transaction::transfer(
            credential("1234567 4321"),
            bob.clone(),
            Decimal::from_u32(400).unwrap(),
        )
        .unwrap();
        assert_eq!(ledger.process_transaction(&transfer), Ok(None));
        assert_eq!(ledger.balance(&alice), Decimal::from_u32(8000));
        assert_eq!(ledger.balance(&bob), Decimal::from_u32(415));
    }

    #[test]
    fn refusals_leave_balances_untouched() {
        let mut ledger = ledger();
        let alice: AccountId = "1234567".parse().unwrap();
        let bob: AccountId = "7654321".parse().unwrap();

        let wrong_pin =
            Transaction::withdrawal(credential("1234567 9999"), Decimal::ONE).unwrap();
        let err = ledger.process_transaction(&wrong_pin).unwrap_err();
        assert_eq!(err, LedgerError::AccountErr(AccountError::PinMismatch));

        let overdraw =
            Transaction::withdrawal(credential("7654321 0000"), Decimal::from_u32(11).unwrap())
                .unwrap();
        let err = ledger.process_transaction(&overdraw).unwrap_err();
        assert_eq!(err, LedgerError::AccountErr(AccountError::InsufficientFunds));

        let unknown = Transaction::balance_inquiry(credential("1111111 4321"));
        assert!(matches!(
            ledger.process_transaction(&unknown),
            Err(LedgerError::UnknownAccount(_))
        ));

        let to_nowhere = Transaction::transfer(
            credential("1234567 4321"),
            "2222222".parse().unwrap(),
            Decimal::ONE,
        )
        .unwrap();
        assert!(matches!(
            ledger.process_transaction(&to_nowhere),
            Err(LedgerError::UnknownAccount(_))
        ));

        let to_self =
            Transaction::transfer(credential("1234567 4321"), alice.clone(), Decimal::ONE)
                .unwrap();
        assert_eq!(
            ledger.process_transaction(&to_self),
            Err(LedgerError::SameAccountTransfer)
        );

        assert_eq!(ledger.balance(&alice), Decimal::from_u32(8500));
        assert_eq!(ledger.balance(&bob), Decimal::from_u32(10));
    }
}
