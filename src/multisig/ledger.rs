//! Transaction ledger
//!
//! Append-only store of submitted transactions. A transaction's index is its
//! permanent identity; records are never removed or reordered.

use crate::core::{Address, MultisigError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Lifecycle state of a transaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TxStatus {
    /// Waiting for confirmations or execution
    Pending,
    /// Executed against the target (terminal)
    Executed,
}

/// Which transactions a query should include
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxFilter {
    pub pending: bool,
    pub executed: bool,
}

impl TxFilter {
    pub const ALL: TxFilter = TxFilter {
        pending: true,
        executed: true,
    };
    pub const PENDING: TxFilter = TxFilter {
        pending: true,
        executed: false,
    };
    pub const EXECUTED: TxFilter = TxFilter {
        pending: false,
        executed: true,
    };

    fn matches(&self, tx: &Transaction) -> bool {
        (self.pending && !tx.executed) || (self.executed && tx.executed)
    }
}

/// A submitted transfer request
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// Recipient of value and payload
    pub destination: Address,
    /// Amount to transfer
    pub value: u128,
    /// Opaque data delivered with the transfer
    #[serde(with = "hex")]
    pub payload: Vec<u8>,
    /// Whether the transaction has been executed
    pub executed: bool,
    /// Number of signers currently confirming
    pub confirmation_count: usize,
    /// Signer who submitted it
    pub submitted_by: Address,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
    /// Execution timestamp, once executed
    pub executed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn status(&self) -> TxStatus {
        if self.executed {
            TxStatus::Executed
        } else {
            TxStatus::Pending
        }
    }
}

/// Append-only sequence of transactions
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionLedger {
    transactions: Vec<Transaction>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
        }
    }

    /// Append a new pending transaction and return its index
    pub fn submit(
        &mut self,
        submitted_by: Address,
        destination: Address,
        value: u128,
        payload: Vec<u8>,
    ) -> u64 {
        let index = self.transactions.len() as u64;
        self.transactions.push(Transaction {
            destination,
            value,
            payload,
            executed: false,
            confirmation_count: 0,
            submitted_by,
            submitted_at: Utc::now(),
            executed_at: None,
        });
        index
    }

    /// Get a transaction by index
    pub fn get(&self, index: u64) -> Result<&Transaction> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.transactions.get(i))
            .ok_or(MultisigError::NotFound(index))
    }

    pub(crate) fn get_mut(&mut self, index: u64) -> Result<&mut Transaction> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.transactions.get_mut(i))
            .ok_or(MultisigError::NotFound(index))
    }

    /// Get a transaction that can still change state
    pub fn get_pending(&self, index: u64) -> Result<&Transaction> {
        let tx = self.get(index)?;
        if tx.executed {
            return Err(MultisigError::AlreadyExecuted(index));
        }
        Ok(tx)
    }

    /// Current ledger length
    pub fn count(&self) -> u64 {
        self.transactions.len() as u64
    }

    /// Number of transactions matching `filter`
    pub fn count_matching(&self, filter: TxFilter) -> usize {
        self.transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .count()
    }

    /// Indices within `range` that match `filter`
    pub fn ids(&self, range: Range<u64>, filter: TxFilter) -> Vec<u64> {
        let end = range.end.min(self.count());
        (range.start..end)
            .filter(|&index| {
                self.get(index)
                    .map(|tx| filter.matches(tx))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Iterate over `(index, transaction)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Transaction)> {
        self.transactions
            .iter()
            .enumerate()
            .map(|(i, tx)| (i as u64, tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(n: usize) -> TransactionLedger {
        let mut ledger = TransactionLedger::new();
        for i in 0..n {
            ledger.submit(
                Address::from("alice"),
                Address::from("dest"),
                i as u128 * 10,
                vec![i as u8],
            );
        }
        ledger
    }

    #[test]
    fn test_submit_assigns_sequential_indices() {
        let mut ledger = TransactionLedger::new();
        let first = ledger.submit(Address::from("alice"), Address::from("d"), 5, vec![]);
        let second = ledger.submit(Address::from("bob"), Address::from("d"), 6, vec![1]);

        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(ledger.count(), 2);

        let tx = ledger.get(1).unwrap();
        assert_eq!(tx.value, 6);
        assert_eq!(tx.confirmation_count, 0);
        assert!(!tx.executed);
        assert_eq!(tx.status(), TxStatus::Pending);
        assert_eq!(tx.submitted_by, Address::from("bob"));
    }

    #[test]
    fn test_get_out_of_range() {
        let ledger = ledger_with(2);
        assert_eq!(ledger.get(2), Err(MultisigError::NotFound(2)));
        assert_eq!(ledger.get(u64::MAX), Err(MultisigError::NotFound(u64::MAX)));
    }

    #[test]
    fn test_filters_and_ids() {
        let mut ledger = ledger_with(4);
        ledger.get_mut(1).unwrap().executed = true;
        ledger.get_mut(3).unwrap().executed = true;

        assert_eq!(ledger.count_matching(TxFilter::ALL), 4);
        assert_eq!(ledger.count_matching(TxFilter::PENDING), 2);
        assert_eq!(ledger.count_matching(TxFilter::EXECUTED), 2);

        assert_eq!(ledger.ids(0..4, TxFilter::PENDING), vec![0, 2]);
        assert_eq!(ledger.ids(1..100, TxFilter::EXECUTED), vec![1, 3]);
        assert!(ledger.ids(5..10, TxFilter::ALL).is_empty());

        assert_eq!(
            ledger.get_pending(1).unwrap_err(),
            MultisigError::AlreadyExecuted(1)
        );
    }

    #[test]
    fn test_payload_serializes_as_hex() {
        let ledger = ledger_with(1);
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json[0]["payload"], "00");
    }
}
