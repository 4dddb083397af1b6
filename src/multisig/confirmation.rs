//! Confirmation tracking
//!
//! The `(index, signer)` relation is the source of truth for approvals. Each
//! transaction's `confirmation_count` mirrors the size of its entry here and
//! is updated in the same step.

use crate::core::{Address, MultisigError, Result};
use crate::multisig::ledger::TransactionLedger;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Which signers have confirmed which transactions
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationTracker {
    confirmed_by: BTreeMap<u64, BTreeSet<Address>>,
}

impl ConfirmationTracker {
    pub fn new() -> Self {
        Self {
            confirmed_by: BTreeMap::new(),
        }
    }

    pub fn has_confirmed(&self, index: u64, signer: &Address) -> bool {
        self.confirmed_by
            .get(&index)
            .is_some_and(|set| set.contains(signer))
    }

    /// Signers confirming `index`, in sorted order
    pub fn confirmations(&self, index: u64) -> Vec<Address> {
        self.confirmed_by
            .get(&index)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, index: u64) -> usize {
        self.confirmed_by.get(&index).map_or(0, BTreeSet::len)
    }

    pub fn validate_confirm(
        &self,
        ledger: &TransactionLedger,
        caller: &Address,
        index: u64,
    ) -> Result<()> {
        ledger.get_pending(index)?;
        if self.has_confirmed(index, caller) {
            return Err(MultisigError::AlreadyConfirmed {
                index,
                signer: caller.clone(),
            });
        }
        Ok(())
    }

    pub fn validate_revoke(
        &self,
        ledger: &TransactionLedger,
        caller: &Address,
        index: u64,
    ) -> Result<()> {
        ledger.get_pending(index)?;
        if !self.has_confirmed(index, caller) {
            return Err(MultisigError::NotConfirmed {
                index,
                signer: caller.clone(),
            });
        }
        Ok(())
    }

    /// Record `caller`'s approval and return the new count
    pub fn confirm(
        &mut self,
        ledger: &mut TransactionLedger,
        caller: &Address,
        index: u64,
    ) -> Result<usize> {
        self.validate_confirm(ledger, caller, index)?;

        let set = self.confirmed_by.entry(index).or_default();
        set.insert(caller.clone());
        let count = set.len();
        ledger.get_mut(index)?.confirmation_count = count;
        Ok(count)
    }

    /// Withdraw `caller`'s approval and return the new count
    pub fn revoke(
        &mut self,
        ledger: &mut TransactionLedger,
        caller: &Address,
        index: u64,
    ) -> Result<usize> {
        self.validate_revoke(ledger, caller, index)?;

        let mut count = 0;
        if let Some(set) = self.confirmed_by.get_mut(&index) {
            set.remove(caller);
            count = set.len();
            if set.is_empty() {
                self.confirmed_by.remove(&index);
            }
        }
        ledger.get_mut(index)?.confirmation_count = count;
        Ok(count)
    }

    /// Verify the relation agrees with the ledger
    pub fn check_consistency(&self, ledger: &TransactionLedger) -> std::result::Result<(), String> {
        if let Some(index) = self.confirmed_by.keys().find(|&&i| i >= ledger.count()) {
            return Err(format!("confirmations recorded for unknown transaction {}", index));
        }
        for (index, tx) in ledger.iter() {
            let actual = self.count(index);
            if tx.confirmation_count != actual {
                return Err(format!(
                    "transaction {} records {} confirmations but {} signers confirmed",
                    index, tx.confirmation_count, actual
                ));
            }
        }
        Ok(())
    }
}
