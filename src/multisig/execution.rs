//! Execution engine
//!
//! Execution runs in two steps. [`ExecutionEngine::begin`] checks every guard
//! and marks the transaction in flight; [`ExecutionEngine::complete`] either
//! commits it as executed or rolls it back to pending, depending on what the
//! target reported. Nothing else on the wallet may change in between.

use crate::core::{Address, MultisigError, Result};
use crate::multisig::ledger::TransactionLedger;
use chrono::Utc;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Confirmations required when no threshold is configured
pub const DEFAULT_THRESHOLD: usize = 2;

/// Ticket ids are unique across every engine in the process
static NEXT_TICKET_ID: AtomicU64 = AtomicU64::new(1);

/// Failure reported by an execution target
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TargetError(pub String);

impl TargetError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }

    pub(crate) fn panicked() -> Self {
        Self::new("execution target panicked")
    }
}

/// What the target is asked to perform
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub index: u64,
    pub destination: Address,
    pub value: u128,
    pub payload: Vec<u8>,
}

/// Moves value and delivers payloads on behalf of a wallet
pub trait ExecutionTarget {
    fn apply(&mut self, request: &ExecutionRequest) -> std::result::Result<(), TargetError>;
}

/// Async counterpart of [`ExecutionTarget`], used by shared wallets
pub trait AsyncExecutionTarget: Send + Sync + 'static {
    fn apply(&self, request: ExecutionRequest) -> BoxFuture<'_, std::result::Result<(), TargetError>>;
}

impl<T> AsyncExecutionTarget for tokio::sync::Mutex<T>
where
    T: ExecutionTarget + Send + 'static,
{
    fn apply(&self, request: ExecutionRequest) -> BoxFuture<'_, std::result::Result<(), TargetError>> {
        Box::pin(async move { self.lock().await.apply(&request) })
    }
}

/// Proof that `begin` succeeded; must be handed back to `complete`
#[derive(Debug)]
pub struct ExecutionTicket {
    id: u64,
    caller: Address,
    request: ExecutionRequest,
}

impl ExecutionTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn index(&self) -> u64 {
        self.request.index
    }

    pub fn caller(&self) -> &Address {
        &self.caller
    }

    pub fn request(&self) -> &ExecutionRequest {
        &self.request
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InFlight {
    index: u64,
    ticket_id: u64,
}

/// Threshold check and execute-once bookkeeping
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionEngine {
    required_threshold: usize,
    #[serde(skip)]
    in_flight: Option<InFlight>,
}

impl ExecutionEngine {
    pub fn new(required_threshold: usize) -> Self {
        Self {
            required_threshold,
            in_flight: None,
        }
    }

    pub fn required_threshold(&self) -> usize {
        self.required_threshold
    }

    /// Index of the transaction currently being executed, if any
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight.map(|f| f.index)
    }

    /// Fail with `ExecutionInProgress` while a ticket is outstanding
    pub fn ensure_idle(&self) -> Result<()> {
        match self.in_flight {
            Some(f) => Err(MultisigError::ExecutionInProgress(f.index)),
            None => Ok(()),
        }
    }

    pub fn validate(&self, ledger: &TransactionLedger, index: u64) -> Result<()> {
        self.ensure_idle()?;
        let tx = ledger.get_pending(index)?;
        if tx.confirmation_count < self.required_threshold {
            return Err(MultisigError::InsufficientConfirmations {
                have: tx.confirmation_count,
                need: self.required_threshold,
            });
        }
        Ok(())
    }

    /// Check every guard and mark `index` in flight
    pub fn begin(
        &mut self,
        ledger: &TransactionLedger,
        caller: &Address,
        index: u64,
    ) -> Result<ExecutionTicket> {
        self.validate(ledger, index)?;
        let tx = ledger.get(index)?;
        let request = ExecutionRequest {
            index,
            destination: tx.destination.clone(),
            value: tx.value,
            payload: tx.payload.clone(),
        };
        let id = NEXT_TICKET_ID.fetch_add(1, Ordering::Relaxed);
        self.in_flight = Some(InFlight {
            index,
            ticket_id: id,
        });
        Ok(ExecutionTicket {
            id,
            caller: caller.clone(),
            request,
        })
    }

    /// Commit or roll back an execution started with `begin`
    pub fn complete(
        &mut self,
        ledger: &mut TransactionLedger,
        ticket: &ExecutionTicket,
        outcome: std::result::Result<(), TargetError>,
    ) -> Result<()> {
        let index = ticket.index();
        let expected = InFlight {
            index,
            ticket_id: ticket.id,
        };
        if self.in_flight != Some(expected) {
            return Err(MultisigError::ExecutionFailed(format!(
                "ticket {} does not match an execution of transaction {} in progress",
                ticket.id, index
            )));
        }
        self.in_flight = None;

        match outcome {
            Ok(()) => {
                let tx = ledger.get_mut(index)?;
                tx.executed = true;
                tx.executed_at = Some(Utc::now());
                Ok(())
            }
            Err(e) => Err(MultisigError::ExecutionFailed(e.0)),
        }
    }

    /// Drop the in-flight marker of an attempt whose ticket was lost
    ///
    /// The ledger is left untouched. Returns false when `ticket_id` is not
    /// the outstanding ticket.
    pub fn abort(&mut self, ticket_id: u64) -> bool {
        match self.in_flight {
            Some(f) if f.ticket_id == ticket_id => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Run `begin`, the target and `complete` in one call
    ///
    /// A panicking target is reported as a failure and rolled back.
    pub fn execute(
        &mut self,
        ledger: &mut TransactionLedger,
        caller: &Address,
        index: u64,
        target: &mut dyn ExecutionTarget,
    ) -> Result<()> {
        let ticket = self.begin(ledger, caller, index)?;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| target.apply(ticket.request())))
            .unwrap_or_else(|_| Err(TargetError::panicked()));
        self.complete(ledger, &ticket, outcome)
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
