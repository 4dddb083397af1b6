//! Error taxonomy for wallet operations
//!
//! Every failure is synchronous and leaves the wallet exactly as it was
//! before the call.

use crate::core::Address;
use thiserror::Error;

/// Errors returned by wallet operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Unauthorized: {0} is not a signer")]
    Unauthorized(Address),
    #[error("Transaction not found: {0}")]
    NotFound(u64),
    #[error("Invalid participant: {0}")]
    InvalidParticipant(String),
    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(Address),
    #[error("Minimum participants violation: need at least {min} signers, have {have}")]
    MinimumParticipantsViolation { min: usize, have: usize },
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Transaction {0} already executed")]
    AlreadyExecuted(u64),
    #[error("Transaction {index} already confirmed by {signer}")]
    AlreadyConfirmed { index: u64, signer: Address },
    #[error("Transaction {index} not confirmed by {signer}")]
    NotConfirmed { index: u64, signer: Address },
    #[error("Insufficient confirmations: have {have}, need {need}")]
    InsufficientConfirmations { have: usize, need: usize },
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Execution of transaction {0} is in progress")]
    ExecutionInProgress(u64),
    #[error("Inconsistent wallet state: {0}")]
    InconsistentState(String),
}

/// Result alias for wallet operations
pub type Result<T> = std::result::Result<T, MultisigError>;
