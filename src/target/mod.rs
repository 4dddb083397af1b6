//! Execution targets
//!
//! Implementations of [`ExecutionTarget`](crate::multisig::ExecutionTarget)
//! that carry out executed transactions.

pub mod balance;

pub use balance::{BalanceBook, Delivery};
