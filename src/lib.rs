//! Multisig-Engine: a multi-party transaction authorization engine in Rust
//!
//! A fixed group of signers must jointly approve a transfer before it is
//! allowed to execute. This crate provides:
//! - A signer registry with a minimum-size floor
//! - An append-only transaction ledger
//! - Per-signer confirmation tracking with revocation
//! - Threshold-gated, execute-once execution with rollback on target failure
//! - Ordered notifications for every state transition
//! - A lock-guarded shared handle with bounded async execution
//! - Checksummed JSON persistence with backups
//!
//! # Example
//!
//! ```rust
//! use multisig_engine::core::{Address, EventLog};
//! use multisig_engine::multisig::{MultisigWallet, WalletConfig};
//! use multisig_engine::target::BalanceBook;
//! use std::sync::Arc;
//!
//! let signers = ["alice", "bob", "carol"].into_iter().map(Address::from).collect();
//! let mut wallet = MultisigWallet::new(WalletConfig::with_default_threshold(signers)).unwrap();
//! let events = Arc::new(EventLog::new());
//! wallet.subscribe(events.clone());
//!
//! let (alice, bob, carol) = (Address::from("alice"), Address::from("bob"), Address::from("carol"));
//! let index = wallet.submit(&alice, Address::from("payee"), 10, vec![]).unwrap();
//! wallet.confirm(&alice, index).unwrap();
//! wallet.confirm(&bob, index).unwrap();
//!
//! let mut book = BalanceBook::new();
//! book.deposit(50);
//! wallet.execute(&carol, index, &mut book).unwrap();
//!
//! assert!(wallet.get(index).unwrap().executed);
//! assert_eq!(events.len(), 4);
//! ```

pub mod cli;
pub mod core;
pub mod multisig;
pub mod storage;
pub mod target;

// Re-export commonly used types
pub use crate::core::{Address, Event, EventLog, EventRecord, MultisigError, NotificationSink};
pub use multisig::{
    AsyncExecutionTarget, EngineConfig, ExecutionTarget, MultisigWallet, SharedWallet,
    Transaction, TxFilter, WalletConfig, MIN_SIGNERS,
};
pub use storage::{Storage, StorageConfig};
pub use target::BalanceBook;
