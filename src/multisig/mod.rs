//! Threshold-approval wallet
//!
//! A fixed group of signers must jointly approve a transaction before it is
//! executed:
//! - Signer registry (at least three unique, non-null signers)
//! - Transaction ledger (append-only, index is permanent)
//! - Confirmation tracking (one confirmation per signer per transaction)
//! - Execution (threshold check, execute once, roll back on target failure)
//!
//! # Example
//!
//! ```rust
//! use multisig_engine::core::Address;
//! use multisig_engine::multisig::{MultisigWallet, WalletConfig};
//! use multisig_engine::target::BalanceBook;
//!
//! let signers: Vec<Address> = ["alice", "bob", "carol"].into_iter().map(Address::from).collect();
//! let mut wallet = MultisigWallet::new(WalletConfig::with_default_threshold(signers)).unwrap();
//!
//! let alice = Address::from("alice");
//! let bob = Address::from("bob");
//! let index = wallet.submit(&alice, Address::from("vendor"), 25, vec![]).unwrap();
//! wallet.confirm(&alice, index).unwrap();
//! wallet.confirm(&bob, index).unwrap();
//!
//! let mut book = BalanceBook::new();
//! book.deposit(100);
//! wallet.execute(&bob, index, &mut book).unwrap();
//! assert_eq!(book.balance_of(&Address::from("vendor")), 25);
//! ```

pub mod confirmation;
pub mod execution;
pub mod ledger;
pub mod registry;
pub mod shared;
pub mod wallet;

pub use confirmation::ConfirmationTracker;
pub use execution::{
    AsyncExecutionTarget, ExecutionEngine, ExecutionRequest, ExecutionTarget, ExecutionTicket,
    TargetError, DEFAULT_THRESHOLD,
};
pub use ledger::{Transaction, TransactionLedger, TxFilter, TxStatus};
pub use registry::{SignerRegistry, MIN_SIGNERS};
pub use shared::{EngineConfig, SharedWallet, DEFAULT_EXECUTION_TIMEOUT};
pub use wallet::{MultisigWallet, WalletConfig, WalletState};
