//! Thread-safe wallet handle
//!
//! [`SharedWallet`] serializes every mutation behind one write lock and serves
//! reads under the read lock. `execute` releases the lock while the target
//! runs; the wallet's in-flight marker rejects any mutation that arrives in
//! the meantime, including calls the target makes back into the wallet.

use crate::core::{Address, MultisigError, NotificationSink, Result};
use crate::multisig::execution::{AsyncExecutionTarget, TargetError};
use crate::multisig::ledger::{Transaction, TxFilter};
use crate::multisig::wallet::{MultisigWallet, WalletState};
use futures::FutureExt;
use std::ops::Range;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Default bound on a single execution target call
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime settings for a shared wallet
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// How long the execution target may take before the attempt is rolled back
    pub execution_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }
}

/// Cloneable handle to a wallet shared between tasks
#[derive(Clone, Debug)]
pub struct SharedWallet {
    inner: Arc<RwLock<MultisigWallet>>,
    config: EngineConfig,
}

impl SharedWallet {
    pub fn new(wallet: MultisigWallet, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(wallet)),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn subscribe(&self, sink: Arc<dyn NotificationSink>) {
        self.inner.write().await.subscribe(sink);
    }

    pub async fn add_signer(&self, caller: &Address, signer: Address) -> Result<()> {
        self.inner.write().await.add_signer(caller, signer)
    }

    pub async fn remove_signer(&self, caller: &Address, signer: &Address) -> Result<()> {
        self.inner.write().await.remove_signer(caller, signer)
    }

    pub async fn replace_signer(&self, caller: &Address, old: &Address, new: Address) -> Result<()> {
        self.inner.write().await.replace_signer(caller, old, new)
    }

    pub async fn submit(
        &self,
        caller: &Address,
        destination: Address,
        value: u128,
        payload: Vec<u8>,
    ) -> Result<u64> {
        self.inner
            .write()
            .await
            .submit(caller, destination, value, payload)
    }

    pub async fn confirm(&self, caller: &Address, index: u64) -> Result<()> {
        self.inner.write().await.confirm(caller, index)
    }

    pub async fn revoke(&self, caller: &Address, index: u64) -> Result<()> {
        self.inner.write().await.revoke(caller, index)
    }

    /// Execute a confirmed transaction against an async target
    ///
    /// The target runs on its own task and is bounded by the configured
    /// timeout. A timeout, panic or reported failure rolls the transaction
    /// back to pending. Once started, the attempt runs to completion even if
    /// this future is dropped.
    pub async fn execute<T>(&self, caller: &Address, index: u64, target: Arc<T>) -> Result<()>
    where
        T: AsyncExecutionTarget + ?Sized,
    {
        let ticket = self.inner.write().await.begin_execution(caller, index)?;
        let ticket_id = ticket.id();
        let inner = Arc::clone(&self.inner);
        let timeout = self.config.execution_timeout;

        let handle = tokio::spawn(async move {
            let request = ticket.request().clone();
            // Building the future happens inside the unwind boundary too
            let call = AssertUnwindSafe(async move { target.apply(request).await }).catch_unwind();
            let outcome = match tokio::time::timeout(timeout, call).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(_)) => Err(TargetError::panicked()),
                Err(_) => Err(TargetError::new(format!(
                    "execution target timed out after {:?}",
                    timeout
                ))),
            };
            inner.write().await.complete_execution(ticket, outcome)
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                self.inner.write().await.abort_execution(ticket_id);
                Err(MultisigError::ExecutionFailed(format!(
                    "execution task failed: {}",
                    e
                )))
            }
        }
    }

    pub async fn is_signer(&self, identity: &Address) -> bool {
        self.inner.read().await.is_signer(identity)
    }

    pub async fn signers(&self) -> Vec<Address> {
        self.inner.read().await.signers()
    }

    pub async fn get(&self, index: u64) -> Result<Transaction> {
        self.inner.read().await.get(index).cloned()
    }

    pub async fn count(&self) -> u64 {
        self.inner.read().await.count()
    }

    pub async fn confirmations(&self, index: u64) -> Result<Vec<Address>> {
        self.inner.read().await.confirmations(index)
    }

    pub async fn transaction_ids(&self, range: Range<u64>, filter: TxFilter) -> Vec<u64> {
        self.inner.read().await.transaction_ids(range, filter)
    }

    /// Consistent copy of the whole wallet state
    pub async fn snapshot(&self) -> WalletState {
        self.inner.read().await.state().clone()
    }
}
