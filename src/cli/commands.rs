//! CLI commands for the wallet
//!
//! Implements all command handlers for the CLI interface.

use crate::core::{Address, EventLog, EventRecord};
use crate::multisig::{MultisigWallet, Transaction, TxFilter, WalletConfig, WalletState};
use crate::storage::{Snapshot, Storage, StorageConfig};
use crate::target::BalanceBook;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn storage_for(data_dir: &Path) -> CliResult<Storage> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(storage_config)?)
}

/// Everything the CLI keeps on disk, saved as one file
///
/// An execution flips the transaction to executed and moves funds in the
/// book; both land in the same write or neither does.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub wallet: WalletState,
    pub book: BalanceBook,
    pub events: Vec<EventRecord>,
}

impl Snapshot for AppSnapshot {
    fn check_invariants(&self) -> Result<(), String> {
        self.wallet.check_invariants()?;
        if self.events.len() as u64 != self.wallet.event_sequence {
            return Err(format!(
                "event log holds {} records but the wallet emitted {}",
                self.events.len(),
                self.wallet.event_sequence
            ));
        }
        Ok(())
    }
}

/// Application state
pub struct AppState {
    pub wallet: MultisigWallet,
    pub book: BalanceBook,
    pub events: Arc<EventLog>,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the wallet, balance book and event log from `data_dir`
    pub fn load(data_dir: PathBuf) -> CliResult<Self> {
        let storage = storage_for(&data_dir)?;

        if !storage.exists() {
            return Err(format!(
                "no wallet found in {:?}; create one with `multisig init`",
                data_dir
            )
            .into());
        }

        let snapshot: AppSnapshot = storage.load()?;
        let mut wallet = MultisigWallet::from_state(snapshot.wallet)?;
        let events = Arc::new(EventLog::with_records(snapshot.events));
        wallet.subscribe(events.clone());

        Ok(Self {
            wallet,
            book: snapshot.book,
            events,
            storage,
            data_dir,
        })
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            wallet: self.wallet.state().clone(),
            book: self.book.clone(),
            events: self.events.records(),
        }
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.snapshot())?;
        Ok(())
    }
}

/// Create a new wallet
pub fn cmd_init(
    data_dir: &Path,
    signers: Vec<String>,
    threshold: usize,
    label: Option<String>,
) -> CliResult<()> {
    let storage = storage_for(data_dir)?;

    if storage.exists() {
        println!("⚠️  Wallet already exists at {:?}", data_dir);
        return Ok(());
    }

    let signers = signers.into_iter().map(Address::from).collect();
    let config = WalletConfig::new(signers, threshold, label);
    let description = config.description();
    let wallet = MultisigWallet::new(config)?;

    storage.save(&AppSnapshot {
        wallet: wallet.state().clone(),
        book: BalanceBook::new(),
        events: Vec::new(),
    })?;

    println!("✅ Wallet initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🔐 Policy: {}", description);
    for signer in wallet.signers() {
        println!("   └─ {}", signer);
    }

    Ok(())
}

/// Submit a new transaction
pub fn cmd_submit(
    state: &mut AppState,
    caller: &str,
    to: &str,
    value: u128,
    payload: Option<&str>,
) -> CliResult<()> {
    let payload = match payload {
        Some(hex_payload) => hex::decode(hex_payload.trim_start_matches("0x"))?,
        None => Vec::new(),
    };

    let index = state
        .wallet
        .submit(&Address::from(caller), Address::from(to), value, payload)?;
    state.save()?;

    println!("📤 Transaction {} submitted", index);
    println!("   To: {}", to);
    println!("   Value: {}", value);
    println!(
        "   Confirmations: 0/{}",
        state.wallet.required_threshold()
    );

    Ok(())
}

/// Confirm a transaction
pub fn cmd_confirm(state: &mut AppState, caller: &str, index: u64) -> CliResult<()> {
    state.wallet.confirm(&Address::from(caller), index)?;
    state.save()?;

    println!(
        "✍️  {} confirmed transaction {} ({}/{})",
        caller,
        index,
        state.wallet.confirmation_count(index)?,
        state.wallet.required_threshold()
    );
    Ok(())
}

/// Revoke a confirmation
pub fn cmd_revoke(state: &mut AppState, caller: &str, index: u64) -> CliResult<()> {
    state.wallet.revoke(&Address::from(caller), index)?;
    state.save()?;

    println!(
        "↩️  {} revoked confirmation of transaction {} ({}/{})",
        caller,
        index,
        state.wallet.confirmation_count(index)?,
        state.wallet.required_threshold()
    );
    Ok(())
}

/// Execute a confirmed transaction against the balance book
pub fn cmd_execute(state: &mut AppState, caller: &str, index: u64) -> CliResult<()> {
    let caller = Address::from(caller);

    match state.wallet.execute(&caller, index, &mut state.book) {
        Ok(()) => {
            if let Err(e) = state.save() {
                println!("❌ Could not save execution of transaction {}; nothing was recorded", index);
                return Err(e);
            }
            let tx = state.wallet.get(index)?;
            println!("🚀 Transaction {} executed", index);
            println!("   {} → {}", tx.value, tx.destination);
            println!("   Treasury balance: {}", state.book.treasury());
            Ok(())
        }
        Err(e) => {
            println!("❌ Execution failed; transaction {} is still pending", index);
            Err(e.into())
        }
    }
}

/// Fund the treasury
pub fn cmd_deposit(state: &mut AppState, amount: u128) -> CliResult<()> {
    let balance = state.book.deposit(amount);
    state.save()?;
    println!("💰 Deposited {} (treasury balance {})", amount, balance);
    Ok(())
}

/// List signers
pub fn cmd_signers(state: &AppState) -> CliResult<()> {
    println!("🔐 Signers ({})", state.wallet.description());
    for signer in state.wallet.signers() {
        println!("   └─ {}", signer);
    }
    Ok(())
}

/// Add a signer
pub fn cmd_signer_add(state: &mut AppState, caller: &str, signer: &str) -> CliResult<()> {
    state
        .wallet
        .add_signer(&Address::from(caller), Address::from(signer))?;
    state.save()?;
    println!("➕ Signer {} added ({})", signer, state.wallet.description());
    Ok(())
}

/// Remove a signer
pub fn cmd_signer_remove(state: &mut AppState, caller: &str, signer: &str) -> CliResult<()> {
    state
        .wallet
        .remove_signer(&Address::from(caller), &Address::from(signer))?;
    state.save()?;
    println!("➖ Signer {} removed ({})", signer, state.wallet.description());
    Ok(())
}

/// Replace a signer
pub fn cmd_signer_replace(state: &mut AppState, caller: &str, old: &str, new: &str) -> CliResult<()> {
    state
        .wallet
        .replace_signer(&Address::from(caller), &Address::from(old), Address::from(new))?;
    state.save()?;
    println!("🔁 Signer {} replaced by {}", old, new);
    Ok(())
}

fn print_transaction(state: &AppState, index: u64, tx: &Transaction) -> CliResult<()> {
    let status = if tx.executed { "executed" } else { "pending" };
    println!("📄 Transaction {} [{}]", index, status);
    println!("   ├─ Destination: {}", tx.destination);
    println!("   ├─ Value: {}", tx.value);
    println!("   ├─ Payload: {}", hex::encode(&tx.payload));
    println!("   ├─ Submitted by: {}", tx.submitted_by);
    println!(
        "   ├─ Submitted at: {}",
        tx.submitted_at.format("%Y-%m-%d %H:%M:%S")
    );
    let confirmers: Vec<String> = state
        .wallet
        .confirmations(index)?
        .iter()
        .map(ToString::to_string)
        .collect();
    println!(
        "   └─ Confirmations: {}/{} [{}]",
        tx.confirmation_count,
        state.wallet.required_threshold(),
        confirmers.join(", ")
    );
    Ok(())
}

/// Display wallet info or a single transaction
pub fn cmd_show(state: &AppState, index: Option<u64>) -> CliResult<()> {
    if let Some(index) = index {
        let tx = state.wallet.get(index)?;
        return print_transaction(state, index, tx);
    }

    println!("🏦 Wallet Info");
    if let Some(label) = state.wallet.label() {
        println!("   ├─ Label: {}", label);
    }
    println!("   ├─ Policy: {}", state.wallet.description());
    println!(
        "   ├─ Transactions: {} ({} pending)",
        state.wallet.count(),
        state.wallet.transaction_count(TxFilter::PENDING)
    );
    println!("   ├─ Treasury: {}", state.book.treasury());
    println!("   └─ Events: {}", state.events.len());

    Ok(())
}

/// List transactions
pub fn cmd_list(state: &AppState, pending: bool, executed: bool) -> CliResult<()> {
    // No flags means everything
    let filter = if !pending && !executed {
        TxFilter::ALL
    } else {
        TxFilter { pending, executed }
    };

    let ids = state.wallet.transaction_ids(0..state.wallet.count(), filter);
    if ids.is_empty() {
        println!("📭 No transactions found");
        return Ok(());
    }

    println!("📋 Transactions:");
    for index in ids {
        let tx = state.wallet.get(index)?;
        println!(
            "   #{} | {} → {} | {}/{} | {}",
            index,
            tx.value,
            tx.destination,
            tx.confirmation_count,
            state.wallet.required_threshold(),
            if tx.executed { "executed" } else { "pending" }
        );
    }

    Ok(())
}

/// Show the most recent events
pub fn cmd_events(state: &AppState, limit: usize) -> CliResult<()> {
    let records = state.events.records();
    let start = records.len().saturating_sub(limit);

    println!("🧾 Events ({} total)", records.len());
    for record in &records[start..] {
        println!(
            "   #{} | {} | {}",
            record.sequence,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            serde_json::to_string(&record.event)?
        );
    }

    Ok(())
}

/// Export wallet state to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(state.wallet.state(), path)?;
    println!("📦 Wallet exported to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signers() -> Vec<String> {
        vec!["alice".into(), "bob".into(), "carol".into()]
    }

    #[test]
    fn test_cli_flow_persists_between_loads() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();

        cmd_init(&dir, signers(), 2, Some("Ops".into())).unwrap();

        let mut state = AppState::load(dir.clone()).unwrap();
        cmd_deposit(&mut state, 100).unwrap();
        cmd_submit(&mut state, "alice", "vendor", 30, Some("0xcafe")).unwrap();
        cmd_confirm(&mut state, "alice", 0).unwrap();

        let mut state = AppState::load(dir.clone()).unwrap();
        cmd_confirm(&mut state, "bob", 0).unwrap();
        cmd_execute(&mut state, "carol", 0).unwrap();

        let state = AppState::load(dir).unwrap();
        let tx = state.wallet.get(0).unwrap();
        assert!(tx.executed);
        assert_eq!(tx.payload, vec![0xca, 0xfe]);
        assert_eq!(state.book.treasury(), 70);
        assert_eq!(state.book.balance_of(&Address::from("vendor")), 30);

        let sequences: Vec<u64> = state.events.records().iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_failed_execution_leaves_transaction_pending() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();
        cmd_init(&dir, signers(), 2, None).unwrap();

        let mut state = AppState::load(dir.clone()).unwrap();
        cmd_submit(&mut state, "alice", "vendor", 30, None).unwrap();
        cmd_confirm(&mut state, "alice", 0).unwrap();
        cmd_confirm(&mut state, "bob", 0).unwrap();

        assert!(cmd_execute(&mut state, "carol", 0).is_err());

        let state = AppState::load(dir).unwrap();
        assert!(!state.wallet.get(0).unwrap().executed);
        assert_eq!(state.wallet.confirmation_count(0).unwrap(), 2);
    }

    #[test]
    fn test_load_without_init_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(AppState::load(temp_dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_execute_save_failure_leaves_disk_unchanged() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();
        cmd_init(&dir, signers(), 2, None).unwrap();

        let mut state = AppState::load(dir.clone()).unwrap();
        cmd_deposit(&mut state, 100).unwrap();
        cmd_submit(&mut state, "alice", "vendor", 30, None).unwrap();
        cmd_confirm(&mut state, "alice", 0).unwrap();
        cmd_confirm(&mut state, "bob", 0).unwrap();

        // A directory in the temp file's place makes the write fail
        std::fs::create_dir(dir.join("wallet.json.tmp")).unwrap();
        assert!(cmd_execute(&mut state, "carol", 0).is_err());
        std::fs::remove_dir(dir.join("wallet.json.tmp")).unwrap();

        let state = AppState::load(dir.clone()).unwrap();
        assert!(!state.wallet.get(0).unwrap().executed);
        assert_eq!(state.book.treasury(), 100);
        assert_eq!(state.book.balance_of(&Address::from("vendor")), 0);

        // The transaction can still be executed from the saved state
        let mut state = state;
        cmd_execute(&mut state, "carol", 0).unwrap();
        let state = AppState::load(dir).unwrap();
        assert!(state.wallet.get(0).unwrap().executed);
        assert_eq!(state.book.treasury(), 70);
        assert_eq!(state.book.balance_of(&Address::from("vendor")), 30);
    }

    #[test]
    fn test_snapshot_rejects_missing_events() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();
        cmd_init(&dir, signers(), 2, None).unwrap();

        let mut state = AppState::load(dir).unwrap();
        cmd_submit(&mut state, "alice", "vendor", 30, None).unwrap();

        let mut snapshot = state.snapshot();
        assert!(snapshot.check_invariants().is_ok());
        snapshot.events.clear();
        assert!(snapshot.check_invariants().is_err());
    }
}
