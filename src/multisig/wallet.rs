//! Multi-signature wallet instance
//!
//! [`MultisigWallet`] owns the signer registry, the transaction ledger, the
//! confirmation relation and the execution engine for one wallet. Every
//! mutating operation runs its guards first and only then touches state, so a
//! failed call never leaves a partial change behind. Events are emitted after
//! the change is applied, in the order the changes happened.

use crate::core::{Address, Event, EventRecord, MultisigError, NotificationSink, Result};
use crate::multisig::confirmation::ConfirmationTracker;
use crate::multisig::execution::{
    ExecutionEngine, ExecutionTarget, ExecutionTicket, TargetError, DEFAULT_THRESHOLD,
};
use crate::multisig::ledger::{Transaction, TransactionLedger, TxFilter};
use crate::multisig::registry::{SignerRegistry, MIN_SIGNERS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Construction parameters for a wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WalletConfig {
    /// Initial signers, in order
    pub signers: Vec<Address>,
    /// Confirmations required to execute
    pub threshold: usize,
    /// Optional human-readable label
    pub label: Option<String>,
}

impl WalletConfig {
    pub fn new(signers: Vec<Address>, threshold: usize, label: Option<String>) -> Self {
        Self {
            signers,
            threshold,
            label,
        }
    }

    /// Configuration with the default 2-confirmation threshold
    pub fn with_default_threshold(signers: Vec<Address>) -> Self {
        Self::new(signers, DEFAULT_THRESHOLD, None)
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.signers.len())
    }
}

/// Everything needed to restore a wallet
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletState {
    pub label: Option<String>,
    pub signers: SignerRegistry,
    pub transactions: TransactionLedger,
    pub confirmations: ConfirmationTracker,
    pub engine: ExecutionEngine,
    /// Sequence number the next event will carry
    pub event_sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl WalletState {
    /// Re-derive every state invariant
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let threshold = self.engine.required_threshold();
        if self.signers.len() < MIN_SIGNERS {
            return Err(format!(
                "{} signers is below the minimum of {}",
                self.signers.len(),
                MIN_SIGNERS
            ));
        }
        if threshold == 0 || threshold > self.signers.len() {
            return Err(format!(
                "threshold {} is outside 1..={}",
                threshold,
                self.signers.len()
            ));
        }
        self.confirmations.check_consistency(&self.transactions)
    }
}

/// A wallet whose transactions need several signers to approve them
pub struct MultisigWallet {
    state: WalletState,
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl fmt::Debug for MultisigWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultisigWallet")
            .field("state", &self.state)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl MultisigWallet {
    /// Create a new wallet
    ///
    /// # Errors
    /// Signer validation errors from [`SignerRegistry::new`], then
    /// `InvalidThreshold` unless `1 <= threshold <= signers`.
    pub fn new(config: WalletConfig) -> Result<Self> {
        let signer_count = config.signers.len();
        let signers = SignerRegistry::new(config.signers)?;

        if config.threshold == 0 {
            return Err(MultisigError::InvalidThreshold(
                "threshold must be at least 1".to_string(),
            ));
        }
        if config.threshold > signer_count {
            return Err(MultisigError::InvalidThreshold(format!(
                "threshold {} exceeds signer count {}",
                config.threshold, signer_count
            )));
        }

        log::info!(
            "Wallet created: {}-of-{}{}",
            config.threshold,
            signer_count,
            config
                .label
                .as_deref()
                .map(|l| format!(" ({})", l))
                .unwrap_or_default()
        );

        Ok(Self {
            state: WalletState {
                label: config.label,
                signers,
                transactions: TransactionLedger::new(),
                confirmations: ConfirmationTracker::new(),
                engine: ExecutionEngine::new(config.threshold),
                event_sequence: 0,
                created_at: Utc::now(),
            },
            sinks: Vec::new(),
        })
    }

    /// Restore a wallet from a saved snapshot
    pub fn from_state(state: WalletState) -> Result<Self> {
        state
            .check_invariants()
            .map_err(MultisigError::InconsistentState)?;
        Ok(Self {
            state,
            sinks: Vec::new(),
        })
    }

    /// Attach a notification sink
    pub fn subscribe(&mut self, sink: Arc<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    /// Snapshot of the persisted state
    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.state.check_invariants()
    }

    fn emit(&mut self, event: Event) {
        let record = EventRecord {
            sequence: self.state.event_sequence,
            timestamp: Utc::now(),
            event,
        };
        self.state.event_sequence += 1;

        log::debug!(
            "Event #{} {} -> {} sink(s)",
            record.sequence,
            record.event.kind(),
            self.sinks.len()
        );
        for sink in &self.sinks {
            sink.notify(&record);
        }
    }

    /// Guards shared by every mutating operation
    fn authorize(&self, caller: &Address) -> Result<()> {
        self.state.engine.ensure_idle()?;
        self.state.signers.authorize(caller).inspect_err(|e| {
            log::debug!("Rejected call: {}", e);
        })
    }

    fn signer_floor(&self) -> usize {
        MIN_SIGNERS.max(self.state.engine.required_threshold())
    }

    // ---- Signer management ----

    pub fn add_signer(&mut self, caller: &Address, signer: Address) -> Result<()> {
        self.authorize(caller)?;
        self.state.signers.add(signer.clone())?;

        log::info!("Signer added: {} (by {})", signer, caller);
        self.emit(Event::SignerAdded { signer });
        Ok(())
    }

    /// Remove a signer; order of the remaining signers may change
    ///
    /// Existing confirmations by the removed signer stay recorded.
    pub fn remove_signer(&mut self, caller: &Address, signer: &Address) -> Result<()> {
        self.authorize(caller)?;
        let floor = self.signer_floor();
        self.state.signers.remove(signer, floor)?;

        log::info!("Signer removed: {} (by {})", signer, caller);
        self.emit(Event::SignerRemoved {
            signer: signer.clone(),
        });
        Ok(())
    }

    /// Swap one signer for another in the same slot
    pub fn replace_signer(&mut self, caller: &Address, old: &Address, new: Address) -> Result<()> {
        self.authorize(caller)?;
        self.state.signers.replace(old, new.clone())?;

        log::info!("Signer replaced: {} -> {} (by {})", old, new, caller);
        self.emit(Event::SignerRemoved {
            signer: old.clone(),
        });
        self.emit(Event::SignerAdded { signer: new });
        Ok(())
    }

    pub fn is_signer(&self, identity: &Address) -> bool {
        self.state.signers.is_signer(identity)
    }

    pub fn signers(&self) -> Vec<Address> {
        self.state.signers.signers().to_vec()
    }

    pub fn signer_count(&self) -> usize {
        self.state.signers.len()
    }

    pub fn required_threshold(&self) -> usize {
        self.state.engine.required_threshold()
    }

    pub fn label(&self) -> Option<&str> {
        self.state.label.as_deref()
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.required_threshold(), self.signer_count())
    }

    // ---- Transactions ----

    /// Submit a new transaction and return its index
    pub fn submit(
        &mut self,
        caller: &Address,
        destination: Address,
        value: u128,
        payload: Vec<u8>,
    ) -> Result<u64> {
        self.authorize(caller)?;
        let index = self.state.transactions.submit(
            caller.clone(),
            destination.clone(),
            value,
            payload.clone(),
        );

        log::info!(
            "Transaction {} submitted by {}: {} to {}",
            index,
            caller,
            value,
            destination
        );
        self.emit(Event::Submitted {
            caller: caller.clone(),
            index,
            destination,
            value,
            payload,
        });
        Ok(index)
    }

    pub fn get(&self, index: u64) -> Result<&Transaction> {
        self.state.transactions.get(index)
    }

    /// Total number of submitted transactions
    pub fn count(&self) -> u64 {
        self.state.transactions.count()
    }

    pub fn transaction_count(&self, filter: TxFilter) -> usize {
        self.state.transactions.count_matching(filter)
    }

    pub fn transaction_ids(&self, range: Range<u64>, filter: TxFilter) -> Vec<u64> {
        self.state.transactions.ids(range, filter)
    }

    // ---- Confirmations ----

    pub fn confirm(&mut self, caller: &Address, index: u64) -> Result<()> {
        self.authorize(caller)?;
        let count = self
            .state
            .confirmations
            .confirm(&mut self.state.transactions, caller, index)?;

        log::info!(
            "Transaction {} confirmed by {} ({}/{})",
            index,
            caller,
            count,
            self.required_threshold()
        );
        self.emit(Event::Confirmed {
            caller: caller.clone(),
            index,
        });
        Ok(())
    }

    pub fn revoke(&mut self, caller: &Address, index: u64) -> Result<()> {
        self.authorize(caller)?;
        let count = self
            .state
            .confirmations
            .revoke(&mut self.state.transactions, caller, index)?;

        log::info!(
            "Confirmation of transaction {} revoked by {} ({}/{})",
            index,
            caller,
            count,
            self.required_threshold()
        );
        self.emit(Event::Revoked {
            caller: caller.clone(),
            index,
        });
        Ok(())
    }

    /// Signers currently confirming `index`
    pub fn confirmations(&self, index: u64) -> Result<Vec<Address>> {
        self.state.transactions.get(index)?;
        Ok(self.state.confirmations.confirmations(index))
    }

    pub fn confirmation_count(&self, index: u64) -> Result<usize> {
        Ok(self.state.transactions.get(index)?.confirmation_count)
    }

    /// Whether `index` has reached the threshold
    pub fn is_confirmed(&self, index: u64) -> Result<bool> {
        Ok(self.confirmation_count(index)? >= self.required_threshold())
    }

    // ---- Execution ----

    /// Execute a confirmed transaction against `target`
    ///
    /// If the target fails or panics the transaction stays pending with its
    /// confirmations untouched and the call returns `ExecutionFailed`.
    pub fn execute(
        &mut self,
        caller: &Address,
        index: u64,
        target: &mut dyn ExecutionTarget,
    ) -> Result<()> {
        self.authorize(caller)?;
        let result = self
            .state
            .engine
            .execute(&mut self.state.transactions, caller, index, target);
        self.finish_execution(caller, index, result)
    }

    /// First half of [`execute`](Self::execute)
    ///
    /// Until the ticket is completed or aborted every mutating call on this
    /// wallet fails with `ExecutionInProgress`.
    pub fn begin_execution(&mut self, caller: &Address, index: u64) -> Result<ExecutionTicket> {
        self.authorize(caller)?;
        let ticket = self
            .state
            .engine
            .begin(&self.state.transactions, caller, index)?;
        log::debug!("Execution of transaction {} started by {}", index, caller);
        Ok(ticket)
    }

    /// Second half of [`execute`](Self::execute)
    pub fn complete_execution(
        &mut self,
        ticket: ExecutionTicket,
        outcome: std::result::Result<(), TargetError>,
    ) -> Result<()> {
        let result = self
            .state
            .engine
            .complete(&mut self.state.transactions, &ticket, outcome);
        self.finish_execution(ticket.caller(), ticket.index(), result)
    }

    /// Release an attempt whose ticket can no longer be completed
    ///
    /// The transaction stays pending. Returns false if `ticket_id` is not
    /// the outstanding ticket.
    pub fn abort_execution(&mut self, ticket_id: u64) -> bool {
        let index = self.state.engine.in_flight();
        let aborted = self.state.engine.abort(ticket_id);
        if let (true, Some(index)) = (aborted, index) {
            log::warn!("Execution of transaction {} aborted", index);
        }
        aborted
    }

    fn finish_execution(&mut self, caller: &Address, index: u64, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                log::info!("Transaction {} executed by {}", index, caller);
                self.emit(Event::Executed {
                    caller: caller.clone(),
                    index,
                });
                Ok(())
            }
            Err(e) => {
                log::warn!("Transaction {} not executed: {}", index, e);
                Err(e)
            }
        }
    }

    /// Transaction currently being executed, if any
    pub fn in_flight(&self) -> Option<u64> {
        self.state.engine.in_flight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventLog;
    use crate::multisig::execution::ExecutionRequest;

    #[derive(Default)]
    struct TestTarget {
        fail: bool,
        applied: Vec<ExecutionRequest>,
    }

    impl ExecutionTarget for TestTarget {
        fn apply(&mut self, request: &ExecutionRequest) -> std::result::Result<(), TargetError> {
            if self.fail {
                return Err(TargetError::new("target unavailable"));
            }
            self.applied.push(request.clone());
            Ok(())
        }
    }

    fn a(name: &str) -> Address {
        Address::from(name)
    }

    fn create_test_wallet() -> (MultisigWallet, Arc<EventLog>) {
        let config = WalletConfig::with_default_threshold(vec![a("alice"), a("bob"), a("carol")]);
        let mut wallet = MultisigWallet::new(config).unwrap();
        let log = Arc::new(EventLog::new());
        wallet.subscribe(log.clone());
        (wallet, log)
    }

    #[test]
    fn test_wallet_creation() {
        let (wallet, _) = create_test_wallet();
        assert_eq!(wallet.signers(), vec![a("alice"), a("bob"), a("carol")]);
        assert_eq!(wallet.required_threshold(), 2);
        assert_eq!(wallet.description(), "2-of-3");
        assert_eq!(wallet.count(), 0);
        assert!(wallet.check_invariants().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let signers = vec![a("alice"), a("bob"), a("carol")];

        assert!(matches!(
            MultisigWallet::new(WalletConfig::new(signers.clone(), 0, None)),
            Err(MultisigError::InvalidThreshold(_))
        ));
        assert!(matches!(
            MultisigWallet::new(WalletConfig::new(signers, 4, None)),
            Err(MultisigError::InvalidThreshold(_))
        ));
        assert!(matches!(
            MultisigWallet::new(WalletConfig::with_default_threshold(vec![a("alice"), a("bob")])),
            Err(MultisigError::MinimumParticipantsViolation { .. })
        ));
        assert!(matches!(
            MultisigWallet::new(WalletConfig::with_default_threshold(vec![
                a("alice"),
                a("bob"),
                a("bob")
            ])),
            Err(MultisigError::DuplicateParticipant(_))
        ));
    }

    #[test]
    fn test_full_scenario() {
        let (mut wallet, log) = create_test_wallet();
        let mut target = TestTarget::default();

        let index = wallet.submit(&a("alice"), a("dest"), 500, vec![]).unwrap();
        assert_eq!(index, 0);
        assert_eq!(wallet.confirmation_count(0).unwrap(), 0);

        wallet.confirm(&a("alice"), 0).unwrap();
        wallet.confirm(&a("bob"), 0).unwrap();
        assert_eq!(wallet.confirmation_count(0).unwrap(), 2);
        assert!(wallet.is_confirmed(0).unwrap());

        wallet.execute(&a("carol"), 0, &mut target).unwrap();
        assert!(wallet.get(0).unwrap().executed);
        assert_eq!(target.applied.len(), 1);
        assert_eq!(target.applied[0].destination, a("dest"));
        assert_eq!(target.applied[0].value, 500);
        assert!(target.applied[0].payload.is_empty());

        assert_eq!(
            wallet.execute(&a("alice"), 0, &mut target),
            Err(MultisigError::AlreadyExecuted(0))
        );
        assert_eq!(target.applied.len(), 1);

        let kinds: Vec<_> = log.events().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec!["submitted", "confirmed", "confirmed", "executed"]
        );
        let sequences: Vec<_> = log.records().iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_non_signer_is_unauthorized() {
        let (mut wallet, log) = create_test_wallet();
        let mut target = TestTarget::default();
        wallet.submit(&a("alice"), a("dest"), 1, vec![]).unwrap();
        let events_before = log.len();
        let mallory = a("mallory");

        let unauthorized = MultisigError::Unauthorized(mallory.clone());
        assert_eq!(
            wallet.submit(&mallory, a("dest"), 1, vec![]),
            Err(unauthorized.clone())
        );
        assert_eq!(wallet.confirm(&mallory, 0), Err(unauthorized.clone()));
        assert_eq!(wallet.revoke(&mallory, 0), Err(unauthorized.clone()));
        assert_eq!(
            wallet.execute(&mallory, 0, &mut target),
            Err(unauthorized.clone())
        );
        assert_eq!(
            wallet.add_signer(&mallory, a("eve")),
            Err(unauthorized.clone())
        );
        assert_eq!(
            wallet.remove_signer(&mallory, &a("alice")),
            Err(unauthorized)
        );
        assert_eq!(log.len(), events_before);
        assert_eq!(wallet.count(), 1);
    }

    #[test]
    fn test_confirm_then_revoke() {
        let (mut wallet, _) = create_test_wallet();
        wallet.submit(&a("alice"), a("dest"), 1, vec![]).unwrap();
        wallet.confirm(&a("alice"), 0).unwrap();

        wallet.confirm(&a("bob"), 0).unwrap();
        assert_eq!(wallet.confirmation_count(0).unwrap(), 2);
        wallet.revoke(&a("bob"), 0).unwrap();
        assert_eq!(wallet.confirmation_count(0).unwrap(), 1);
        assert_eq!(wallet.confirmations(0).unwrap(), vec![a("alice")]);

        assert!(matches!(
            wallet.revoke(&a("bob"), 0),
            Err(MultisigError::NotConfirmed { index: 0, .. })
        ));
        assert!(wallet.check_invariants().is_ok());
    }

    #[test]
    fn test_executed_transaction_is_terminal() {
        let (mut wallet, log) = create_test_wallet();
        let mut target = TestTarget::default();
        wallet.submit(&a("alice"), a("dest"), 1, vec![]).unwrap();
        wallet.confirm(&a("alice"), 0).unwrap();
        wallet.confirm(&a("bob"), 0).unwrap();
        wallet.execute(&a("bob"), 0, &mut target).unwrap();
        let snapshot = wallet.get(0).unwrap().clone();
        let events_before = log.len();

        assert_eq!(
            wallet.confirm(&a("carol"), 0),
            Err(MultisigError::AlreadyExecuted(0))
        );
        assert_eq!(
            wallet.revoke(&a("alice"), 0),
            Err(MultisigError::AlreadyExecuted(0))
        );
        assert_eq!(
            wallet.execute(&a("carol"), 0, &mut target),
            Err(MultisigError::AlreadyExecuted(0))
        );
        assert_eq!(wallet.get(0).unwrap(), &snapshot);
        assert_eq!(log.len(), events_before);
    }

    #[test]
    fn test_threshold_gate() {
        let (mut wallet, _) = create_test_wallet();
        let mut target = TestTarget::default();
        wallet.submit(&a("alice"), a("dest"), 1, vec![]).unwrap();

        assert_eq!(
            wallet.execute(&a("alice"), 0, &mut target),
            Err(MultisigError::InsufficientConfirmations { have: 0, need: 2 })
        );
        wallet.confirm(&a("alice"), 0).unwrap();
        assert_eq!(
            wallet.execute(&a("alice"), 0, &mut target),
            Err(MultisigError::InsufficientConfirmations { have: 1, need: 2 })
        );
        assert!(target.applied.is_empty());
        assert_eq!(wallet.get(1).unwrap_err(), MultisigError::NotFound(1));
    }

    #[test]
    fn test_target_failure_rolls_back() {
        let (mut wallet, log) = create_test_wallet();
        let mut target = TestTarget {
            fail: true,
            ..Default::default()
        };
        wallet.submit(&a("alice"), a("dest"), 1, vec![9]).unwrap();
        wallet.confirm(&a("alice"), 0).unwrap();
        wallet.confirm(&a("bob"), 0).unwrap();
        let before = wallet.get(0).unwrap().clone();
        let events_before = log.len();

        assert_eq!(
            wallet.execute(&a("carol"), 0, &mut target),
            Err(MultisigError::ExecutionFailed("target unavailable".to_string()))
        );
        assert_eq!(wallet.get(0).unwrap(), &before);
        assert_eq!(log.len(), events_before);
        assert!(wallet.in_flight().is_none());

        // Retrying while pending is allowed
        target.fail = false;
        wallet.execute(&a("carol"), 0, &mut target).unwrap();
        assert!(wallet.get(0).unwrap().executed);
    }

    #[test]
    fn test_open_ticket_blocks_mutations() {
        let (mut wallet, _) = create_test_wallet();
        wallet.submit(&a("alice"), a("dest"), 1, vec![]).unwrap();
        wallet.confirm(&a("alice"), 0).unwrap();
        wallet.confirm(&a("bob"), 0).unwrap();

        let ticket = wallet.begin_execution(&a("carol"), 0).unwrap();
        let busy = MultisigError::ExecutionInProgress(0);
        assert_eq!(wallet.confirm(&a("carol"), 0), Err(busy.clone()));
        assert_eq!(
            wallet.submit(&a("alice"), a("dest"), 1, vec![]),
            Err(busy.clone())
        );
        assert_eq!(wallet.add_signer(&a("alice"), a("dave")), Err(busy.clone()));
        assert_eq!(wallet.begin_execution(&a("alice"), 0).unwrap_err(), busy);

        // Reads still see the committed state
        assert!(!wallet.get(0).unwrap().executed);
        assert_eq!(wallet.count(), 1);

        wallet.complete_execution(ticket, Ok(())).unwrap();
        assert!(wallet.get(0).unwrap().executed);
        wallet.add_signer(&a("alice"), a("dave")).unwrap();
    }

    struct PanickingTarget;

    impl ExecutionTarget for PanickingTarget {
        fn apply(&mut self, request: &ExecutionRequest) -> std::result::Result<(), TargetError> {
            assert!(request.value < 5, "value too large");
            Ok(())
        }
    }

    #[test]
    fn test_panicking_target_rolls_back() {
        let (mut wallet, log) = create_test_wallet();
        wallet.submit(&a("alice"), a("dest"), 10, vec![]).unwrap();
        wallet.confirm(&a("alice"), 0).unwrap();
        wallet.confirm(&a("bob"), 0).unwrap();
        let events_before = log.len();

        assert_eq!(
            wallet.execute(&a("carol"), 0, &mut PanickingTarget),
            Err(MultisigError::ExecutionFailed("execution target panicked".to_string()))
        );
        assert!(wallet.in_flight().is_none());
        assert!(!wallet.get(0).unwrap().executed);
        assert_eq!(log.len(), events_before);

        // The wallet is still usable
        wallet.submit(&a("alice"), a("dest"), 1, vec![]).unwrap();
        wallet.execute(&a("carol"), 0, &mut TestTarget::default()).unwrap();
        assert!(wallet.get(0).unwrap().executed);
    }

    #[test]
    fn test_abort_execution_releases_wallet() {
        let (mut wallet, log) = create_test_wallet();
        wallet.submit(&a("alice"), a("dest"), 1, vec![]).unwrap();
        wallet.confirm(&a("alice"), 0).unwrap();
        wallet.confirm(&a("bob"), 0).unwrap();
        let events_before = log.len();

        let ticket = wallet.begin_execution(&a("carol"), 0).unwrap();
        assert!(!wallet.abort_execution(ticket.id() + 1));
        assert_eq!(wallet.in_flight(), Some(0));

        assert!(wallet.abort_execution(ticket.id()));
        assert!(wallet.in_flight().is_none());
        assert!(!wallet.get(0).unwrap().executed);
        assert_eq!(log.len(), events_before);

        assert!(matches!(
            wallet.complete_execution(ticket, Ok(())),
            Err(MultisigError::ExecutionFailed(_))
        ));
        assert!(!wallet.get(0).unwrap().executed);
        wallet.confirm(&a("carol"), 0).unwrap();
    }

    #[test]
    fn test_signer_management() {
        let (mut wallet, log) = create_test_wallet();

        assert!(matches!(
            wallet.remove_signer(&a("alice"), &a("bob")),
            Err(MultisigError::MinimumParticipantsViolation { .. })
        ));

        wallet.add_signer(&a("alice"), a("dave")).unwrap();
        assert!(wallet.is_signer(&a("dave")));
        assert!(matches!(
            wallet.add_signer(&a("alice"), a("dave")),
            Err(MultisigError::DuplicateParticipant(_))
        ));
        assert!(matches!(
            wallet.add_signer(&a("alice"), Address::null()),
            Err(MultisigError::InvalidParticipant(_))
        ));

        assert!(matches!(
            wallet.remove_signer(&a("alice"), &a("mallory")),
            Err(MultisigError::InvalidParticipant(_))
        ));
        wallet.remove_signer(&a("dave"), &a("bob")).unwrap();
        assert_eq!(wallet.signer_count(), 3);
        assert!(!wallet.is_signer(&a("bob")));

        assert_eq!(
            log.events(),
            vec![
                Event::SignerAdded { signer: a("dave") },
                Event::SignerRemoved { signer: a("bob") },
            ]
        );
    }

    #[test]
    fn test_removed_signer_keeps_confirmation() {
        let (mut wallet, _) = create_test_wallet();
        let mut target = TestTarget::default();
        wallet.add_signer(&a("alice"), a("dave")).unwrap();
        wallet.submit(&a("alice"), a("dest"), 1, vec![]).unwrap();
        wallet.confirm(&a("dave"), 0).unwrap();
        wallet.remove_signer(&a("alice"), &a("dave")).unwrap();

        assert_eq!(wallet.confirmation_count(0).unwrap(), 1);
        assert_eq!(
            wallet.revoke(&a("dave"), 0),
            Err(MultisigError::Unauthorized(a("dave")))
        );

        wallet.confirm(&a("carol"), 0).unwrap();
        wallet.execute(&a("carol"), 0, &mut target).unwrap();
    }

    #[test]
    fn test_floor_follows_high_threshold() {
        let signers = vec![a("alice"), a("bob"), a("carol"), a("dave")];
        let mut wallet = MultisigWallet::new(WalletConfig::new(signers, 4, None)).unwrap();

        assert!(matches!(
            wallet.remove_signer(&a("alice"), &a("dave")),
            Err(MultisigError::MinimumParticipantsViolation { min: 4, have: 4 })
        ));
        wallet.add_signer(&a("alice"), a("erin")).unwrap();
        wallet.remove_signer(&a("alice"), &a("dave")).unwrap();
        assert_eq!(wallet.signer_count(), 4);
    }

    #[test]
    fn test_replace_signer() {
        let (mut wallet, log) = create_test_wallet();
        wallet
            .replace_signer(&a("alice"), &a("bob"), a("erin"))
            .unwrap();
        assert_eq!(wallet.signers(), vec![a("alice"), a("erin"), a("carol")]);
        assert_eq!(
            log.events(),
            vec![
                Event::SignerRemoved { signer: a("bob") },
                Event::SignerAdded { signer: a("erin") },
            ]
        );
    }

    #[test]
    fn test_transaction_queries() {
        let (mut wallet, _) = create_test_wallet();
        let mut target = TestTarget::default();
        for value in 0..3 {
            wallet.submit(&a("alice"), a("dest"), value, vec![]).unwrap();
        }
        wallet.confirm(&a("alice"), 1).unwrap();
        wallet.confirm(&a("bob"), 1).unwrap();
        wallet.execute(&a("alice"), 1, &mut target).unwrap();

        assert_eq!(wallet.transaction_count(TxFilter::ALL), 3);
        assert_eq!(wallet.transaction_count(TxFilter::PENDING), 2);
        assert_eq!(wallet.transaction_ids(0..3, TxFilter::EXECUTED), vec![1]);
        assert_eq!(wallet.transaction_ids(0..3, TxFilter::PENDING), vec![0, 2]);
        assert_eq!(wallet.confirmations(5).unwrap_err(), MultisigError::NotFound(5));
    }

    #[test]
    fn test_restore_from_state() {
        let (mut wallet, _) = create_test_wallet();
        wallet.submit(&a("alice"), a("dest"), 1, vec![]).unwrap();
        wallet.confirm(&a("bob"), 0).unwrap();

        let json = serde_json::to_string(wallet.state()).unwrap();
        let state: WalletState = serde_json::from_str(&json).unwrap();
        let mut restored = MultisigWallet::from_state(state).unwrap();

        assert_eq!(restored.confirmations(0).unwrap(), vec![a("bob")]);
        assert_eq!(restored.state().event_sequence, 2);
        restored.confirm(&a("carol"), 0).unwrap();
        assert_eq!(restored.state().event_sequence, 3);
    }

    #[test]
    fn test_restore_rejects_drifted_count() {
        let (mut wallet, _) = create_test_wallet();
        wallet.submit(&a("alice"), a("dest"), 1, vec![]).unwrap();
        wallet.confirm(&a("bob"), 0).unwrap();

        let mut state = wallet.state().clone();
        state.transactions.get_mut(0).unwrap().confirmation_count = 2;
        assert!(matches!(
            MultisigWallet::from_state(state),
            Err(MultisigError::InconsistentState(_))
        ));

        let mut state = wallet.state().clone();
        state.engine = ExecutionEngine::new(4);
        assert!(matches!(
            MultisigWallet::from_state(state),
            Err(MultisigError::InconsistentState(_))
        ));
    }
}
