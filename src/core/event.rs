//! Wallet notifications
//!
//! Every committed state transition produces one [`EventRecord`], numbered
//! with a per-wallet sequence so consumers can treat the stream as an
//! append-only audit log.

use crate::core::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Maximum number of events to buffer per broadcast subscriber
const BROADCAST_CAPACITY: usize = 256;

/// A state transition on a wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A new transaction was appended to the ledger
    Submitted {
        caller: Address,
        index: u64,
        destination: Address,
        value: u128,
        #[serde(with = "hex")]
        payload: Vec<u8>,
    },
    /// A signer approved a transaction
    Confirmed { caller: Address, index: u64 },
    /// A signer withdrew an approval
    Revoked { caller: Address, index: u64 },
    /// A transaction was executed against the target
    Executed { caller: Address, index: u64 },
    /// A signer joined the registry
    SignerAdded { signer: Address },
    /// A signer left the registry
    SignerRemoved { signer: Address },
}

impl Event {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Submitted { .. } => "submitted",
            Event::Confirmed { .. } => "confirmed",
            Event::Revoked { .. } => "revoked",
            Event::Executed { .. } => "executed",
            Event::SignerAdded { .. } => "signer_added",
            Event::SignerRemoved { .. } => "signer_removed",
        }
    }
}

/// An event stamped with its position in the wallet's history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

/// Receives events after each committed transition
///
/// Sinks are called while the wallet is being mutated and must not call
/// back into it.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, record: &EventRecord);
}

/// In-memory append-only event recorder
#[derive(Debug, Default)]
pub struct EventLog {
    records: Mutex<Vec<EventRecord>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously persisted records
    pub fn with_records(records: Vec<EventRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Copy of every record seen so far, in order
    pub fn records(&self) -> Vec<EventRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Just the events, in order
    pub fn events(&self) -> Vec<Event> {
        self.records().into_iter().map(|r| r.event).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for EventLog {
    fn notify(&self, record: &EventRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

/// Fans events out to any number of async subscribers
#[derive(Debug)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<EventRecord>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for EventBroadcaster {
    fn notify(&self, record: &EventRecord) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(record.clone());
    }
}
