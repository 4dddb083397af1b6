//! Core types shared by every wallet component
//!
//! - Participant identities
//! - The error taxonomy
//! - Notification events and sinks

pub mod address;
pub mod error;
pub mod event;

pub use address::{Address, NULL_ADDRESS};
pub use error::{MultisigError, Result};
pub use event::{Event, EventBroadcaster, EventLog, EventRecord, NotificationSink};
