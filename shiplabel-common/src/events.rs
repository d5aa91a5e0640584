//! Label event types and the broadcast bus
//!
//! Events are the user-facing signal channel: success and error
//! notifications, and the loading indicator around PDF decoding. They are
//! broadcast via [`EventBus`] and serialized for SSE transmission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Label event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum LabelEvent {
    /// An import batch was submitted
    ImportStarted {
        /// Source kind (`pdf`, `spreadsheet`, `text`)
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// Document decoding began (drives the loading indicator)
    DecodeStarted {
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// Document decoding ended, successfully or not
    DecodeFinished {
        source: String,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Batch persisted
    ImportSucceeded {
        source: String,
        /// Number of records inserted
        inserted: usize,
        timestamp: DateTime<Utc>,
    },

    /// Batch rejected or failed; nothing was written
    ImportFailed {
        source: String,
        /// Error kind code (`decode`, `extraction`, `duplicate`, `store`, `cancelled`)
        kind: String,
        /// User-facing message
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// The in-memory record snapshot was re-read from the store
    RecordsRefreshed {
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// Maintenance reconciliation removed older duplicates
    DuplicatesRemoved {
        removed: usize,
        remaining: usize,
        timestamp: DateTime<Utc>,
    },
}

impl LabelEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            LabelEvent::ImportStarted { .. } => "ImportStarted",
            LabelEvent::DecodeStarted { .. } => "DecodeStarted",
            LabelEvent::DecodeFinished { .. } => "DecodeFinished",
            LabelEvent::ImportSucceeded { .. } => "ImportSucceeded",
            LabelEvent::ImportFailed { .. } => "ImportFailed",
            LabelEvent::RecordsRefreshed { .. } => "RecordsRefreshed",
            LabelEvent::DuplicatesRemoved { .. } => "DuplicatesRemoved",
        }
    }
}

/// Broadcast bus for [`LabelEvent`]s
///
/// Backed by `tokio::sync::broadcast`: publishing never blocks, slow
/// subscribers observe `Lagged` instead of stalling producers.
///
/// ```
/// use shiplabel_common::events::{EventBus, LabelEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
/// bus.emit_lossy(LabelEvent::RecordsRefreshed { total: 3, timestamp: chrono::Utc::now() });
/// assert_eq!(rx.try_recv().unwrap().event_type(), "RecordsRefreshed");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LabelEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LabelEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, returning the number of subscribers reached
    ///
    /// Fails when nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: LabelEvent,
    ) -> Result<usize, broadcast::error::SendError<LabelEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LabelEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
