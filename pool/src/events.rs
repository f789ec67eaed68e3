//! Events for external indexers. Nothing inside the pool reads them back.

use alloy_primitives::{Address, B256, U256};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    Deposit {
        depositor: Address,
        commitment: B256,
        amount: U256,
    },
    Withdrawal {
        caller: Address,
        recipient: Address,
        value: U256,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PoolEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: &PoolEvent) {
        (**self).emit(event)
    }
}

/// Writes each event to the `shielded_pool::events` tracing target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &PoolEvent) {
        match event {
            PoolEvent::Deposit {
                depositor,
                commitment,
                amount,
            } => info!(target: "shielded_pool::events", %depositor, %commitment, %amount, "Deposit"),
            PoolEvent::Withdrawal {
                caller,
                recipient,
                value,
            } => info!(target: "shielded_pool::events", %caller, %recipient, %value, "Withdrawal"),
        }
    }
}

/// Append-only in-memory log.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<PoolEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemoryEventLog {
    fn emit(&self, event: &PoolEvent) {
        self.events.lock().push(event.clone());
    }
}
