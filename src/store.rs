//! The Store: the KV map, the pending buffer, and (by containment) the
//! vector clock. This is the component with the actual hard logic — the
//! buffering/release cascade — everything above it (the dispatcher, the
//! transport) is orchestration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{ClockError, NodeId, Stamp, VectorClock};
use crate::error::MalformedMessage;

/// A stored value together with the stamp it was applied under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub value: String,
    pub stamp: Stamp,
}

/// A replication that arrived before its causal prerequisites were met.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    key: String,
    value: String,
    stamp: Stamp,
    sender: NodeId,
}

/// The result of attempting to apply an inbound replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Written into the KV map and merged into the local clock immediately.
    Applied,
    /// Not yet causally ready; appended to the pending buffer.
    Buffered,
    /// Already observed from this sender; ignored without buffering.
    Duplicate,
}

pub struct Store {
    self_id: NodeId,
    clock: VectorClock,
    kv: HashMap<String, Entry>,
    pending: Vec<Pending>,
}

/// A read-only view of a node's internal state, for the `debug/status`
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub kv: HashMap<String, Entry>,
    pub clock: Stamp,
    pub pending: usize,
}

impl Store {
    pub fn new(self_id: NodeId, cluster_size: usize) -> Self {
        Self {
            self_id,
            clock: VectorClock::new(self_id, cluster_size),
            kv: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn cluster_size(&self) -> usize {
        self.clock.cluster_size()
    }

    /// Increments the local clock and writes `value` under `key`. Local
    /// writes never fail for causal reasons; the caller hands the returned
    /// stamp to the replicator.
    pub fn local_write(&mut self, key: String, value: String) -> Stamp {
        let stamp = self.clock.increment();
        self.kv.insert(
            key,
            Entry {
                value,
                stamp: stamp.clone(),
            },
        );
        stamp
    }

    /// Validates an inbound replication's envelope before the causal
    /// machinery sees it: wrong stamp length, an out-of-range sender, or a
    /// sender claiming to be this node are all rejected outright.
    fn validate(&self, stamp: &Stamp, sender: NodeId) -> Result<(), MalformedMessage> {
        let cluster_size = self.cluster_size();
        if stamp.len() != cluster_size {
            return Err(MalformedMessage::BadStampLength {
                expected: cluster_size,
                actual: stamp.len(),
            });
        }
        if sender >= cluster_size {
            return Err(MalformedMessage::SenderOutOfRange {
                sender,
                cluster_size,
            });
        }
        if sender == self.self_id {
            return Err(MalformedMessage::SenderIsSelf(sender));
        }
        Ok(())
    }

    /// Applies an inbound replication, or buffers it if its causal
    /// prerequisites aren't satisfied yet. Every successful apply triggers
    /// a drain pass, so nothing can be stranded in the buffer once its
    /// prerequisites are in fact met.
    pub fn apply_replication(
        &mut self,
        key: String,
        value: String,
        stamp: Stamp,
        sender: NodeId,
    ) -> Result<ApplyOutcome, MalformedMessage> {
        self.validate(&stamp, sender)?;

        if self.clock.is_duplicate(&stamp, sender) {
            return Ok(ApplyOutcome::Duplicate);
        }

        if self.clock.ready_for(&stamp, sender) {
            self.apply(key, value, stamp);
            self.drain();
            Ok(ApplyOutcome::Applied)
        } else {
            self.pending.push(Pending {
                key,
                value,
                stamp,
                sender,
            });
            Ok(ApplyOutcome::Buffered)
        }
    }

    /// Writes the entry and merges its stamp into the local clock. Callers
    /// must already know `stamp` is ready (or trust that it was produced
    /// locally, for `local_write`'s sibling path).
    fn apply(&mut self, key: String, value: String, stamp: Stamp) {
        // merge cannot fail here: `stamp`'s length was validated in `validate`
        // and never changes afterward.
        debug_assert_eq!(stamp.len(), self.cluster_size());
        let _: Result<(), ClockError> = self.clock.merge(&stamp);
        self.kv.insert(key, Entry { value, stamp });
    }

    /// Repeatedly scans the pending buffer for now-ready entries until a
    /// full pass applies nothing. Each pass removes every entry it applies
    /// while preserving the relative order of survivors, so a later pass
    /// still sees buffered entries in their original arrival order.
    pub fn drain(&mut self) {
        loop {
            let mut applied_any = false;
            let before = self.pending.len();
            let mut remaining = Vec::with_capacity(self.pending.len());
            for entry in std::mem::take(&mut self.pending) {
                if self.clock.ready_for(&entry.stamp, entry.sender) {
                    applied_any = true;
                    self.apply(entry.key, entry.value, entry.stamp);
                } else {
                    remaining.push(entry);
                }
            }
            self.pending = remaining;
            debug!(
                node_id = self.self_id,
                before,
                after = self.pending.len(),
                "drain pass"
            );
            if !applied_any {
                break;
            }
        }
    }

    pub fn read(&self, key: &str) -> Option<&Entry> {
        self.kv.get(key)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            kv: self.kv.clone(),
            clock: self.clock.snapshot(),
            pending: self.pending.len(),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
