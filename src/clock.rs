//! Vector clock algebra: the causal-time primitive everything else in this
//! crate is built on top of.
//!
//! A [`Stamp`] is a fixed-length snapshot of a [`VectorClock`]; it is the
//! wire representation exchanged between nodes. `VectorClock` is the mutable,
//! node-local counter vector that produces and consumes stamps.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a node within the cluster, in `[0, cluster_size)`.
pub type NodeId = usize;

/// An immutable snapshot of causal time: one counter per node, indexed by
/// [`NodeId`]. The canonical wire form is a plain JSON array of integers —
/// the mapping-keyed-by-node-id form some causal stores use is not accepted
/// here, since it silently defaults missing entries to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Stamp(Vec<u64>);

impl Stamp {
    pub fn zero(cluster_size: usize) -> Self {
        Self(vec![0; cluster_size])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, node: NodeId) -> Option<u64> {
        self.0.get(node).copied()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }
}

impl From<Vec<u64>> for Stamp {
    fn from(v: Vec<u64>) -> Self {
        Self(v)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("stamp length {actual} does not match cluster size {expected}")]
    InvalidStamp { expected: usize, actual: usize },
}

/// Causal time owned by a single node. `self_id` is this node's own index;
/// every component but `self_id` advances only via [`VectorClock::merge`].
#[derive(Debug)]
pub struct VectorClock {
    self_id: NodeId,
    inner: Mutex<Vec<u64>>,
}

impl VectorClock {
    pub fn new(self_id: NodeId, cluster_size: usize) -> Self {
        Self {
            self_id,
            inner: Mutex::new(vec![0; cluster_size]),
        }
    }

    pub fn cluster_size(&self) -> usize {
        // never mutated after construction, safe to read without the lock
        self.inner.lock().unwrap().len()
    }

    /// Atomically bumps this node's own component and returns the resulting
    /// full vector. Local writes never fail for causal reasons.
    pub fn increment(&self) -> Stamp {
        let mut guard = self.inner.lock().unwrap();
        guard[self.self_id] += 1;
        Stamp(guard.clone())
    }

    /// Componentwise maximum of `self` and `other`, written back into `self`.
    pub fn merge(&self, other: &Stamp) -> Result<(), ClockError> {
        let mut guard = self.inner.lock().unwrap();
        if other.len() != guard.len() {
            return Err(ClockError::InvalidStamp {
                expected: guard.len(),
                actual: other.len(),
            });
        }
        for (local, incoming) in guard.iter_mut().zip(other.as_slice()) {
            *local = (*local).max(*incoming);
        }
        Ok(())
    }

    /// A consistent snapshot of the current vector.
    pub fn snapshot(&self) -> Stamp {
        Stamp(self.inner.lock().unwrap().clone())
    }

    /// The causal-readiness predicate: is `other` (claimed to originate at
    /// `sender`) safe to apply right now against this clock?
    ///
    /// `other[sender]` must be exactly one past what we've seen from
    /// `sender` (strict successor — no gaps, no duplicates), and every other
    /// component of `other` must already be covered by our clock. Both
    /// checks run against the same locked snapshot so a concurrent
    /// `increment`/`merge` can't be observed half-applied.
    pub fn ready_for(&self, other: &Stamp, sender: NodeId) -> bool {
        let guard = self.inner.lock().unwrap();
        if other.len() != guard.len() || sender >= guard.len() {
            return false;
        }
        for (j, &local_j) in guard.iter().enumerate() {
            let other_j = other.as_slice()[j];
            if j == sender {
                if other_j != local_j + 1 {
                    return false;
                }
            } else if other_j > local_j {
                return false;
            }
        }
        true
    }

    /// `true` when `other`'s sender-component has already been observed —
    /// an idempotent retry rather than a genuine gap.
    pub fn is_duplicate(&self, other: &Stamp, sender: NodeId) -> bool {
        let guard = self.inner.lock().unwrap();
        sender < guard.len() && other.len() == guard.len() && other.as_slice()[sender] <= guard[sender]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(v: &[u64]) -> Stamp {
        Stamp(v.to_vec())
    }

    #[test]
    fn increment_bumps_only_own_component() {
        let vc = VectorClock::new(1, 3);
        assert_eq!(vc.increment(), stamp(&[0, 1, 0]));
        assert_eq!(vc.increment(), stamp(&[0, 2, 0]));
    }

    #[test]
    fn merge_is_componentwise_max() {
        let vc = VectorClock::new(0, 3);
        vc.increment(); // [1,0,0]
        vc.merge(&stamp(&[0, 2, 5])).unwrap();
        assert_eq!(vc.snapshot(), stamp(&[1, 2, 5]));
    }

    #[test]
    fn merge_rejects_wrong_length() {
        let vc = VectorClock::new(0, 3);
        let err = vc.merge(&stamp(&[0, 0])).unwrap_err();
        assert_eq!(
            err,
            ClockError::InvalidStamp {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let vc = VectorClock::new(0, 3);
        vc.merge(&stamp(&[3, 1, 2])).unwrap();
        let once = vc.snapshot();
        vc.merge(&stamp(&[3, 1, 2])).unwrap();
        assert_eq!(vc.snapshot(), once);
    }

    #[test]
    fn ready_for_requires_strict_successor_from_sender() {
        let vc = VectorClock::new(2, 3); // self id is irrelevant to ready_for
        assert!(vc.ready_for(&stamp(&[0, 1, 0]), 1));
        assert!(!vc.ready_for(&stamp(&[0, 2, 0]), 1)); // gap
        assert!(!vc.ready_for(&stamp(&[0, 0, 0]), 1)); // duplicate / stale
    }

    #[test]
    fn ready_for_requires_dependencies_already_observed() {
        let vc = VectorClock::new(2, 3);
        vc.merge(&stamp(&[1, 0, 0])).unwrap();
        assert!(vc.ready_for(&stamp(&[1, 1, 0]), 1));
        assert!(!vc.ready_for(&stamp(&[2, 1, 0]), 1)); // dependency on node 0 not yet seen
    }

    #[test]
    fn ready_for_rejects_wrong_length_or_sender() {
        let vc = VectorClock::new(0, 3);
        assert!(!vc.ready_for(&stamp(&[0, 1]), 1));
        assert!(!vc.ready_for(&stamp(&[0, 1, 0]), 5));
    }

    #[test]
    fn is_duplicate_detects_already_observed_sender_component() {
        let vc = VectorClock::new(0, 3);
        vc.merge(&stamp(&[0, 1, 0])).unwrap();
        assert!(vc.is_duplicate(&stamp(&[0, 1, 0]), 1));
        assert!(!vc.is_duplicate(&stamp(&[0, 2, 0]), 1));
    }
}
