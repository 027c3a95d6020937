//! The dispatcher: the single point of mutual exclusion over the `Store`,
//! and the seam where outbound replication is kicked off outside that
//! exclusion. Everything the transport layer calls goes through here.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::clock::{NodeId, Stamp};
use crate::config::NodeConfig;
use crate::error::MalformedMessage;
use crate::replicator::Replicator;
use crate::store::{ApplyOutcome, Entry, Store, StoreSnapshot};

/// A node's full runtime state: configuration, the exclusively-owned
/// `Store`, and the replicator used to fan writes out to peers.
pub struct Node {
    config: Arc<NodeConfig>,
    store: Mutex<Store>,
    replicator: Replicator,
}

impl Node {
    pub fn new(config: Arc<NodeConfig>) -> Self {
        let store = Store::new(config.id, config.cluster_size());
        let replicator = Replicator::spawn(&config);
        info!(
            node_id = config.id,
            cluster_size = config.cluster_size(),
            "node constructed"
        );
        Self {
            config,
            store: Mutex::new(store),
            replicator,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Applies a local write, then replicates it to every peer. The
    /// replication fan-out happens after the store lock is released, so a
    /// slow or unreachable peer never blocks subsequent local operations.
    pub async fn local_write(&self, key: String, value: String) -> Stamp {
        let stamp = {
            let mut store = self.store.lock().await;
            store.local_write(key.clone(), value.clone())
        };
        info!(%key, clock = ?stamp, "local write applied");
        self.replicator.replicate(&key, &value, &stamp);
        stamp
    }

    /// Applies, buffers, or rejects an inbound replication. Identical to
    /// `Store::apply_replication`, just behind the node's exclusion.
    pub async fn apply_replication(
        &self,
        key: String,
        value: String,
        stamp: Stamp,
        sender: NodeId,
    ) -> Result<ApplyOutcome, MalformedMessage> {
        let mut store = self.store.lock().await;
        store.apply_replication(key, value, stamp, sender)
    }

    pub async fn read(&self, key: &str) -> Option<Entry> {
        let store = self.store.lock().await;
        store.read(key).cloned()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let store = self.store.lock().await;
        store.snapshot()
    }
}
