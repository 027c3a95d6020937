//! Fan-out of locally applied writes to every peer. Each peer gets its own
//! outbound queue drained by a single task, so delivery to that peer is
//! strictly FIFO — required for the receiving node's strict-successor check
//! on the sender's clock component to ever succeed. Peers are otherwise
//! fanned out to in parallel; reordering across peers is harmless.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::warn;

use crate::clock::{NodeId, Stamp};
use crate::config::NodeConfig;

const REPLICATE_TIMEOUT: Duration = Duration::from_millis(1000);
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Serialize)]
struct ReplicateRequest {
    key: String,
    value: String,
    clock: Stamp,
    sender: NodeId,
}

struct Job {
    key: String,
    value: String,
    stamp: Stamp,
}

/// Owns one outbound queue per peer. Dropping the `Replicator` drops every
/// sender half, which lets the per-peer tasks drain their channel and exit.
pub struct Replicator {
    self_id: NodeId,
    queues: Vec<Option<UnboundedSender<Job>>>,
}

impl Replicator {
    pub fn spawn(config: &NodeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REPLICATE_TIMEOUT)
            .build()
            .expect("reqwest client builds with static config");

        let queues = config
            .peers
            .iter()
            .enumerate()
            .map(|(peer_id, peer_addr)| {
                if peer_id == config.id {
                    return None;
                }
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(peer_worker(
                    client.clone(),
                    peer_addr.clone(),
                    config.id,
                    rx,
                ));
                Some(tx)
            })
            .collect();

        Self {
            self_id: config.id,
            queues,
        }
    }

    /// Enqueues `(key, value, stamp)` for delivery to every peer but self.
    /// Enqueuing is non-blocking; the actual HTTP delivery happens on the
    /// per-peer worker tasks, outside of whatever lock the caller is
    /// holding on the `Store`.
    pub fn replicate(&self, key: &str, value: &str, stamp: &Stamp) {
        for (peer_id, queue) in self.queues.iter().enumerate() {
            if peer_id == self.self_id {
                continue;
            }
            let Some(queue) = queue else { continue };
            let job = Job {
                key: key.to_string(),
                value: value.to_string(),
                stamp: stamp.clone(),
            };
            // an unbounded channel send only fails if the worker task has
            // already exited, which only happens when the whole `Replicator`
            // (and thus the node) is being torn down.
            let _ = queue.send(job);
        }
    }
}

async fn peer_worker(
    client: reqwest::Client,
    peer_addr: String,
    self_id: NodeId,
    mut jobs: mpsc::UnboundedReceiver<Job>,
) {
    let url = format!("{}/replicate", peer_addr.trim_end_matches('/'));
    while let Some(job) = jobs.recv().await {
        let body = ReplicateRequest {
            key: job.key,
            value: job.value,
            clock: job.stamp,
            sender: self_id,
        };
        let mut attempt = 0;
        loop {
            attempt += 1;
            match client.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => break,
                Ok(resp) => {
                    warn!(peer = %peer_addr, status = %resp.status(), "replication rejected by peer");
                    break;
                }
                Err(err) if attempt < MAX_ATTEMPTS => {
                    warn!(peer = %peer_addr, attempt, error = %err, "replication attempt failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(err) => {
                    warn!(peer = %peer_addr, attempt, error = %err, "replication failed, giving up for this message");
                    break;
                }
            }
        }
    }
}
