//! The crate-wide error taxonomy. Core operations never throw through to
//! the transport layer — they return a status variant
//! ([`crate::store::ApplyOutcome`]) — these types cover the genuinely
//! exceptional cases: malformed requests and boot-time misconfiguration.

use thiserror::Error;

use crate::clock::NodeId;

/// Rejected before the causal-readiness machinery even runs: the request
/// itself doesn't describe a valid replication.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedMessage {
    #[error("stamp length {actual} does not match cluster size {expected}")]
    BadStampLength { expected: usize, actual: usize },
    #[error("sender {sender} is out of range for cluster size {cluster_size}")]
    SenderOutOfRange { sender: NodeId, cluster_size: usize },
    #[error("sender {0} names this node itself")]
    SenderIsSelf(NodeId),
}

/// Fatal at boot: the process exits before any listener is bound.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("NODE_ID {node_id} is out of range for {peer_count} configured peers")]
    NodeIdOutOfRange { node_id: usize, peer_count: usize },
    #[error("peer list is empty")]
    EmptyPeerList,
    #[error("NODES must be a JSON array of peer URLs: {0}")]
    InvalidNodesJson(#[from] serde_json::Error),
    #[error("invalid NODE_ID: {0}")]
    InvalidNodeId(#[from] std::num::ParseIntError),
}
