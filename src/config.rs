//! Boot-time configuration: this node's id and its peers' addresses. Parsed
//! once in `main`, then wrapped in an `Arc` and never mutated again — no
//! component below the binary entry point reads the environment directly.

use std::net::SocketAddr;

use clap::Parser;

use crate::clock::NodeId;
use crate::error::ConfigError;

const DEFAULT_PEERS: [&str; 3] = [
    "http://node0:5000",
    "http://node1:5000",
    "http://node2:5000",
];

const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Command-line form of the node's configuration. CLI flags take
/// precedence; `NODE_ID`/`NODES`/`BIND_ADDR` environment variables are the
/// fallback, and a three-node loopback list is the last resort, convenient
/// for running a small cluster locally without any configuration at all.
#[derive(Debug, Parser)]
#[command(name = "vclock-kv")]
pub struct CliArgs {
    /// This node's index into `--peer` / `NODES`.
    #[arg(long)]
    pub node_id: Option<usize>,

    /// A peer's base URL, including this node's own entry at its own
    /// index. Repeat once per node in the cluster.
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Local socket address to listen on.
    #[arg(long)]
    pub bind: Option<String>,
}

/// Immutable, process-wide node identity and peer table.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub id: NodeId,
    pub peers: Vec<String>,
    pub bind: SocketAddr,
}

impl NodeConfig {
    pub fn cluster_size(&self) -> usize {
        self.peers.len()
    }

    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let node_id = match args.node_id {
            Some(id) => id,
            None => std::env::var("NODE_ID")
                .ok()
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(0),
        };

        let peers = if !args.peers.is_empty() {
            args.peers
        } else if let Ok(nodes_json) = std::env::var("NODES") {
            if nodes_json.trim().is_empty() {
                DEFAULT_PEERS.iter().map(|s| s.to_string()).collect()
            } else {
                serde_json::from_str(&nodes_json)?
            }
        } else {
            DEFAULT_PEERS.iter().map(|s| s.to_string()).collect()
        };

        if peers.is_empty() {
            return Err(ConfigError::EmptyPeerList);
        }
        if node_id >= peers.len() {
            return Err(ConfigError::NodeIdOutOfRange {
                node_id,
                peer_count: peers.len(),
            });
        }

        let bind_str = args
            .bind
            .or_else(|| std::env::var("BIND_ADDR").ok())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_str
            .parse()
            .unwrap_or_else(|_| DEFAULT_BIND.parse().expect("default bind addr is valid"));

        Ok(Self {
            id: node_id,
            peers,
            bind,
        })
    }
}
