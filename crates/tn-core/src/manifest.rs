//! Testnet manifest model.
//!
//! All maps are ordered by key so that iterating a manifest, serializing it,
//! or wiring its topology never depends on hash order.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Role a node plays in the testnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Seed,
    Validator,
    Full,
    Light,
}

impl Mode {
    /// Lowercase tag, also used as the node name prefix (`validator01`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Seed => "seed",
            Mode::Validator => "validator",
            Mode::Full => "full",
            Mode::Light => "light",
        }
    }

    /// Conventional name of the `index`-th node (1-based) of this role.
    #[must_use]
    pub fn node_name(self, index: usize) -> String {
        debug_assert!(index > 0, "Node indices are 1-based");
        format!("{}{:02}", self.as_str(), index)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a late-starting node bootstraps its state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateSync {
    #[default]
    Disabled,
    P2p,
    Rpc,
}

impl StateSync {
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self != StateSync::Disabled
    }
}

/// Fault injected into a running node during a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perturbation {
    Disconnect,
    Pause,
    Kill,
    Restart,
}

/// Peer-stack selection for a batch.
///
/// `Mixed` generates every concrete mode; the others pin the batch to one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum P2PMode {
    New,
    Legacy,
    Hybrid,
    #[default]
    Mixed,
}

impl P2PMode {
    /// Concrete modes a manifest can be generated with.
    pub const CONCRETE: [P2PMode; 3] = [P2PMode::New, P2PMode::Legacy, P2PMode::Hybrid];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            P2PMode::New => "new",
            P2PMode::Legacy => "legacy",
            P2PMode::Hybrid => "hybrid",
            P2PMode::Mixed => "mixed",
        }
    }
}

impl fmt::Display for P2PMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for P2PMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(P2PMode::New),
            "legacy" => Ok(P2PMode::Legacy),
            "hybrid" => Ok(P2PMode::Hybrid),
            "mixed" => Ok(P2PMode::Mixed),
            other => Err(ConfigError::UnknownP2PMode(other.to_string())),
        }
    }
}

/// One node of a testnet.
///
/// Seed and persistent peer lists are filled in by the topology builder
/// once the whole node set is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestNode {
    pub mode: Mode,
    /// Height at which the node is started, 0 for genesis.
    pub start_at: u64,
    pub database: String,
    pub abci_protocol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub privval_protocol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub block_sync: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mempool: String,
    #[serde(default)]
    pub state_sync: StateSync,
    /// Unset means state is persisted at every height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_interval: Option<u64>,
    /// 0 disables snapshots.
    #[serde(default)]
    pub snapshot_interval: u64,
    /// 0 retains every block.
    #[serde(default)]
    pub retain_blocks: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub perturb: Vec<Perturbation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seeds: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub persistent_peers: Vec<String>,
    #[serde(default)]
    pub use_legacy_p2p: bool,
}

impl ManifestNode {
    /// Create a bare node with no protocol choices and no peers.
    #[must_use]
    pub fn new(mode: Mode, start_at: u64) -> Self {
        Self {
            mode,
            start_at,
            database: String::new(),
            abci_protocol: String::new(),
            privval_protocol: String::new(),
            block_sync: String::new(),
            mempool: String::new(),
            state_sync: StateSync::Disabled,
            persist_interval: None,
            snapshot_interval: 0,
            retain_blocks: 0,
            perturb: Vec::new(),
            seeds: Vec::new(),
            persistent_peers: Vec::new(),
            use_legacy_p2p: false,
        }
    }

    /// Whether the node keeps its whole block history.
    #[must_use]
    pub fn retains_all_blocks(&self) -> bool {
        self.retain_blocks == 0
    }
}

/// One fully specified test network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Label derived from the option combination, used for sorting.
    pub name: String,
    pub ipv6: bool,
    pub initial_height: u64,
    #[serde(default)]
    pub initial_state: BTreeMap<String, String>,
    /// Validators and their weights at genesis.
    #[serde(default)]
    pub validators: BTreeMap<String, u64>,
    /// Validator set changes keyed by activation height (as a string).
    #[serde(default)]
    pub validator_updates: BTreeMap<String, BTreeMap<String, u64>>,
    pub nodes: BTreeMap<String, ManifestNode>,
    pub key_type: String,
    pub evidence: u32,
    pub queue_type: String,
    pub tx_size: u64,
}

impl Manifest {
    /// Nodes of the given role, in name order.
    pub fn nodes_with_mode(&self, mode: Mode) -> impl Iterator<Item = (&String, &ManifestNode)> {
        self.nodes.iter().filter(move |(_, node)| node.mode == mode)
    }
}

/// Stable sort of a batch by manifest name.
pub fn sort_by_name(manifests: &mut [Manifest]) {
    manifests.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Split a batch into at most `groups` contiguous groups of equal size,
/// the last one possibly shorter. Zero groups yields nothing.
#[must_use]
pub fn split_groups(manifests: &[Manifest], groups: usize) -> Vec<Vec<Manifest>> {
    if manifests.is_empty() || groups == 0 {
        return Vec::new();
    }

    let group_size = manifests.len().div_ceil(groups);
    manifests
        .chunks(group_size)
        .map(<[Manifest]>::to_vec)
        .collect()
}
