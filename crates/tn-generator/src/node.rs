//! Node factory.
//!
//! Draws one node's storage, protocol, retention and fault settings, then
//! repairs combinations that could not boot. Peer lists are left empty; the
//! topology builder fills them once the whole node set exists.

use tn_core::{ManifestNode, Mode, StateSync};
use tn_dst::DeterministicRng;

use crate::config::Distributions;
use crate::distribution::Choice;

/// Snapshot interval forced onto archive nodes.
pub const ARCHIVE_SNAPSHOT_INTERVAL: u64 = 3;

/// Block sync version that can catch up after a state sync.
pub const STATE_SYNC_BLOCK_SYNC: &str = "v0";

/// ABCI transport used by light clients.
pub const LIGHT_ABCI_PROTOCOL: &str = "builtin";

/// Builds nodes from a set of value tables.
#[derive(Debug, Clone, Copy)]
pub struct NodeFactory<'a> {
    distributions: &'a Distributions,
}

impl<'a> NodeFactory<'a> {
    #[must_use]
    pub fn new(distributions: &'a Distributions) -> Self {
        Self { distributions }
    }

    /// Generate a seed, validator or full node.
    ///
    /// # Arguments
    /// - `start_at`: start height, 0 for genesis
    /// - `initial_height`: first height of the chain
    /// - `force_archive`: retain every block and snapshot every 3 heights
    pub fn generate_node(
        &self,
        rng: &mut DeterministicRng,
        mode: Mode,
        start_at: u64,
        initial_height: u64,
        force_archive: bool,
    ) -> ManifestNode {
        debug_assert!(mode != Mode::Light, "Light clients use generate_light_node");
        debug_assert!(
            start_at == 0 || start_at > initial_height,
            "Delayed nodes start after the initial height"
        );

        let d = self.distributions;
        let mut node = ManifestNode {
            database: d.databases.choose(rng),
            abci_protocol: d.abci_protocols.choose(rng),
            privval_protocol: d.privval_protocols.choose(rng),
            block_sync: d.block_syncs.choose(rng),
            mempool: d.mempools.choose(rng),
            persist_interval: Some(d.persist_intervals.choose(rng)),
            snapshot_interval: d.snapshot_intervals.choose(rng),
            retain_blocks: d.retain_blocks.choose(rng),
            perturb: d.perturbations.choose(rng),
            ..ManifestNode::new(mode, start_at)
        };

        // A genesis node has no chain to sync against.
        if start_at > 0 {
            node.state_sync = d.state_syncs.choose(rng);
        }

        if force_archive {
            node.retain_blocks = 0;
            node.snapshot_interval = ARCHIVE_SNAPSHOT_INTERVAL;
        }

        repair(rng, &mut node);
        node
    }

    /// Generate a light client backed by `providers`.
    pub fn generate_light_node(
        &self,
        rng: &mut DeterministicRng,
        start_at: u64,
        providers: &[String],
    ) -> ManifestNode {
        ManifestNode {
            database: self.distributions.databases.choose(rng),
            abci_protocol: LIGHT_ABCI_PROTOCOL.to_string(),
            persist_interval: Some(0),
            persistent_peers: providers.to_vec(),
            ..ManifestNode::new(Mode::Light, start_at)
        }
    }
}

/// Fix settings that contradict each other. Rules run in order; each may
/// change the inputs of the next.
fn repair(rng: &mut DeterministicRng, node: &mut ManifestNode) {
    // A node that never persists state cannot also prune blocks it may have
    // to replay, so either keep every block or persist as often as it prunes.
    if node.persist_interval == Some(0) && node.retain_blocks > 0 {
        if rng.gen_bool(0.5) {
            node.retain_blocks = 0;
        } else {
            node.persist_interval = Some(node.retain_blocks);
        }
    }

    // Retention only ever widens.
    if node.retain_blocks > 0 {
        if let Some(persist) = node.persist_interval {
            node.retain_blocks = node.retain_blocks.max(persist);
        }
        node.retain_blocks = node.retain_blocks.max(node.snapshot_interval);
    }

    if node.state_sync != StateSync::Disabled {
        node.block_sync = STATE_SYNC_BLOCK_SYNC.to_string();
    }
}
