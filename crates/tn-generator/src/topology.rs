//! Topology builder.
//!
//! Seeds are fully meshed with each other. Every other node either bootstraps
//! from a random set of seeds or persistently dials a random set of peers
//! that come strictly earlier in (start height, name) order. Edges only ever
//! point at nodes that start no later, so the peer graph is acyclic and no
//! node waits on a peer that is waiting on it.

use tn_core::{Manifest, ManifestNode, Mode};
use tn_dst::DeterministicRng;
use tracing::debug;

use crate::distribution::{Choice, UniformSetChoice};
use crate::node::NodeFactory;

/// Wires seed and peer lists across an already generated node set.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    seeds: Vec<String>,
    peers: Vec<String>,
    light_providers: Vec<String>,
}

impl TopologyBuilder {
    /// Partition the manifest's nodes into seeds, peers (in startup order)
    /// and ideal light-client providers.
    #[must_use]
    pub fn new(manifest: &Manifest) -> Self {
        let mut builder = Self::default();
        for (name, node) in &manifest.nodes {
            match node.mode {
                Mode::Seed => builder.seeds.push(name.clone()),
                Mode::Light => {}
                Mode::Validator | Mode::Full => {
                    if is_ideal_provider(node, manifest.initial_height) {
                        builder.light_providers.push(name.clone());
                    }
                    builder.peers.push(name.clone());
                }
            }
        }

        builder.peers.sort_by(|a, b| {
            let start = |name: &String| manifest.nodes.get(name).map_or(0, |n| n.start_at);
            start(a).cmp(&start(b)).then_with(|| a.cmp(b))
        });
        builder
    }

    /// Seed names in name order.
    #[must_use]
    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    /// Non-seed, non-light names in startup order.
    #[must_use]
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// Full-history nodes available from the initial height, in name order.
    #[must_use]
    pub fn light_providers(&self) -> &[String] {
        &self.light_providers
    }

    /// Fill in seed and persistent peer lists.
    pub fn wire(&self, rng: &mut DeterministicRng, manifest: &mut Manifest) {
        for name in &self.seeds {
            if let Some(node) = manifest.nodes.get_mut(name) {
                node.seeds = self.seeds.iter().filter(|other| *other != name).cloned().collect();
            }
        }

        for (i, name) in self.peers.iter().enumerate() {
            let Some(node) = manifest.nodes.get_mut(name) else {
                continue;
            };
            if !self.seeds.is_empty() && (i == 0 || rng.gen_bool(0.5)) {
                node.seeds = UniformSetChoice::new(&self.seeds).choose(rng);
            } else if i > 0 {
                node.persistent_peers = UniformSetChoice::new(&self.peers[..i]).choose(rng);
            }
            debug!(
                node = %name,
                seeds = node.seeds.len(),
                persistent_peers = node.persistent_peers.len(),
                "wired peer"
            );
        }
    }

    /// Append `count` light clients, the i-th starting at
    /// `first_start + 5 * (i - 1)` and backed by every ideal provider.
    pub fn attach_light_clients(
        &self,
        rng: &mut DeterministicRng,
        factory: &NodeFactory<'_>,
        manifest: &mut Manifest,
        count: usize,
        first_start: u64,
    ) {
        debug_assert!(
            self.light_providers.iter().all(|p| manifest
                .nodes
                .get(p)
                .is_some_and(|n| n.start_at < first_start)),
            "Light clients must start after their providers"
        );

        let mut start_at = first_start;
        for i in 1..=count {
            let node = factory.generate_light_node(rng, start_at, &self.light_providers);
            manifest.nodes.insert(Mode::Light.node_name(i), node);
            start_at += 5;
        }
    }
}

/// Whether `node` can serve light clients: it starts with the chain and
/// keeps every block.
#[must_use]
pub fn is_ideal_provider(node: &ManifestNode, initial_height: u64) -> bool {
    (node.start_at == 0 || node.start_at == initial_height) && node.retains_all_blocks()
}
