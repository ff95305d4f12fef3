//! Manifest invariants.
//!
//! | Property | Description |
//! |----------|-------------|
//! | QuorumAtGenesis | floor(2n/3)+1 validators start at genesis |
//! | DelayedValidatorSpacing | Late validators start at initial+5, +10, ... |
//! | ValidatorSetCoverage | Every validator is in the genesis set or its activation update |
//! | ArchiveValidators | The first two validators retain all blocks and snapshot every 3 |
//! | RetentionCoversIntervals | Pruning never outruns persistence or snapshots |
//! | StateSyncUsesBlockSyncV0 | State-synced nodes use block sync v0; genesis nodes never state sync |
//! | AcyclicPeerGraph | Persistent peers start strictly earlier in (height, name) order |
//! | SeedMesh | Every seed lists every other seed |
//! | RoleNaming | Node names are `<role><NN>` |
//! | LightProviders | Light clients only use full-history providers that start before them |

use std::collections::BTreeMap;

use crate::manifest::{Manifest, ManifestNode, Mode};
use crate::property::{PropertyChecker, PropertyResult};

/// Distance between consecutive delayed start heights.
const START_HEIGHT_STEP: u64 = 5;

/// Snapshot interval forced onto archive validators.
const ARCHIVE_SNAPSHOT_INTERVAL: u64 = 3;

/// Number of leading validators forced into archive form.
const ARCHIVE_VALIDATORS_COUNT: usize = 2;

/// Property checker for generated manifests.
pub struct ManifestPropertyChecker<'a> {
    manifest: &'a Manifest,
    seed: Option<u64>,
}

impl<'a> ManifestPropertyChecker<'a> {
    /// Create a new checker for the given manifest.
    #[must_use]
    pub fn new(manifest: &'a Manifest) -> Self {
        Self {
            manifest,
            seed: None,
        }
    }

    /// Set the generation seed so failures can be reproduced.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn pass(&self, name: &'static str) -> PropertyResult {
        PropertyResult::pass(name).with_seed(self.seed)
    }

    fn fail(&self, name: &'static str, violation: String) -> PropertyResult {
        PropertyResult::fail(name, format!("{}: {}", self.manifest.name, violation))
            .with_seed(self.seed)
    }

    fn validators(&self) -> Vec<(&'a String, &'a ManifestNode)> {
        self.manifest.nodes_with_mode(Mode::Validator).collect()
    }

    fn check_quorum_at_genesis(&self) -> PropertyResult {
        const NAME: &str = "QuorumAtGenesis";
        let validators = self.validators();
        if validators.is_empty() {
            return self.pass(NAME);
        }

        let quorum = validators.len() * 2 / 3 + 1;
        let genesis = validators.iter().filter(|(_, v)| v.start_at == 0).count();
        if genesis == quorum {
            self.pass(NAME)
        } else {
            self.fail(
                NAME,
                format!(
                    "{} of {} validators start at genesis, quorum is {}",
                    genesis,
                    validators.len(),
                    quorum
                ),
            )
        }
    }

    fn check_delayed_validator_spacing(&self) -> PropertyResult {
        const NAME: &str = "DelayedValidatorSpacing";
        let delayed: Vec<(&String, u64)> = self
            .validators()
            .into_iter()
            .filter(|(_, v)| v.start_at > 0)
            .map(|(name, v)| (name, v.start_at))
            .collect();

        let mut expected = self.manifest.initial_height + START_HEIGHT_STEP;
        for (name, start_at) in delayed {
            if start_at != expected {
                return self.fail(
                    NAME,
                    format!("{} starts at {}, expected {}", name, start_at, expected),
                );
            }
            expected += START_HEIGHT_STEP;
        }
        self.pass(NAME)
    }

    fn check_validator_set_coverage(&self) -> PropertyResult {
        const NAME: &str = "ValidatorSetCoverage";
        let manifest = self.manifest;
        let empty = BTreeMap::new();
        let init_chain = manifest.validator_updates.get("0").unwrap_or(&empty);

        for (name, node) in self.validators() {
            let weight = if node.start_at == 0 {
                manifest
                    .validators
                    .get(name)
                    .or_else(|| init_chain.get(name))
            } else {
                let activation = (node.start_at + START_HEIGHT_STEP).to_string();
                manifest
                    .validator_updates
                    .get(&activation)
                    .and_then(|update| update.get(name))
            };
            match weight {
                Some(&w) if w > 0 => {}
                Some(_) => return self.fail(NAME, format!("{} has zero weight", name)),
                None => {
                    return self.fail(
                        NAME,
                        format!("{} (start {}) missing from validator set", name, node.start_at),
                    )
                }
            }
        }

        let referenced = manifest
            .validators
            .keys()
            .chain(manifest.validator_updates.values().flat_map(BTreeMap::keys));
        for name in referenced {
            match manifest.nodes.get(name) {
                Some(node) if node.mode == Mode::Validator => {}
                _ => return self.fail(NAME, format!("{} is not a validator node", name)),
            }
        }
        self.pass(NAME)
    }

    fn check_archive_validators(&self) -> PropertyResult {
        const NAME: &str = "ArchiveValidators";
        for (name, node) in self.validators().into_iter().take(ARCHIVE_VALIDATORS_COUNT) {
            if node.retain_blocks != 0 || node.snapshot_interval != ARCHIVE_SNAPSHOT_INTERVAL {
                return self.fail(
                    NAME,
                    format!(
                        "{} retains {} blocks with snapshot interval {}",
                        name, node.retain_blocks, node.snapshot_interval
                    ),
                );
            }
        }
        self.pass(NAME)
    }

    fn check_retention_covers_intervals(&self) -> PropertyResult {
        const NAME: &str = "RetentionCoversIntervals";
        for (name, node) in &self.manifest.nodes {
            if node.retain_blocks == 0 {
                continue;
            }
            let persist = node.persist_interval.unwrap_or(0);
            if node.retain_blocks < persist || node.retain_blocks < node.snapshot_interval {
                return self.fail(
                    NAME,
                    format!(
                        "{} retains {} blocks, persist interval {}, snapshot interval {}",
                        name, node.retain_blocks, persist, node.snapshot_interval
                    ),
                );
            }
        }
        self.pass(NAME)
    }

    fn check_state_sync_block_sync(&self) -> PropertyResult {
        const NAME: &str = "StateSyncUsesBlockSyncV0";
        for (name, node) in &self.manifest.nodes {
            if !node.state_sync.is_enabled() {
                continue;
            }
            if node.start_at == 0 {
                return self.fail(NAME, format!("genesis node {} uses state sync", name));
            }
            if node.block_sync != "v0" {
                return self.fail(
                    NAME,
                    format!("{} state syncs with block sync {:?}", name, node.block_sync),
                );
            }
        }
        self.pass(NAME)
    }

    fn check_acyclic_peer_graph(&self) -> PropertyResult {
        const NAME: &str = "AcyclicPeerGraph";
        let nodes = &self.manifest.nodes;
        for (name, node) in nodes {
            for peer_name in &node.persistent_peers {
                let Some(peer) = nodes.get(peer_name) else {
                    return self.fail(NAME, format!("{} references unknown peer {}", name, peer_name));
                };
                if (peer.start_at, peer_name) >= (node.start_at, name) {
                    return self.fail(
                        NAME,
                        format!(
                            "{} (start {}) depends on {} (start {})",
                            name, node.start_at, peer_name, peer.start_at
                        ),
                    );
                }
            }
            for seed_name in &node.seeds {
                match nodes.get(seed_name) {
                    Some(seed) if seed.mode == Mode::Seed && seed_name != name => {}
                    _ => {
                        return self.fail(NAME, format!("{} lists {} as a seed", name, seed_name))
                    }
                }
            }
        }
        self.pass(NAME)
    }

    fn check_seed_mesh(&self) -> PropertyResult {
        const NAME: &str = "SeedMesh";
        let seeds: Vec<(&String, &ManifestNode)> =
            self.manifest.nodes_with_mode(Mode::Seed).collect();
        for (name, seed) in &seeds {
            for (other, _) in &seeds {
                if name != other && !seed.seeds.contains(*other) {
                    return self.fail(NAME, format!("{} does not list seed {}", name, other));
                }
            }
        }
        self.pass(NAME)
    }

    fn check_role_naming(&self) -> PropertyResult {
        const NAME: &str = "RoleNaming";
        for (name, node) in &self.manifest.nodes {
            let well_formed = name
                .strip_prefix(node.mode.as_str())
                .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()));
            if !well_formed {
                return self.fail(NAME, format!("{} is not named after role {}", name, node.mode));
            }
        }
        self.pass(NAME)
    }

    fn check_light_providers(&self) -> PropertyResult {
        const NAME: &str = "LightProviders";
        let manifest = self.manifest;
        let last_activation = self
            .validators()
            .iter()
            .filter(|(_, v)| v.start_at > 0)
            .map(|(_, v)| v.start_at + START_HEIGHT_STEP)
            .max()
            .unwrap_or(0);

        for (name, light) in manifest.nodes_with_mode(Mode::Light) {
            if light.start_at <= last_activation {
                return self.fail(
                    NAME,
                    format!(
                        "{} starts at {}, not after validator activation {}",
                        name, light.start_at, last_activation
                    ),
                );
            }
            for provider_name in &light.persistent_peers {
                let Some(provider) = manifest.nodes.get(provider_name) else {
                    return self.fail(NAME, format!("{} uses unknown provider {}", name, provider_name));
                };
                let ideal = matches!(provider.mode, Mode::Validator | Mode::Full)
                    && (provider.start_at == 0 || provider.start_at == manifest.initial_height)
                    && provider.retains_all_blocks()
                    && provider.start_at < light.start_at;
                if !ideal {
                    return self.fail(
                        NAME,
                        format!("{} uses unsuitable provider {}", name, provider_name),
                    );
                }
            }
        }
        self.pass(NAME)
    }
}

impl PropertyChecker for ManifestPropertyChecker<'_> {
    fn check_all(&self) -> Vec<PropertyResult> {
        vec![
            self.check_quorum_at_genesis(),
            self.check_delayed_validator_spacing(),
            self.check_validator_set_coverage(),
            self.check_archive_validators(),
            self.check_retention_covers_intervals(),
            self.check_state_sync_block_sync(),
            self.check_acyclic_peer_graph(),
            self.check_seed_mesh(),
            self.check_role_naming(),
            self.check_light_providers(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(mode: Mode, start_at: u64) -> ManifestNode {
        let mut node = ManifestNode::new(mode, start_at);
        node.block_sync = "v0".to_string();
        node.snapshot_interval = ARCHIVE_SNAPSHOT_INTERVAL;
        node.persist_interval = Some(1);
        node
    }

    /// Four validators (one delayed), two meshed seeds, one light client.
    fn valid_manifest() -> Manifest {
        let mut nodes = BTreeMap::new();
        let mut seed01 = archive(Mode::Seed, 0);
        seed01.seeds = vec!["seed02".to_string()];
        let mut seed02 = archive(Mode::Seed, 0);
        seed02.seeds = vec!["seed01".to_string()];
        nodes.insert("seed01".to_string(), seed01);
        nodes.insert("seed02".to_string(), seed02);

        let mut validator01 = archive(Mode::Validator, 0);
        validator01.seeds = vec!["seed01".to_string()];
        let mut validator02 = archive(Mode::Validator, 0);
        validator02.persistent_peers = vec!["validator01".to_string()];
        let mut validator03 = archive(Mode::Validator, 0);
        validator03.retain_blocks = 14;
        validator03.seeds = vec!["seed02".to_string(), "seed01".to_string()];
        let mut validator04 = archive(Mode::Validator, 5);
        validator04.state_sync = crate::manifest::StateSync::P2p;
        validator04.persistent_peers = vec!["validator02".to_string(), "validator03".to_string()];
        nodes.insert("validator01".to_string(), validator01);
        nodes.insert("validator02".to_string(), validator02);
        nodes.insert("validator03".to_string(), validator03);
        nodes.insert("validator04".to_string(), validator04);

        let mut light01 = ManifestNode::new(Mode::Light, 15);
        light01.persist_interval = Some(0);
        light01.persistent_peers = vec!["validator01".to_string(), "validator02".to_string()];
        nodes.insert("light01".to_string(), light01);

        let validators: BTreeMap<String, u64> = ["validator01", "validator02", "validator03"]
            .iter()
            .map(|name| (name.to_string(), 50))
            .collect();
        let mut validator_updates = BTreeMap::new();
        validator_updates.insert(
            "10".to_string(),
            BTreeMap::from([("validator04".to_string(), 40)]),
        );

        Manifest {
            name: "quad-test".to_string(),
            ipv6: false,
            initial_height: 0,
            initial_state: BTreeMap::new(),
            validators,
            validator_updates,
            nodes,
            key_type: "ed25519".to_string(),
            evidence: 0,
            queue_type: "priority".to_string(),
            tx_size: 1024,
        }
    }

    fn first_failure(manifest: &Manifest) -> Option<&'static str> {
        ManifestPropertyChecker::new(manifest)
            .verify_all()
            .err()
            .map(|result| result.name)
    }

    #[test]
    fn test_valid_manifest_passes() {
        let manifest = valid_manifest();
        let summary = ManifestPropertyChecker::new(&manifest).summary();
        assert_eq!(summary.failed, 0, "{}", summary.format_report());
        assert_eq!(summary.total, 10);
    }

    #[test]
    fn test_quorum_violation() {
        let mut manifest = valid_manifest();
        manifest.nodes.get_mut("validator03").unwrap().start_at = 10;
        let result = ManifestPropertyChecker::new(&manifest).check_quorum_at_genesis();
        assert!(!result.holds);
        assert!(result.violation.unwrap().contains("quorum is 3"));
    }

    #[test]
    fn test_delayed_spacing_violation() {
        let mut manifest = valid_manifest();
        manifest.initial_height = 1000;
        let result = ManifestPropertyChecker::new(&manifest).check_delayed_validator_spacing();
        assert!(!result.holds);
        assert!(result.violation.unwrap().contains("expected 1005"));
    }

    #[test]
    fn test_missing_validator_update() {
        let mut manifest = valid_manifest();
        manifest.validator_updates.clear();
        assert_eq!(first_failure(&manifest), Some("ValidatorSetCoverage"));
    }

    #[test]
    fn test_init_chain_validators_are_covered() {
        let mut manifest = valid_manifest();
        let genesis = std::mem::take(&mut manifest.validators);
        manifest.validator_updates.insert("0".to_string(), genesis);
        assert_eq!(first_failure(&manifest), None);
    }

    #[test]
    fn test_archive_violation() {
        let mut manifest = valid_manifest();
        manifest.nodes.get_mut("validator02").unwrap().retain_blocks = 28;
        assert_eq!(first_failure(&manifest), Some("ArchiveValidators"));
    }

    #[test]
    fn test_retention_violation() {
        let mut manifest = valid_manifest();
        manifest.nodes.get_mut("validator03").unwrap().persist_interval = Some(20);
        assert_eq!(first_failure(&manifest), Some("RetentionCoversIntervals"));
    }

    #[test]
    fn test_state_sync_violation() {
        let mut manifest = valid_manifest();
        manifest.nodes.get_mut("validator04").unwrap().block_sync = "v2".to_string();
        assert_eq!(first_failure(&manifest), Some("StateSyncUsesBlockSyncV0"));
    }

    #[test]
    fn test_peer_cycle_violation() {
        let mut manifest = valid_manifest();
        manifest.nodes.get_mut("validator01").unwrap().persistent_peers =
            vec!["validator02".to_string()];
        assert_eq!(first_failure(&manifest), Some("AcyclicPeerGraph"));
    }

    #[test]
    fn test_seed_mesh_violation() {
        let mut manifest = valid_manifest();
        manifest.nodes.get_mut("seed02").unwrap().seeds.clear();
        assert_eq!(first_failure(&manifest), Some("SeedMesh"));
    }

    #[test]
    fn test_role_naming_violation() {
        let mut manifest = valid_manifest();
        let light = manifest.nodes.remove("light01").unwrap();
        manifest.nodes.insert("client01".to_string(), light);
        assert_eq!(first_failure(&manifest), Some("RoleNaming"));
    }

    #[test]
    fn test_light_provider_violation() {
        let mut manifest = valid_manifest();
        manifest.nodes.get_mut("light01").unwrap().persistent_peers =
            vec!["validator03".to_string()];
        assert_eq!(first_failure(&manifest), Some("LightProviders"));

        let mut manifest = valid_manifest();
        manifest.nodes.get_mut("light01").unwrap().start_at = 10;
        assert_eq!(first_failure(&manifest), Some("LightProviders"));
    }

    #[test]
    fn test_failure_carries_seed() {
        let mut manifest = valid_manifest();
        manifest.nodes.get_mut("seed02").unwrap().seeds.clear();
        let failure = ManifestPropertyChecker::new(&manifest)
            .with_seed(42)
            .verify_all()
            .unwrap_err();
        assert_eq!(failure.seed, Some(42));
        assert!(failure.format_status().contains("quad-test"));
    }
}
