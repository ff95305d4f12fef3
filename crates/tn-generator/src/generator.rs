//! Manifest assembler.
//!
//! Expands the option space once, then builds one manifest per combination:
//! seeds, validators with quorum timing, full nodes, peer wiring, and finally
//! light clients. All randomness comes from the caller's stream, in a fixed
//! order, so a seed reproduces the whole batch.

use std::collections::BTreeMap;

use tn_core::{sort_by_name, ConfigError, Manifest, Mode, P2PMode};
use tn_dst::DeterministicRng;
use tracing::{debug, info};

use crate::config::{Distributions, Options};
use crate::distribution::Choice;
use crate::node::NodeFactory;
use crate::options::{
    Combination, OptionSpace, Topology, ValidatorOnboarding, INITIAL_HEIGHT, INITIAL_STATE, P2P,
    QUEUE_TYPE, TOPOLOGY, VALIDATORS,
};
use crate::topology::TopologyBuilder;

/// Height gap between consecutive delayed starts.
pub const START_HEIGHT_STEP: u64 = 5;

/// Number of leading validators forced into archive form.
pub const ARCHIVE_VALIDATORS_COUNT: usize = 2;

/// Validator voting power range.
pub const VALIDATOR_WEIGHT_MIN: u64 = 30;
pub const VALIDATOR_WEIGHT_MAX: u64 = 100;

/// Validator-set update key for validators returned by chain initialization.
pub const INIT_CHAIN_UPDATE_HEIGHT: &str = "0";

/// Generates batches of testnet manifests.
#[derive(Debug, Clone)]
pub struct Generator {
    distributions: Distributions,
    space: OptionSpace,
    options: Options,
}

impl Generator {
    /// Create a generator. A non-mixed `options.p2p` pins the peer-stack
    /// dimension of `space`.
    #[must_use]
    pub fn new(distributions: Distributions, mut space: OptionSpace, options: Options) -> Self {
        space.narrow_p2p(options.p2p);
        Self {
            distributions,
            space,
            options,
        }
    }

    /// Production tables and option matrix.
    #[must_use]
    pub fn with_defaults(options: Options) -> Self {
        Self::new(
            Distributions::default(),
            OptionSpace::testnet_defaults(),
            options,
        )
    }

    #[must_use]
    pub fn distributions(&self) -> &Distributions {
        &self.distributions
    }

    #[must_use]
    pub fn space(&self) -> &OptionSpace {
        &self.space
    }

    #[must_use]
    pub fn options(&self) -> Options {
        self.options
    }

    /// Generate one manifest per option combination.
    ///
    /// Single-node hybrid networks are dropped: with one node the hybrid
    /// stack is indistinguishable from a fixed one. Any invalid combination
    /// fails the whole batch.
    pub fn generate(&self, rng: &mut DeterministicRng) -> Result<Vec<Manifest>, ConfigError> {
        let combinations = self.space.expand();
        let mut manifests = Vec::with_capacity(combinations.len());
        let mut dropped = 0usize;

        for combination in &combinations {
            let manifest = self.generate_testnet(rng, combination)?;

            // generate_testnet has already validated the p2p value.
            if manifest.nodes.len() == 1 && combination.text(P2P)? == P2PMode::Hybrid.as_str() {
                debug!(manifest = %manifest.name, "dropping single-node hybrid testnet");
                dropped += 1;
                continue;
            }
            manifests.push(manifest);
        }

        if self.options.sorted {
            sort_by_name(&mut manifests);
        }

        info!(
            seed = rng.seed(),
            combinations = combinations.len(),
            manifests = manifests.len(),
            dropped,
            "generated testnet batch"
        );
        Ok(manifests)
    }

    /// Generate the manifest for a single option combination.
    pub fn generate_testnet(
        &self,
        rng: &mut DeterministicRng,
        combination: &Combination,
    ) -> Result<Manifest, ConfigError> {
        let topology: Topology = combination.text(TOPOLOGY)?.parse()?;
        let p2p = parse_p2p(combination)?;
        let onboarding: ValidatorOnboarding = combination.text(VALIDATORS)?.parse()?;
        let initial_height = combination.int(INITIAL_HEIGHT)?;
        let initial_state = combination.state(INITIAL_STATE)?.clone();
        let queue_type = combination.text(QUEUE_TYPE)?.to_string();

        let d = &self.distributions;
        let mut manifest = Manifest {
            name: combination.label(),
            ipv6: d.ipv6.choose(rng),
            initial_height,
            initial_state,
            validators: BTreeMap::new(),
            validator_updates: BTreeMap::new(),
            nodes: BTreeMap::new(),
            key_type: d.key_types.choose(rng),
            evidence: d.evidence.choose(rng),
            queue_type,
            tx_size: d.tx_sizes.choose(rng),
        };

        let counts = topology.node_counts(rng);
        let factory = NodeFactory::new(d);

        for i in 1..=counts.seeds {
            let mut node = factory.generate_node(rng, Mode::Seed, 0, initial_height, false);
            node.use_legacy_p2p = use_legacy_p2p(rng, p2p);
            manifest.nodes.insert(Mode::Seed.node_name(i), node);
        }

        // A BFT quorum starts at genesis; the rest join one at a time, each
        // through a validator-set update one step after it starts.
        let mut next_start_at = initial_height + START_HEIGHT_STEP;
        let quorum = counts.validators * 2 / 3 + 1;
        for i in 1..=counts.validators {
            let start_at = if i > quorum {
                let start_at = next_start_at;
                next_start_at += START_HEIGHT_STEP;
                start_at
            } else {
                0
            };

            let name = Mode::Validator.node_name(i);
            let force_archive = i <= ARCHIVE_VALIDATORS_COUNT;
            let mut node =
                factory.generate_node(rng, Mode::Validator, start_at, initial_height, force_archive);
            node.use_legacy_p2p = use_legacy_p2p(rng, p2p);
            manifest.nodes.insert(name.clone(), node);

            let weight = rng.gen_range(VALIDATOR_WEIGHT_MIN..=VALIDATOR_WEIGHT_MAX);
            if start_at == 0 {
                manifest.validators.insert(name, weight);
            } else {
                manifest.validator_updates.insert(
                    (start_at + START_HEIGHT_STEP).to_string(),
                    BTreeMap::from([(name, weight)]),
                );
            }
        }

        if onboarding == ValidatorOnboarding::InitChain {
            let genesis = std::mem::take(&mut manifest.validators);
            manifest
                .validator_updates
                .insert(INIT_CHAIN_UPDATE_HEIGHT.to_string(), genesis);
        }

        for i in 1..=counts.fulls {
            let start_at = if rng.gen_bool(0.5) {
                let start_at = next_start_at;
                next_start_at += START_HEIGHT_STEP;
                start_at
            } else {
                0
            };
            let mut node = factory.generate_node(rng, Mode::Full, start_at, initial_height, false);
            node.use_legacy_p2p = use_legacy_p2p(rng, p2p);
            manifest.nodes.insert(Mode::Full.node_name(i), node);
        }

        let builder = TopologyBuilder::new(&manifest);
        builder.wire(rng, &mut manifest);

        // Light clients start after every delayed node, including the last
        // validator-set activation.
        builder.attach_light_clients(
            rng,
            &factory,
            &mut manifest,
            counts.lights,
            next_start_at + START_HEIGHT_STEP,
        );

        debug!(
            manifest = %manifest.name,
            nodes = manifest.nodes.len(),
            validators = counts.validators,
            quorum,
            "generated testnet"
        );
        Ok(manifest)
    }
}

fn parse_p2p(combination: &Combination) -> Result<P2PMode, ConfigError> {
    match combination.text(P2P)?.parse::<P2PMode>()? {
        P2PMode::Mixed => Err(ConfigError::UnknownP2PMode(P2PMode::Mixed.to_string())),
        mode => Ok(mode),
    }
}

/// Whether a seed, validator or full node runs the legacy peer stack.
fn use_legacy_p2p(rng: &mut DeterministicRng, p2p: P2PMode) -> bool {
    match p2p {
        P2PMode::Legacy => true,
        P2PMode::Hybrid => rng.gen_bool(0.5),
        P2PMode::New | P2PMode::Mixed => false,
    }
}
