//! Generator configuration.
//!
//! The value tables every node and manifest draw from. They are plain values
//! handed to [`Generator::new`](crate::Generator::new), so tests can swap in
//! narrower or adversarial tables without touching the algorithm.

use tn_core::{P2PMode, Perturbation, StateSync};

use crate::distribution::{ProbSetChoice, UniformChoice, WeightedChoice};

/// Height window within which evidence stays valid on the testnet chain.
pub const EVIDENCE_AGE_HEIGHT: u64 = 7;

/// Seed used when neither the command line nor the environment provides one.
pub const DEFAULT_SEED: u64 = 4_827_085_738;

/// Caller-facing generation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Peer-stack mode; anything but `Mixed` pins the whole batch.
    pub p2p: P2PMode,
    /// Stably sort the batch by manifest name.
    pub sorted: bool,
}

/// Value tables for randomized node and manifest attributes.
#[derive(Debug, Clone)]
pub struct Distributions {
    pub databases: WeightedChoice<String>,
    pub abci_protocols: WeightedChoice<String>,
    pub privval_protocols: WeightedChoice<String>,
    pub block_syncs: UniformChoice<String>,
    pub mempools: UniformChoice<String>,
    pub state_syncs: UniformChoice<StateSync>,
    pub persist_intervals: UniformChoice<u64>,
    pub snapshot_intervals: UniformChoice<u64>,
    pub retain_blocks: UniformChoice<u64>,
    pub perturbations: ProbSetChoice<Perturbation>,
    pub evidence: UniformChoice<u32>,
    pub tx_sizes: UniformChoice<u64>,
    pub ipv6: UniformChoice<bool>,
    pub key_types: UniformChoice<String>,
}

fn weighted(choices: &[(&str, u32)]) -> WeightedChoice<String> {
    WeightedChoice::new(
        choices
            .iter()
            .map(|(value, weight)| ((*value).to_string(), *weight))
            .collect(),
    )
}

fn uniform_strings(values: &[&str]) -> UniformChoice<String> {
    UniformChoice::new(values.iter().map(|value| (*value).to_string()).collect())
}

impl Default for Distributions {
    fn default() -> Self {
        Self {
            databases: weighted(&[
                ("goleveldb", 35),
                ("badgerdb", 35),
                ("boltdb", 15),
                ("rocksdb", 10),
                ("cleveldb", 5),
            ]),
            abci_protocols: weighted(&[("builtin", 50), ("tcp", 20), ("grpc", 20), ("unix", 10)]),
            privval_protocols: weighted(&[("file", 50), ("grpc", 20), ("tcp", 20), ("unix", 10)]),
            // v2 stays out until it stops flaking.
            block_syncs: uniform_strings(&["v0"]),
            mempools: uniform_strings(&["v0", "v1"]),
            state_syncs: UniformChoice::new(vec![
                StateSync::Disabled,
                StateSync::P2p,
                StateSync::Rpc,
            ]),
            persist_intervals: UniformChoice::new(vec![0, 1, 5]),
            snapshot_intervals: UniformChoice::new(vec![0, 3]),
            retain_blocks: UniformChoice::new(vec![
                0,
                2 * EVIDENCE_AGE_HEIGHT,
                4 * EVIDENCE_AGE_HEIGHT,
            ]),
            perturbations: ProbSetChoice::new(vec![
                (Perturbation::Disconnect, 0.1),
                (Perturbation::Pause, 0.1),
                (Perturbation::Kill, 0.1),
                (Perturbation::Restart, 0.1),
            ]),
            evidence: UniformChoice::new(vec![0, 1, 10]),
            tx_sizes: UniformChoice::new(vec![1024, 10240]),
            ipv6: UniformChoice::new(vec![false, true]),
            key_types: uniform_strings(&["ed25519", "secp256k1"]),
        }
    }
}

impl Distributions {
    /// Default tables with fault injection switched off.
    ///
    /// Draw counts are unchanged, so manifests differ from the default
    /// tables only in their perturbation sets.
    #[must_use]
    pub fn without_perturbations() -> Self {
        let defaults = Self::default();
        Self {
            perturbations: defaults.perturbations.disabled(),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Choice;
    use tn_dst::DeterministicRng;

    #[test]
    fn test_default_retain_blocks_follow_evidence_age() {
        let distributions = Distributions::default();
        assert_eq!(distributions.retain_blocks.values(), [0, 14, 28]);
        assert_eq!(distributions.databases.total_weight(), 100);
        assert_eq!(distributions.abci_protocols.total_weight(), 100);
    }

    #[test]
    fn test_without_perturbations_keeps_draw_count() {
        let mut rng1 = DeterministicRng::new(8);
        let mut rng2 = DeterministicRng::new(8);

        for _ in 0..50 {
            let _ = Distributions::default().perturbations.choose(&mut rng1);
            let picked = Distributions::without_perturbations()
                .perturbations
                .choose(&mut rng2);
            assert!(picked.is_empty());
        }
        assert_eq!(rng1.calls_count(), rng2.calls_count());
    }

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.p2p, P2PMode::Mixed);
        assert!(!options.sorted);
    }
}
