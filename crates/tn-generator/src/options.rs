//! Option space expansion.
//!
//! A testnet batch is the Cartesian product of a handful of named
//! dimensions. Dimensions are expanded in lexicographic order of their
//! names, so the same space always yields combinations in the same sequence
//! and batch numbering stays stable between runs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tn_core::{ConfigError, P2PMode};
use tn_dst::DeterministicRng;

pub const TOPOLOGY: &str = "topology";
pub const P2P: &str = "p2p";
pub const QUEUE_TYPE: &str = "queueType";
pub const INITIAL_HEIGHT: &str = "initialHeight";
pub const INITIAL_STATE: &str = "initialState";
pub const VALIDATORS: &str = "validators";

/// A candidate value for one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Int(u64),
    Text(String),
    State(BTreeMap<String, String>),
}

impl OptionValue {
    #[must_use]
    pub fn text(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(value) => write!(f, "{}", value),
            OptionValue::Text(value) => f.write_str(value),
            OptionValue::State(state) => write!(f, "{}kv", state.len()),
        }
    }
}

/// One point of the option space: a single value per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combination {
    values: BTreeMap<String, OptionValue>,
}

impl Combination {
    #[must_use]
    pub fn get(&self, dimension: &str) -> Option<&OptionValue> {
        self.values.get(dimension)
    }

    fn require(&self, dimension: &str) -> Result<&OptionValue, ConfigError> {
        self.values
            .get(dimension)
            .ok_or_else(|| ConfigError::MissingOption(dimension.to_string()))
    }

    pub fn text(&self, dimension: &str) -> Result<&str, ConfigError> {
        match self.require(dimension)? {
            OptionValue::Text(value) => Ok(value),
            _ => Err(ConfigError::OptionType {
                dimension: dimension.to_string(),
                expected: "text",
            }),
        }
    }

    pub fn int(&self, dimension: &str) -> Result<u64, ConfigError> {
        match self.require(dimension)? {
            OptionValue::Int(value) => Ok(*value),
            _ => Err(ConfigError::OptionType {
                dimension: dimension.to_string(),
                expected: "an integer",
            }),
        }
    }

    pub fn state(&self, dimension: &str) -> Result<&BTreeMap<String, String>, ConfigError> {
        match self.require(dimension)? {
            OptionValue::State(state) => Ok(state),
            _ => Err(ConfigError::OptionType {
                dimension: dimension.to_string(),
                expected: "a key/value map",
            }),
        }
    }

    /// Manifest name for this combination, e.g. `quad-new-genesis-h0-s0kv-priority`.
    #[must_use]
    pub fn label(&self) -> String {
        let part = |dimension: &str| {
            self.values
                .get(dimension)
                .map_or_else(|| "none".to_string(), ToString::to_string)
        };
        format!(
            "{}-{}-{}-h{}-s{}-{}",
            part(TOPOLOGY),
            part(P2P),
            part(VALIDATORS),
            part(INITIAL_HEIGHT),
            part(INITIAL_STATE),
            part(QUEUE_TYPE)
        )
    }
}

/// Named dimensions, each with an ordered list of candidate values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSpace {
    dimensions: BTreeMap<String, Vec<OptionValue>>,
}

impl OptionSpace {
    /// An empty space; expands to a single empty combination.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a dimension.
    #[must_use]
    pub fn with_dimension(mut self, name: &str, values: Vec<OptionValue>) -> Self {
        self.set(name, values);
        self
    }

    pub fn set(&mut self, name: &str, values: Vec<OptionValue>) {
        debug_assert!(!name.is_empty(), "Dimension name must not be empty");
        self.dimensions.insert(name.to_string(), values);
    }

    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&[OptionValue]> {
        self.dimensions.get(name).map(Vec::as_slice)
    }

    /// Pin the peer-stack dimension. `Mixed` leaves the space untouched.
    pub fn narrow_p2p(&mut self, mode: P2PMode) {
        if mode != P2PMode::Mixed {
            self.set(P2P, vec![OptionValue::text(mode.as_str())]);
        }
    }

    /// Number of combinations `expand` will produce.
    #[must_use]
    pub fn combinations_count(&self) -> usize {
        self.dimensions.values().map(Vec::len).product()
    }

    /// Full Cartesian product, first dimension varying slowest.
    #[must_use]
    pub fn expand(&self) -> Vec<Combination> {
        let mut combinations = vec![Combination::default()];
        for (name, values) in &self.dimensions {
            let mut next = Vec::with_capacity(combinations.len() * values.len());
            for head in &combinations {
                for value in values {
                    let mut combination = head.clone();
                    combination.values.insert(name.clone(), value.clone());
                    next.push(combination);
                }
            }
            combinations = next;
        }

        debug_assert_eq!(combinations.len(), self.combinations_count());
        combinations
    }

    /// The production testnet matrix.
    #[must_use]
    pub fn testnet_defaults() -> Self {
        let initial_state: BTreeMap<String, String> =
            [("initial01", "a"), ("initial02", "b"), ("initial03", "c")]
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();

        Self::new()
            .with_dimension(
                TOPOLOGY,
                ["single", "quad", "large"].map(OptionValue::text).to_vec(),
            )
            .with_dimension(
                P2P,
                P2PMode::CONCRETE
                    .iter()
                    .map(|mode| OptionValue::text(mode.as_str()))
                    .collect(),
            )
            // fifo and wdrr are not exercised yet.
            .with_dimension(QUEUE_TYPE, vec![OptionValue::text("priority")])
            .with_dimension(INITIAL_HEIGHT, vec![OptionValue::Int(0), OptionValue::Int(1000)])
            .with_dimension(
                INITIAL_STATE,
                vec![
                    OptionValue::State(BTreeMap::new()),
                    OptionValue::State(initial_state),
                ],
            )
            .with_dimension(
                VALIDATORS,
                ["genesis", "initchain"].map(OptionValue::text).to_vec(),
            )
    }
}

/// Shape of the generated network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// One validator.
    Single,
    /// Four validators.
    Quad,
    /// Random seed, validator, full and light counts.
    Large,
}

impl FromStr for Topology {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Topology::Single),
            "quad" => Ok(Topology::Quad),
            "large" => Ok(Topology::Large),
            other => Err(ConfigError::UnknownTopology(other.to_string())),
        }
    }
}

/// Node counts per role for one manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCounts {
    pub seeds: usize,
    pub validators: usize,
    pub fulls: usize,
    pub lights: usize,
}

impl Topology {
    /// Node counts for this shape. Only `Large` draws from the stream.
    pub fn node_counts(self, rng: &mut DeterministicRng) -> NodeCounts {
        match self {
            Topology::Single => NodeCounts {
                validators: 1,
                ..NodeCounts::default()
            },
            Topology::Quad => NodeCounts {
                validators: 4,
                ..NodeCounts::default()
            },
            // Kept small: large networks use too much CPU on the runners.
            Topology::Large => {
                let seeds = rng.gen_range(0..2);
                let lights = rng.gen_range(0..3);
                let validators = 4 + rng.gen_range(0..4);
                let fulls = rng.gen_range(0..4);
                NodeCounts {
                    seeds,
                    validators,
                    fulls,
                    lights,
                }
            }
        }
    }
}

/// How the initial validator set reaches the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorOnboarding {
    /// Listed in the genesis document.
    Genesis,
    /// Returned by the application from chain initialization.
    InitChain,
}

impl FromStr for ValidatorOnboarding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genesis" => Ok(ValidatorOnboarding::Genesis),
            "initchain" => Ok(ValidatorOnboarding::InitChain),
            other => Err(ConfigError::UnknownValidatorOnboarding(other.to_string())),
        }
    }
}
