//! # tn-generator
//!
//! Deterministic randomized testnet generator.
//!
//! Given a seed and an option space, produces a batch of [`Manifest`]s, each
//! describing a multi-node network that can legally boot: a BFT quorum of
//! validators at genesis, late validators joining through validator-set
//! updates, archive nodes to serve history, and peer wiring with no startup
//! cycles.
//!
//! # Usage
//!
//! ```rust
//! use tn_dst::DeterministicRng;
//! use tn_generator::{Generator, Options};
//!
//! let generator = Generator::with_defaults(Options::default());
//! let mut rng = DeterministicRng::new(4827085738);
//! let manifests = generator.generate(&mut rng).unwrap();
//! assert!(!manifests.is_empty());
//! ```
//!
//! # Architecture
//!
//! ```text
//! Generator ──> OptionSpace::expand (once)
//!     │
//!     └─ per combination ──> NodeFactory (per node)
//!                        ──> TopologyBuilder (whole node set)
//!                        ──> Manifest
//! ```
//!
//! Every component draws from the same [`DeterministicRng`](tn_dst::DeterministicRng),
//! passed by reference. Draw order is part of the output contract.

pub mod config;
pub mod distribution;
pub mod generator;
pub mod node;
pub mod options;
pub mod output;
pub mod topology;

pub use config::{Distributions, Options, DEFAULT_SEED};
pub use distribution::{Choice, ProbSetChoice, UniformChoice, UniformSetChoice, WeightedChoice};
pub use generator::Generator;
pub use node::NodeFactory;
pub use options::{Combination, OptionSpace, OptionValue, Topology, ValidatorOnboarding};
pub use output::{write_manifests, OutputError};
pub use topology::TopologyBuilder;

pub use tn_core::{ConfigError, Manifest, ManifestNode, Mode, P2PMode};
