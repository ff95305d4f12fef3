//! # tn-core
//!
//! Core types for generated testnets.
//!
//! A [`Manifest`] declares one test network: global chain parameters, the
//! validator set and its scheduled updates, and every node with its role,
//! storage and protocol choices, and peer wiring. Manifests are produced by
//! `tn-generator` and consumed by an external runner that boots the nodes.
//!
//! The [`invariants`] module checks that a manifest can legally boot:
//! quorum timing, archive nodes, retention consistency, acyclic peer wiring.

pub mod errors;
pub mod invariants;
pub mod manifest;
pub mod property;

pub use errors::ConfigError;
pub use invariants::ManifestPropertyChecker;
pub use manifest::{
    sort_by_name, split_groups, Manifest, ManifestNode, Mode, P2PMode, Perturbation, StateSync,
};
pub use property::{PropertyChecker, PropertyResult, PropertySummary};
