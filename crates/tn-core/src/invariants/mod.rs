//! Invariant checkers for generated testnets.
//!
//! Each module defines the properties a generated artifact must satisfy
//! before it is handed to the runner.

pub mod manifest;

pub use manifest::ManifestPropertyChecker;
