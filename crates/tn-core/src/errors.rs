//! Configuration errors.

use thiserror::Error;

/// Raised when an option combination names a value the generator does not
/// know, or lacks a dimension it needs.
///
/// Generation is a pure function of its inputs, so these are never retried:
/// the whole batch fails with the offending value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown topology {0:?}")]
    UnknownTopology(String),
    #[error("unknown p2p mode {0:?}")]
    UnknownP2PMode(String),
    #[error("invalid validators option {0:?}")]
    UnknownValidatorOnboarding(String),
    #[error("option {0:?} missing from combination")]
    MissingOption(String),
    #[error("option {dimension:?} must be {expected}")]
    OptionType {
        dimension: String,
        expected: &'static str,
    },
}
