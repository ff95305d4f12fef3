//! # tn-dst
//!
//! Deterministic random stream for testnet manifest generation.
//!
//! Every random decision the generator makes is drawn from a single
//! [`DeterministicRng`] threaded by reference through the call chain. Given
//! the same seed and the same options, a generation run always produces the
//! same manifests.
//!
//! ## Usage
//!
//! ```rust
//! use tn_dst::DeterministicRng;
//!
//! let mut rng = DeterministicRng::new(4827085738);
//! let index = rng.gen_range(0..10);
//! let coin = rng.gen_bool(0.5);
//! # let _ = (index, coin);
//! ```
//!
//! ## Reproducibility
//!
//! To reproduce a batch:
//! ```bash
//! TESTNET_SEED=12345 cargo run -p tn-generator --bin tn-generate -- --dir out
//! ```

pub mod random;

pub use random::DeterministicRng;

use std::env::VarError;

use thiserror::Error;
use tracing::info;

/// Environment variable consulted for the generation seed.
pub const SEED_ENV_VAR: &str = "TESTNET_SEED";

/// Errors resolving a seed from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("{var}={value:?} is not a valid u64 seed")]
    Invalid { var: String, value: String },
}

/// Read a seed from `var`, falling back to `default` when it is unset.
///
/// A value that is set but not a valid UTF-8 `u64` is an error.
///
/// Logs the seed in use so a run can be reproduced.
pub fn seed_from_env(var: &str, default: u64) -> Result<u64, SeedError> {
    debug_assert!(!var.is_empty(), "Environment variable name must not be empty");

    match std::env::var(var) {
        Ok(raw) => {
            let seed = raw.trim().parse::<u64>().map_err(|_| SeedError::Invalid {
                var: var.to_string(),
                value: raw.clone(),
            })?;
            info!(seed, var, "using seed from environment");
            Ok(seed)
        }
        Err(VarError::NotPresent) => {
            info!(seed = default, var, "using default seed");
            Ok(default)
        }
        Err(VarError::NotUnicode(raw)) => Err(SeedError::Invalid {
            var: var.to_string(),
            value: raw.to_string_lossy().into_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_from_env_default_when_unset() {
        let seed = seed_from_env("TN_DST_TEST_SEED_UNSET_VAR", 77).unwrap();
        assert_eq!(seed, 77);
    }

    #[test]
    fn test_seed_from_env_parses_value() {
        std::env::set_var("TN_DST_TEST_SEED_SET_VAR", " 12345 ");
        let seed = seed_from_env("TN_DST_TEST_SEED_SET_VAR", 1).unwrap();
        assert_eq!(seed, 12345);
    }

    #[test]
    fn test_seed_from_env_rejects_garbage() {
        std::env::set_var("TN_DST_TEST_SEED_BAD_VAR", "not-a-seed");
        let err = seed_from_env("TN_DST_TEST_SEED_BAD_VAR", 1).unwrap_err();
        assert!(matches!(err, SeedError::Invalid { .. }));
        assert!(err.to_string().contains("not-a-seed"));
    }

    #[cfg(unix)]
    #[test]
    fn test_seed_from_env_rejects_non_unicode() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        std::env::set_var(
            "TN_DST_TEST_SEED_NON_UNICODE_VAR",
            OsString::from_vec(vec![b'4', 0xff, b'2']),
        );
        let err = seed_from_env("TN_DST_TEST_SEED_NON_UNICODE_VAR", 1).unwrap_err();
        assert!(matches!(err, SeedError::Invalid { .. }));
    }
}
