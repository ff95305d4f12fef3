//! CLI for generating randomized testnet manifests.
//!
//! # Usage
//!
//! ```bash
//! # Every combination, default seed
//! cargo run -p tn-generator --bin tn-generate -- --dir networks/generated
//!
//! # Only the new peer stack, split across 4 runners
//! cargo run -p tn-generator --bin tn-generate -- --dir out --p2p new --groups 4
//!
//! # Reproduce a batch
//! TESTNET_SEED=12345 cargo run -p tn-generator --bin tn-generate -- --dir out --verify
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tn_core::{ConfigError, ManifestPropertyChecker, P2PMode, PropertyChecker};
use tn_dst::{seed_from_env, DeterministicRng, SeedError, SEED_ENV_VAR};
use tn_generator::{write_manifests, Generator, Options, OutputError, DEFAULT_SEED};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tn-generate", about = "Generate randomized testnet manifests")]
struct Args {
    /// Output directory for manifests
    #[arg(short, long)]
    dir: PathBuf,

    /// Split manifests into this many groups (0 disables grouping)
    #[arg(short, long, default_value_t = 0)]
    groups: usize,

    /// Peer stack: new, legacy, hybrid, or mixed for all of them
    #[arg(long, default_value_t = P2PMode::Mixed)]
    p2p: P2PMode,

    /// RNG seed (defaults to $TESTNET_SEED, then a fixed seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Sort manifests by name
    #[arg(long)]
    sorted: bool,

    /// Check every manifest's invariants before writing
    #[arg(long)]
    verify: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error("generation failed: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("invariant violated: {0}")]
    Invariant(String),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

fn run(args: Args) -> Result<(), CliError> {
    let seed = match args.seed {
        Some(seed) => seed,
        None => seed_from_env(SEED_ENV_VAR, DEFAULT_SEED)?,
    };

    let generator = Generator::with_defaults(Options {
        p2p: args.p2p,
        sorted: args.sorted,
    });
    let mut rng = DeterministicRng::new(seed);
    let manifests = generator.generate(&mut rng)?;

    if args.verify {
        for manifest in &manifests {
            ManifestPropertyChecker::new(manifest)
                .with_seed(seed)
                .verify_all()
                .map_err(|failure| CliError::Invariant(failure.format_status()))?;
        }
        info!(manifests = manifests.len(), "all manifest invariants hold");
    }

    write_manifests(&args.dir, &manifests, args.groups)?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "tn-generate failed");
            ExitCode::FAILURE
        }
    }
}
