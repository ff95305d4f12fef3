//! End-to-end checks over whole generated batches.

use std::collections::BTreeSet;

use tn_core::{ManifestPropertyChecker, PropertyChecker};
use tn_dst::DeterministicRng;
use tn_generator::{
    write_manifests, Generator, Manifest, Mode, OptionSpace, Options, P2PMode, DEFAULT_SEED,
};

fn generate(seed: u64, options: Options) -> Vec<Manifest> {
    let generator = Generator::with_defaults(options);
    let mut rng = DeterministicRng::new(seed);
    generator.generate(&mut rng).unwrap()
}

#[test]
fn test_same_seed_same_batch() {
    let a = generate(DEFAULT_SEED, Options::default());
    let b = generate(DEFAULT_SEED, Options::default());
    assert_eq!(a, b);

    let json_a = serde_json::to_string_pretty(&a).unwrap();
    let json_b = serde_json::to_string_pretty(&b).unwrap();
    assert_eq!(json_a, json_b);
}

#[test]
fn test_different_seeds_differ() {
    let a = generate(1, Options::default());
    let b = generate(2, Options::default());
    assert_eq!(a.len(), b.len());
    assert_ne!(a, b);
}

#[test]
fn test_default_batch_size() {
    // 72 combinations, minus the 8 single-node hybrid ones.
    let manifests = generate(DEFAULT_SEED, Options::default());
    assert_eq!(manifests.len(), 64);

    let names: BTreeSet<&str> = manifests.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names.len(), manifests.len());
}

#[test]
fn test_properties_hold_across_seeds() {
    for seed in 0..25 {
        for manifest in generate(seed, Options::default()) {
            let checker = ManifestPropertyChecker::new(&manifest).with_seed(seed);
            if let Err(failure) = checker.verify_all() {
                panic!("{}", failure.format_status());
            }
        }
    }
}

#[test]
fn test_node_roles_and_counts() {
    for seed in 0..25 {
        for manifest in generate(seed, Options::default()) {
            let count = |mode| manifest.nodes_with_mode(mode).count();
            let validators = count(Mode::Validator);

            if manifest.name.starts_with("single-") {
                assert_eq!(manifest.nodes.len(), 1);
                assert_eq!(validators, 1);
            } else if manifest.name.starts_with("quad-") {
                assert_eq!(manifest.nodes.len(), 4);
                assert_eq!(validators, 4);
            } else {
                assert!((4..=7).contains(&validators));
                assert!(count(Mode::Seed) <= 1);
                assert!(count(Mode::Full) <= 3);
                assert!(count(Mode::Light) <= 2);
            }
        }
    }
}

#[test]
fn test_initchain_moves_genesis_validators() {
    for manifest in generate(DEFAULT_SEED, Options::default()) {
        if manifest.name.contains("-initchain-") {
            assert!(manifest.validators.is_empty());
            assert!(manifest.validator_updates.contains_key("0"));
        } else {
            assert!(!manifest.validators.is_empty());
            assert!(!manifest.validator_updates.contains_key("0"));
        }
    }
}

#[test]
fn test_no_single_node_hybrid() {
    for manifest in generate(7, Options::default()) {
        assert!(!manifest.name.starts_with("single-hybrid-"));
    }
}

#[test]
fn test_p2p_option_pins_stack() {
    let legacy = generate(11, Options {
        p2p: P2PMode::Legacy,
        sorted: false,
    });
    assert_eq!(legacy.len(), 24);
    for manifest in &legacy {
        assert!(manifest.name.contains("-legacy-"));
        assert!(manifest
            .nodes
            .values()
            .filter(|node| node.mode != Mode::Light)
            .all(|node| node.use_legacy_p2p));
    }

    let hybrid = generate(11, Options {
        p2p: P2PMode::Hybrid,
        sorted: false,
    });
    assert_eq!(hybrid.len(), 16);

    let new = generate(11, Options {
        p2p: P2PMode::New,
        sorted: false,
    });
    assert!(new
        .iter()
        .flat_map(|m| m.nodes.values())
        .all(|node| !node.use_legacy_p2p));
}

#[test]
fn test_sorted_batch() {
    let unsorted = generate(3, Options::default());
    let sorted = generate(3, Options {
        p2p: P2PMode::Mixed,
        sorted: true,
    });

    let names: Vec<&str> = sorted.iter().map(|m| m.name.as_str()).collect();
    let mut expected = names.clone();
    expected.sort_unstable();
    assert_eq!(names, expected);

    // Sorting reorders; it does not change the manifests.
    let mut resorted = unsorted;
    resorted.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(resorted, sorted);
}

#[test]
fn test_empty_space_yields_one_failure() {
    let generator = Generator::new(Default::default(), OptionSpace::new(), Options::default());
    let mut rng = DeterministicRng::new(1);
    // The single empty combination lacks every dimension.
    assert!(generator.generate(&mut rng).is_err());
}

#[test]
fn test_write_ungrouped() {
    let dir = tempfile::tempdir().unwrap();
    let manifests = generate(5, Options::default());

    let paths = write_manifests(dir.path(), &manifests, 0).unwrap();
    assert_eq!(paths.len(), manifests.len());
    assert!(dir.path().join("gen-0000.json").exists());
    assert!(dir.path().join("gen-0063.json").exists());

    let raw = std::fs::read_to_string(&paths[0]).unwrap();
    let read: Manifest = serde_json::from_str(&raw).unwrap();
    assert_eq!(read, manifests[0]);
}

#[test]
fn test_write_grouped() {
    let dir = tempfile::tempdir().unwrap();
    let manifests = generate(5, Options::default());

    let paths = write_manifests(dir.path(), &manifests, 3).unwrap();
    assert_eq!(paths.len(), 64);

    // 64 manifests in 3 groups: 22, 22, 20.
    for (group, size) in [(0, 22), (1, 22), (2, 20)] {
        let last = dir.path().join(format!("gen-group{:02}-{:04}.json", group, size - 1));
        assert!(last.exists(), "{} missing", last.display());
        let past = dir.path().join(format!("gen-group{:02}-{:04}.json", group, size));
        assert!(!past.exists());
    }
    assert!(!dir.path().join("gen-group03-0000.json").exists());
}
