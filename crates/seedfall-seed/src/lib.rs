//! seedfall-seed -- deterministic sub-seed derivation.
//!
//! Everything the engine generates -- terrain, item templates, spells, the
//! RNG streams simulation systems use for crit rolls -- traces back to a
//! single 64-bit [`RootSeed`]. [`RootSeed::derive`] turns the root plus a
//! category path (e.g. `["terrain", "layer", "0"]`) into a stable sub-seed:
//! same root, same path, same sub-seed, on any platform, forever.
//!
//! Derivation never touches shared mutable state. It is a pure function of
//! its inputs, which is what lets generators run on a worker pool and still
//! produce byte-identical content to a single-threaded run.

use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

/// The root of all determinism in the engine: one 64-bit value from which
/// every generator's and every simulation RNG stream's seed is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RootSeed(pub u64);

impl RootSeed {
    /// Wrap a raw 64-bit value as a root seed.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Derive a stable sub-seed from this root and a category path.
    ///
    /// The path components are hashed in order, so `derive(&["a", "b"])` and
    /// `derive(&["b", "a"])` give different results -- path order matters,
    /// but nothing outside the path and the root does. The same
    /// `(root, path)` pair always yields the same sub-seed.
    pub fn derive(&self, path: &[&str]) -> SubSeed {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.0.to_le_bytes());
        for segment in path {
            hasher.update(&(segment.len() as u64).to_le_bytes());
            hasher.update(segment.as_bytes());
        }
        let digest = hasher.finalize();
        let bytes: [u8; 8] = digest.as_bytes()[0..8].try_into().unwrap();
        SubSeed(u64::from_le_bytes(bytes))
    }
}

/// A sub-seed derived from a [`RootSeed`] and a category path.
///
/// Used directly as generator input, or converted into a keyed RNG stream
/// via [`SubSeed::rng`] for simulation-time randomness (crit rolls, AI
/// jitter) that must still be reproducible given the same root seed and
/// replayed input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubSeed(pub u64);

impl SubSeed {
    /// Derive a further sub-seed from this one, for hierarchical category
    /// paths (e.g. terrain's root seed, then per-room seeds under it).
    pub fn derive(&self, path: &[&str]) -> SubSeed {
        RootSeed(self.0).derive(path)
    }

    /// Construct a seeded RNG stream from this sub-seed.
    ///
    /// `Pcg64Mcg` is not cryptographically secure but is fast and, critically,
    /// gives identical output sequences across platforms for the same seed --
    /// the only property determinism requires here.
    pub fn rng(&self) -> Pcg64Mcg {
        use rand::SeedableRng;
        Pcg64Mcg::seed_from_u64(self.0)
    }

    /// The raw sub-seed value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_root_and_path_gives_same_subseed() {
        let root = RootSeed::new(12345);
        let a = root.derive(&["terrain", "layer", "0"]);
        let b = root.derive(&["terrain", "layer", "0"]);
        assert_eq!(a, b);
    }

    #[test]
    fn different_root_gives_different_subseed() {
        let a = RootSeed::new(12345).derive(&["terrain"]);
        let b = RootSeed::new(12346).derive(&["terrain"]);
        assert_ne!(a, b);
    }

    #[test]
    fn path_order_matters() {
        let root = RootSeed::new(1);
        let a = root.derive(&["a", "b"]);
        let b = root.derive(&["b", "a"]);
        assert_ne!(a, b);
    }

    #[test]
    fn path_segment_boundary_is_unambiguous() {
        // Without length-prefixing, ["ab", "c"] and ["a", "bc"] would hash
        // to the same byte stream.
        let root = RootSeed::new(1);
        let a = root.derive(&["ab", "c"]);
        let b = root.derive(&["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn nested_derivation_is_deterministic() {
        let root = RootSeed::new(777);
        let terrain = root.derive(&["terrain"]);
        let room0_a = terrain.derive(&["room", "0"]);
        let room0_b = terrain.derive(&["room", "0"]);
        assert_eq!(room0_a, room0_b);

        let room1 = terrain.derive(&["room", "1"]);
        assert_ne!(room0_a, room1);
    }

    #[test]
    fn rng_stream_is_reproducible() {
        use rand::Rng;
        let sub = RootSeed::new(42).derive(&["combat", "crit"]);

        let mut rng_a = sub.rng();
        let mut rng_b = sub.rng();

        let seq_a: Vec<u32> = (0..10).map(|_| rng_a.gen()).collect();
        let seq_b: Vec<u32> = (0..10).map(|_| rng_b.gen()).collect();
        assert_eq!(seq_a, seq_b);
    }

    proptest! {
        #[test]
        fn derive_never_panics(root in any::<u64>(), a in "\\PC*", b in "\\PC*") {
            let _ = RootSeed::new(root).derive(&[&a, &b]);
        }
    }
}
