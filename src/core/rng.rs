//! # Deterministic Random Number Generation
//!
//! Seed-derived random streams that make the whole simulation reproducible:
//! the same `(seed, entity_id, timestamp)` triple always yields the same
//! stream, regardless of query order or process instance.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use sha2::{Digest, Sha256};

/// Derive a 64-bit seed from an input string.
///
/// SHA-256 over the UTF-8 bytes, leading 8 bytes interpreted as a big-endian
/// unsigned integer. The hash input format is shared with other FACIS
/// tooling, so derived seeds are identical across implementations.
fn derive_seed(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
}

/// Factory for deterministic random streams.
///
/// Holds only the base seed; every stream is derived on demand, so the
/// factory is trivially `Copy` and safe to share across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicRng {
    base_seed: u64,
}

impl DeterministicRng {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    /// The base seed this factory was created with.
    pub fn seed(&self) -> u64 {
        self.base_seed
    }

    /// Stream for a specific entity, stable across the entity's lifetime.
    ///
    /// Seeded from `SHA-256("{base_seed}:{entity_id}")`.
    pub fn entity_stream(&self, entity_id: &str) -> RandomStream {
        let seed = derive_seed(&format!("{}:{}", self.base_seed, entity_id));
        RandomStream::from_seed(seed)
    }

    /// Stream for a specific entity at a specific timestamp.
    ///
    /// Seeded from `SHA-256("{base_seed}:{entity_id}:{timestamp_ms}")`.
    /// Each generator call acquires a fresh stream and consumes it in a
    /// fixed, documented order.
    pub fn timestamp_stream(&self, entity_id: &str, timestamp_ms: i64) -> RandomStream {
        let seed = derive_seed(&format!("{}:{}:{}", self.base_seed, entity_id, timestamp_ms));
        RandomStream::from_seed(seed)
    }
}

/// A single deterministic random stream.
///
/// Thin wrapper over `ChaCha8Rng` exposing the distributions the generators
/// draw from. Not shared between threads; each generator call owns its
/// stream for the duration of the call.
pub struct RandomStream {
    inner: ChaCha8Rng,
}

impl RandomStream {
    fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform float in `[0.0, 1.0)`.
    pub fn random(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform float in `[low, high)`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.inner.gen_range(low..high)
    }

    /// Gaussian draw. A non-positive standard deviation collapses to the mean.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        if std_dev <= 0.0 {
            return mean;
        }
        Normal::new(mean, std_dev)
            .expect("standard deviation is finite and positive")
            .sample(&mut self.inner)
    }

    /// Bernoulli trial with success probability `p`.
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.random() < p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_derivation_matches_reference() {
        // SHA-256 of the literal input strings, leading 8 bytes big-endian.
        assert_eq!(derive_seed("12345:meter-001"), 9_969_546_765_869_294_291);
        assert_eq!(derive_seed("12345:weather-001"), 6_028_754_232_465_175_654);
        assert_eq!(
            derive_seed("12345:meter-001:1718150400000"),
            15_505_881_148_340_726_742
        );
    }

    #[test]
    fn test_same_inputs_same_stream() {
        let rng = DeterministicRng::new(12345);

        let mut a = rng.timestamp_stream("meter-001", 1_718_150_400_000);
        let mut b = rng.timestamp_stream("meter-001", 1_718_150_400_000);

        for _ in 0..32 {
            assert_eq!(a.random(), b.random());
        }
    }

    #[test]
    fn test_different_entities_different_streams() {
        let rng = DeterministicRng::new(12345);

        let mut a = rng.timestamp_stream("meter-001", 1_718_150_400_000);
        let mut b = rng.timestamp_stream("meter-002", 1_718_150_400_000);

        let draws_a: Vec<f64> = (0..8).map(|_| a.random()).collect();
        let draws_b: Vec<f64> = (0..8).map(|_| b.random()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn test_different_timestamps_different_streams() {
        let rng = DeterministicRng::new(12345);

        let mut a = rng.timestamp_stream("meter-001", 1_718_150_400_000);
        let mut b = rng.timestamp_stream("meter-001", 1_718_151_300_000);
        assert_ne!(a.random(), b.random());
    }

    #[test]
    fn test_different_seeds_different_streams() {
        let mut a = DeterministicRng::new(12345).entity_stream("meter-001");
        let mut b = DeterministicRng::new(54321).entity_stream("meter-001");
        assert_ne!(a.random(), b.random());
    }

    #[test]
    fn test_uniform_bounds() {
        let mut stream = DeterministicRng::new(7).entity_stream("bounds");
        for _ in 0..1000 {
            let v = stream.uniform(-0.08, 0.08);
            assert!((-0.08..0.08).contains(&v));
        }
    }

    #[test]
    fn test_normal_zero_std_is_mean() {
        let mut stream = DeterministicRng::new(7).entity_stream("degenerate");
        assert_eq!(stream.normal(42.0, 0.0), 42.0);
    }

    #[test]
    fn test_bernoulli_extremes() {
        let mut stream = DeterministicRng::new(7).entity_stream("duty");
        for _ in 0..100 {
            assert!(stream.bernoulli(1.0));
        }
        for _ in 0..100 {
            assert!(!stream.bernoulli(0.0));
        }
    }
}
