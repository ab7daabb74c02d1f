//! Workload contract shared by every benchmark target.
//!
//! Each consumer run performs the same fixed unit of CPU-bound work: a batch
//! of SHA3-512 digests over strings that are unique per invocation, so no
//! runtime can cache its way out of the computation. The batch is large
//! enough to register in a timing trace and small enough that startup cost
//! still dominates the measurement.

use chrono::{SecondsFormat, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha3::{Digest, Sha3_512};

/// Digests computed per workload execution, identical across all targets.
pub const DIGEST_COUNT: usize = 50;

/// One workload unit with OS-seeded randomness.
pub fn compute_digest_batch() -> Vec<String> {
    digest_batch_with_rng(&mut StdRng::from_entropy())
}

/// One workload unit over a caller-provided randomness source. Each input is
/// a current timestamp joined with two random draws, hashed to lowercase hex.
pub fn digest_batch_with_rng(rng: &mut impl Rng) -> Vec<String> {
    (0..DIGEST_COUNT)
        .map(|_| {
            let input = format!(
                "{}-{}-{}",
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                rng.gen::<f64>(),
                rng.gen::<f64>()
            );
            let mut hasher = Sha3_512::new();
            hasher.update(input.as_bytes());
            format!("{:x}", hasher.finalize())
        })
        .collect()
}
