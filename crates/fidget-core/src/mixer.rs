//! Hash-based mixing of pool snapshots into output integers.
//!
//! Every call hashes the entire current snapshot plus a timestamp, rather
//! than consuming samples. Two `mix_one` calls within the same clock tick
//! against an unchanged snapshot therefore produce the same value; this is
//! inherited behavior and is preserved rather than strengthened, since
//! strengthening would change observable output. Batch mixing perturbs each
//! output with its index and each sample with its position, so batch outputs
//! diverge even at a fixed timestamp.

use sha2::{Digest, Sha256};

use crate::config::OUTPUT_RANGE;

/// Reduce a digest to an integer in `[0, 2048)`: first 4 bytes, big-endian,
/// modulo the output range.
fn reduce(digest: &[u8]) -> u16 {
    let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (word % OUTPUT_RANGE) as u16
}

/// Mix a snapshot and a timestamp into a single number in `[0, 2048)`.
///
/// The timestamp is fed as its full decimal-string encoding (not truncated),
/// then every sample in snapshot order as fixed-width 4-byte big-endian.
pub fn mix_one(snapshot: &[u32], timestamp_ns: u128) -> u16 {
    let mut hasher = Sha256::new();
    hasher.update(timestamp_ns.to_string().as_bytes());
    for &sample in snapshot {
        hasher.update(sample.to_be_bytes());
    }
    reduce(&hasher.finalize())
}

/// Mix a snapshot into `count` independently-hashed numbers in `[0, 2048)`.
///
/// Each output index `i` gets a fresh hash state fed `timestamp_ns + i` and
/// `i` as distinct decimal-string inputs, then every sample `s` at position
/// `j` as `s ^ i ^ j` in 4-byte big-endian. The index/position XOR is what
/// differentiates otherwise-identical inputs across the batch.
pub fn mix_batch(snapshot: &[u32], timestamp_ns: u128, count: usize) -> Vec<u16> {
    (0..count)
        .map(|i| {
            let mut hasher = Sha256::new();
            hasher.update((timestamp_ns + i as u128).to_string().as_bytes());
            hasher.update(i.to_string().as_bytes());
            for (j, &sample) in snapshot.iter().enumerate() {
                let perturbed = sample ^ i as u32 ^ j as u32;
                hasher.update(perturbed.to_be_bytes());
            }
            reduce(&hasher.finalize())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Vec<u32> {
        (0..500u32).map(|i| i.wrapping_mul(2_654_435_761)).collect()
    }

    #[test]
    fn mix_one_is_in_range() {
        for ts in [0u128, 1, 1_700_000_000_000_000_000, u128::from(u64::MAX)] {
            let v = mix_one(&snapshot(), ts);
            assert!(v < 2048);
        }
    }

    #[test]
    fn mix_one_is_deterministic_for_fixed_inputs() {
        // Documented weakness: same snapshot + same timestamp = same output.
        let snap = snapshot();
        assert_eq!(mix_one(&snap, 123_456_789), mix_one(&snap, 123_456_789));
    }

    #[test]
    fn mix_one_depends_on_timestamp() {
        let snap = snapshot();
        let a = mix_one(&snap, 1_000_000);
        // A different timestamp should (with overwhelming probability over a
        // set of tries) change the output at least once.
        let diverged = (1..64u128).any(|d| mix_one(&snap, 1_000_000 + d) != a);
        assert!(diverged);
    }

    #[test]
    fn mix_one_depends_on_sample_order() {
        let snap = snapshot();
        let mut reversed = snap.clone();
        reversed.reverse();
        let same = (0..32u128).all(|ts| mix_one(&snap, ts) == mix_one(&reversed, ts));
        assert!(!same, "insertion order must affect mixing");
    }

    #[test]
    fn mix_batch_returns_exact_count_in_range() {
        let out = mix_batch(&snapshot(), 42, 24);
        assert_eq!(out.len(), 24);
        assert!(out.iter().all(|&v| v < 2048));
    }

    #[test]
    fn mix_batch_outputs_diverge_at_fixed_timestamp() {
        let out = mix_batch(&snapshot(), 987_654_321, 8);
        let first = out[0];
        assert!(
            out.iter().any(|&v| v != first),
            "index perturbation must differentiate batch outputs"
        );
    }

    #[test]
    fn mix_batch_index_zero_differs_from_mix_one() {
        // Batch index 0 still feeds the "0" index encoding and position XORs,
        // so it is not the same stream as mix_one.
        let snap = snapshot();
        let one = mix_one(&snap, 555);
        let batch = mix_batch(&snap, 555, 4);
        assert!(batch[0] != one || batch[1] != one || batch[2] != one);
    }

    #[test]
    fn empty_snapshot_still_reduces() {
        // The mixer itself has no minimum; gating lives in the policy.
        let v = mix_one(&[], 77);
        assert!(v < 2048);
        assert_eq!(mix_batch(&[], 77, 3).len(), 3);
    }
}
