//! Bearer token value generation.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length in characters of every generated token value.
pub const TOKEN_LEN: usize = 64;

/// Generate a fresh, unpredictable token value.
///
/// 128 bits of OS randomness pushed through SHA-256 and hex-encoded, so the
/// result is fixed-length and opaque. Infallible: if the OS randomness source
/// is broken the process cannot safely issue credentials at all, and `OsRng`
/// aborts rather than degrade.
pub fn generate() -> String {
    let mut seed = [0u8; 16];
    OsRng.fill_bytes(&mut seed);
    hex::encode(Sha256::digest(seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generates_fixed_length_hex() {
        let value = generate();
        assert_eq!(value.len(), TOKEN_LEN);
        assert!(value.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn no_collisions_across_many_samples() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let value = generate();
            assert!(!value.is_empty());
            assert!(seen.insert(value), "duplicate token value generated");
        }
    }
}
