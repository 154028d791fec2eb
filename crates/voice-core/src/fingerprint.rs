//! Instruction fingerprints for logs.

use sha2::{Digest, Sha256};

/// Hex characters kept from the digest.
const FINGERPRINT_LEN: usize = 12;

/// Short SHA-256 fingerprint of the instructions a call runs with.
///
/// Logs carry this instead of the instruction text. Surrounding
/// whitespace does not change the fingerprint.
pub fn fingerprint_instructions(instructions: &str) -> String {
    Sha256::digest(instructions.trim().as_bytes())
        .iter()
        .take(FINGERPRINT_LEN / 2)
        .map(|byte| format!("{:02x}", byte))
        .collect()
}
