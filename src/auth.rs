//! Challenge-response authentication primitives.
//!
//! The server issues a random challenge plus the account's password salt;
//! the client proves knowledge of the password by hashing instead of
//! transmitting it:
//!
//! 1. `pass_hash = SHA-256(salt ‖ utf8(password))`
//! 2. `proof = SHA-256(challenge ‖ pass_hash)`
//!
//! The proof travels as an ordered sequence of unsigned byte values.
//! Challenge material is consumed exactly once and never persisted.

use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Salt and challenge bytes returned by `GetChallenge`.
///
/// JSON has no byte-array type, so both arrive as plain arrays of numbers;
/// serde deserializes them straight into byte vectors. The `$type` marker
/// field is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeMaterial {
    #[serde(rename = "PasswordSalt")]
    pub password_salt: Vec<u8>,
    #[serde(rename = "Challenge")]
    pub challenge: Vec<u8>,
}

/// Compute the challenge proof for a password.
pub fn compute_proof(password_salt: &[u8], challenge: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(password_salt);
    hasher.update(password.as_bytes());
    let pass_hash = hasher.finalize();

    let mut hasher = Sha256::new();
    hasher.update(challenge);
    hasher.update(pass_hash);
    hasher.finalize().to_vec()
}
