use sha2::{Digest, Sha256};

/// Generate a reset token value: 32 random bytes, hex-encoded (256 bits).
pub fn generate() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// The storage form of a token value. Lookups go through this, so a leaked
/// table row cannot be replayed as a working reset link.
pub fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}
