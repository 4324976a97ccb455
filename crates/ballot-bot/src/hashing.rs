use sha2::{Digest, Sha256};

/// Pseudonym stored with votes instead of the raw user id:
/// `hex(sha256("<salt>:<user_id>"))`.
pub fn hash_user_id(salt: &str, user_id: i64) -> String {
    let digest = Sha256::digest(format!("{}:{}", salt, user_id).as_bytes());
    hex::encode(digest)
}
