use sha2::{Digest, Sha512};
use uuid::Uuid;

/// Hashes a password with a fresh random salt. Returns (hash, salt); the
/// salt is stored next to the hash and never reused.
pub fn hash_password(plain: &str) -> (String, String) {
    let salt = Uuid::new_v4().to_string();
    let hash = compute_hash(plain, &salt);
    (hash, salt)
}

/// hex(SHA-512(password || salt)), uppercase to match stored credentials.
pub fn compute_hash(password: &str, salt: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode_upper(hasher.finalize())
}

pub fn verify_password(plain: &str, stored_hash: &str, salt: &str) -> bool {
    compute_hash(plain, salt) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let (hash, salt) = hash_password("Secur3P@ssw0rd!");
        assert!(verify_password("Secur3P@ssw0rd!", &hash, &salt));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let (hash, salt) = hash_password("correct-horse-battery-staple");
        assert!(!verify_password("wrong-password", &hash, &salt));
    }

    #[test]
    fn verify_rejects_wrong_salt() {
        let (hash, _) = hash_password("hunter2");
        assert!(!verify_password("hunter2", &hash, "some-other-salt"));
    }

    #[test]
    fn salts_are_unique_per_call() {
        let (_, salt_a) = hash_password("same-password");
        let (_, salt_b) = hash_password("same-password");
        assert_ne!(salt_a, salt_b);
    }

    #[test]
    fn digest_is_uppercase_hex_sha512() {
        let hash = compute_hash("abc", "salt");
        assert_eq!(hash.len(), 128);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash.to_uppercase());
    }
}
