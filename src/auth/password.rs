use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

fn hasher_error(op: &'static str, e: password_hash::Error) -> anyhow::Error {
    error!(op, error = %e, "argon2 failure");
    anyhow::anyhow!("argon2 {op}: {e}")
}

/// Argon2id PHC string for `plain`, salted fresh on every call.
/// Empty input hashes like anything else.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| hasher_error("hash", e))
}

/// `Ok(false)` on mismatch; `Err` if `stored` is not a usable PHC string.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| hasher_error("parse", e))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(hasher_error("verify", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let password = "ten-thousand-hours";
        let hash = hash_password(password).expect("hashing should succeed");
        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_password_still_hashes() {
        let hash = hash_password("").expect("empty input hashes");
        assert!(verify_password("", &hash).unwrap());
        assert!(!verify_password(" ", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("scales-every-morning").unwrap();
        assert!(!verify_password("scales-every-evening", &hash).expect("verify should not error"));
    }

    #[test]
    fn stored_hash_verifies_only_its_own_password() {
        let ada = hash_password("ada-practice").unwrap();
        let grace = hash_password("grace-practice").unwrap();
        assert!(verify_password("ada-practice", &ada).unwrap());
        assert!(!verify_password("ada-practice", &grace).unwrap());
        assert!(!verify_password("grace-practice", &ada).unwrap());
    }

    #[test]
    fn verify_errors_on_plaintext_in_store() {
        let err = verify_password("hunter2", "hunter2").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
