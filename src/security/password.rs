/// Password hashing with Argon2id.
///
/// Hashes are stored in PHC string format, which carries the algorithm,
/// parameters and per-password salt. Plaintext never reaches the database.
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

use crate::error::{AppError, Result};

/// Hash a plaintext password, producing a PHC format string.
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash.
///
/// Returns false for a wrong password or an unparseable hash; callers
/// treat both the same way (credentials do not match).
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("hunter2secret").unwrap();
        assert!(verify_password("hunter2secret", &hash));
    }

    #[test]
    fn wrong_password_fails_verification() {
        let hash = hash_password("hunter2secret").unwrap();
        assert!(!verify_password("not-the-password", &hash));
    }

    #[test]
    fn hash_is_phc_format_and_never_plaintext() {
        let hash = hash_password("hunter2secret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert_ne!(hash, "hunter2secret");
    }

    #[test]
    fn same_password_hashes_differently_per_salt() {
        let a = hash_password("hunter2secret").unwrap();
        let b = hash_password("hunter2secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_stored_hash_does_not_verify() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
