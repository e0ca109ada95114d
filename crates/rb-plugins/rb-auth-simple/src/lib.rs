//! # rb-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing and opaque session tokens.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use base64::Engine;
use rb_core::traits::AuthProvider;
use sha2::{Digest, Sha256};

/// Random bytes behind each session token.
const TOKEN_BYTES: usize = 32;
const SALT_BYTES: usize = 16;

#[derive(Default)]
pub struct SimpleAuthProvider {
    argon2: Argon2<'static>,
}

impl SimpleAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn random_bytes<const N: usize>() -> anyhow::Result<[u8; N]> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow::anyhow!("OS randomness unavailable: {e}"))?;
    Ok(buf)
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    /// Hashes with a fresh random salt into a PHC string ($argon2id$...).
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::encode_b64(&random_bytes::<SALT_BYTES>()?)
            .map_err(|e| anyhow::anyhow!("salt encoding failed: {e}"))?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// URL-safe base64 of 32 random bytes.
    fn new_session_token(&self) -> anyhow::Result<String> {
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes::<TOKEN_BYTES>()?))
    }

    /// Hex SHA-256 of the token; what the session table stores.
    fn token_digest(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let auth = SimpleAuthProvider::new();
        let hash = auth.hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(auth.verify_password("correct horse", &hash).await);
        assert!(!auth.verify_password("wrong horse", &hash).await);
    }

    #[tokio::test]
    async fn garbage_hash_never_verifies() {
        let auth = SimpleAuthProvider::new();
        assert!(!auth.verify_password("anything", "not-a-phc-string").await);
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let auth = SimpleAuthProvider::new();
        assert_ne!(auth.hash_password("pw123456").unwrap(), auth.hash_password("pw123456").unwrap());
    }

    #[test]
    fn tokens_are_unique_and_digests_stable() {
        let auth = SimpleAuthProvider::new();
        let a = auth.new_session_token().unwrap();
        let b = auth.new_session_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert_eq!(auth.token_digest(&a), auth.token_digest(&a));
        assert_eq!(auth.token_digest(&a).len(), 64);
        assert_ne!(auth.token_digest(&a), a);
    }
}
