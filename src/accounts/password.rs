use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use rand::rngs::OsRng;
use tracing::error;

use crate::{accounts::error::AccountError, config::PasswordConfig};

/// Salted adaptive hash used for stored passwords.
#[async_trait]
pub trait PasswordScheme: Send + Sync {
    /// Generates a fresh salt and returns the digest of `plaintext`.
    async fn hash(&self, plaintext: &str) -> Result<String, AccountError>;

    /// Checks `plaintext` against a stored digest. A mismatch is `Ok(false)`.
    async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AccountError>;
}

/// Argon2id with PHC-string digests. The work factor is the time cost.
#[derive(Debug, Clone)]
pub struct Argon2Scheme {
    params: Params,
}

impl Argon2Scheme {
    pub fn new(config: &PasswordConfig) -> Result<Self, AccountError> {
        let params = Params::new(config.memory_kib, config.cost, config.parallelism, None)
            .map_err(|e| AccountError::InvalidHashParams(e.to_string()))?;
        Ok(Self { params })
    }
}

fn hash_blocking(params: Params, plaintext: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let hash = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AccountError::Hashing(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

fn verify_blocking(plaintext: &str, digest: &str) -> Result<bool, AccountError> {
    let parsed = PasswordHash::new(digest).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        AccountError::MalformedDigest(e.to_string())
    })?;
    // Cost parameters come from the digest, not from `self`.
    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, "argon2 verify error");
            Err(AccountError::MalformedDigest(e.to_string()))
        }
    }
}

#[async_trait]
impl PasswordScheme for Argon2Scheme {
    async fn hash(&self, plaintext: &str) -> Result<String, AccountError> {
        let params = self.params.clone();
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || hash_blocking(params, &plaintext))
            .await
            .map_err(|e| AccountError::Hashing(format!("hashing task failed: {e}")))?
    }

    async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AccountError> {
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || verify_blocking(&plaintext, &digest))
            .await
            .map_err(|e| AccountError::Hashing(format!("verify task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> Argon2Scheme {
        Argon2Scheme::new(&PasswordConfig {
            cost: 2,
            memory_kib: 64,
            parallelism: 1,
        })
        .expect("valid params")
    }

    #[tokio::test]
    async fn argon2id_digest_verifies_its_plaintext() {
        let scheme = scheme();
        let digest = scheme.hash("secret1").await.unwrap();
        assert!(digest.starts_with("$argon2id$v=19$"));
        assert!(scheme.verify("secret1", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn mismatch_is_false_not_an_error() {
        let scheme = scheme();
        let digest = scheme.hash("secret1").await.unwrap();
        assert!(!scheme.verify("secret2", &digest).await.unwrap());
        assert!(!scheme.verify("", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn plaintext_in_password_column_is_malformed() {
        let err = scheme().verify("secret1", "secret1").await.unwrap_err();
        assert!(matches!(err, AccountError::MalformedDigest(_)));
    }

    #[tokio::test]
    async fn digest_embeds_cost_and_fresh_salt() {
        let scheme = scheme();
        let a = scheme.hash("same").await.unwrap();
        let b = scheme.hash("same").await.unwrap();
        assert!(a.contains("t=2"));
        assert!(a.contains("m=64"));
        assert_ne!(a, b);
        assert_ne!(a, "same");
    }

    #[tokio::test]
    async fn verify_uses_parameters_from_digest() {
        let old = scheme().hash("pw").await.unwrap();
        let newer = Argon2Scheme::new(&PasswordConfig {
            cost: 3,
            memory_kib: 128,
            parallelism: 1,
        })
        .unwrap();
        assert!(newer.verify("pw", &old).await.unwrap());
    }

    #[test]
    fn rejects_invalid_params() {
        let err = Argon2Scheme::new(&PasswordConfig {
            cost: 0,
            memory_kib: 64,
            parallelism: 1,
        })
        .unwrap_err();
        assert!(matches!(err, AccountError::InvalidHashParams(_)));
    }
}
