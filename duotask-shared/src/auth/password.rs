/// Password hashing module using Argon2id
///
/// This module provides salted, memory-hard password hashing. The work factor
/// is expensive and tunable through [`PasswordParams`] so it can
/// be raised as hardware improves (and lowered in tests).
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Default memory**: 64 MB (65536 KB)
/// - **Default iterations**: 3 passes
/// - **Default parallelism**: 4 lanes
/// - **Output**: 32-byte hash, PHC string format
///
/// The parameters are embedded in every digest, so verification keeps
/// working for old hashes after the configured work factor changes.
///
/// # Example
///
/// ```
/// use duotask_shared::auth::password::{PasswordParams, SecretHasher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = SecretHasher::new(PasswordParams::default())?;
///
/// let hash = hasher.hash("super_secret_password_123")?;
/// assert!(hasher.verify("super_secret_password_123", &hash)?);
/// assert!(!hasher.verify("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use serde::{Deserialize, Serialize};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordParams {
    /// Memory cost in KiB (must be at least 8 × parallelism)
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MB
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl PasswordParams {
    fn argon2(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(self.memory_kib)
            .t_cost(self.iterations)
            .p_cost(self.parallelism)
            .output_len(32) // 32-byte hash output
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

        Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hashes a password using Argon2id with the given work factor
///
/// # Returns
///
/// PHC string format hash (includes algorithm, parameters, salt, and hash)
///
/// Example output:
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` if the parameters are invalid or
/// hashing fails
pub fn hash_password(password: &str, params: &PasswordParams) -> Result<String, PasswordError> {
    // Generate a random salt using OS RNG
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = params
        .argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a hash
///
/// Parameters are read from the hash itself. Comparison is constant-time.
///
/// # Returns
///
/// `Ok(true)` if password matches, `Ok(false)` if it doesn't match
///
/// # Errors
///
/// Returns an error if the stored hash cannot be parsed, lacks a salt or
/// hash output, or verification fails for a reason other than a mismatch
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    if parsed_hash.salt.is_none() || parsed_hash.hash.is_none() {
        return Err(PasswordError::InvalidHash(
            "Digest is missing its salt or hash".to_string(),
        ));
    }

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false), // Wrong password
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

const DUMMY_SECRET: &str = "duotask-dummy-secret";

/// Secret hasher bound to a configured work factor
///
/// Construction hashes a throwaway secret once. That rejects unusable
/// parameters at startup and prepares the digest for
/// [`SecretHasher::verify_dummy`], so no login ever pays for building it.
#[derive(Debug, Clone)]
pub struct SecretHasher {
    params: PasswordParams,
    dummy_digest: Arc<str>,
}

impl SecretHasher {
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if the parameters are invalid
    pub fn new(params: PasswordParams) -> Result<Self, PasswordError> {
        let dummy_digest = hash_password(DUMMY_SECRET, &params)?;

        Ok(Self {
            params,
            dummy_digest: dummy_digest.into(),
        })
    }

    /// Derives a salted digest of `secret`
    pub fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        hash_password(secret, &self.params)
    }

    /// Checks `secret` against a stored digest
    pub fn verify(&self, secret: &str, digest: &str) -> Result<bool, PasswordError> {
        verify_password(secret, digest)
    }

    /// Burns one verification against the throwaway digest
    ///
    /// Called on the unknown-email login path so it costs the same as a
    /// wrong-password attempt.
    pub fn verify_dummy(&self, secret: &str) -> Result<(), PasswordError> {
        verify_password(secret, &self.dummy_digest).map(|_| ())
    }
}
