/// Authentication and authorization utilities
///
/// This module provides the security primitives used by the service layer:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing with a tunable work factor
/// - [`jwt`]: Session token (JWT) issuance and verification
/// - [`invite_code`]: Invite code generation and format checks
/// - [`authorization`]: The principal type and the task/group access policy
///
/// # Example
///
/// ```no_run
/// use duotask_shared::auth::jwt::TokenCodec;
/// use duotask_shared::auth::password::{PasswordParams, SecretHasher};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = SecretHasher::new(PasswordParams::default())?;
/// let hash = hasher.hash("user_password")?;
/// assert!(hasher.verify("user_password", &hash)?);
///
/// let codec = TokenCodec::new("secret-key", TokenCodec::default_ttl());
/// let token = codec.issue(Uuid::new_v4())?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod invite_code;
pub mod jwt;
pub mod password;
