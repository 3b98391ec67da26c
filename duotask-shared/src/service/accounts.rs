/// Credential issuance and identity verification
///
/// [`Accounts`] bundles the session token codec and the secret hasher. It
/// handles signup and login (both answer with a token plus the public
/// profile) and resolves bearer credentials into a [`Principal`].
///
/// # Failure uniformity
///
/// - Login: unknown email and wrong password both yield
///   [`ServiceError::InvalidCredentials`], and both run one hash verification.
/// - Authentication: missing header, wrong scheme, bad signature, expiry and
///   a subject that no longer exists all yield
///   [`ServiceError::Unauthenticated`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use super::error::{ServiceError, ServiceResult};
use super::validation::{check_not_blank, validate_input, validate_with};
use crate::auth::authorization::Principal;
use crate::auth::jwt::TokenCodec;
use crate::auth::password::{PasswordError, SecretHasher};
use crate::models::user::{normalize_email, NewUser, User, UserProfile};
use crate::store::{StoreError, Stores};

/// Signup request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupInput {
    /// Display name
    #[serde(default)]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,

    /// Email address
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Signup/login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Session token (HS256 JWT)
    pub token: String,

    pub user: UserProfile,
}

/// Extracts the token from an `Authorization` header value
///
/// Only the `Bearer` scheme is accepted; an empty token is rejected.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Token codec plus secret hasher
#[derive(Debug, Clone)]
pub struct Accounts {
    tokens: TokenCodec,
    hasher: SecretHasher,
}

impl Accounts {
    pub fn new(tokens: TokenCodec, hasher: SecretHasher) -> Self {
        Self { tokens, hasher }
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    /// Creates an account and signs it in
    ///
    /// # Errors
    ///
    /// - `ValidationFailed`: blank name, malformed email, short password
    /// - `Conflict`: email already registered (any casing)
    pub async fn register(&self, stores: &Stores, input: SignupInput) -> ServiceResult<AuthResponse> {
        validate_with(&input, [check_not_blank("name", &input.name, "Name is required")])?;

        let email = normalize_email(&input.email);
        if stores.users.find_by_email(&email).await?.is_some() {
            debug!(email = %email, "Signup rejected: email in use");
            return Err(email_in_use());
        }

        let hasher = self.hasher.clone();
        let password = input.password;
        let password_hash = off_runtime(move || hasher.hash(&password)).await?;

        // A concurrent signup can still win the unique index
        let user = stores
            .users
            .create(NewUser {
                name: input.name.trim().to_string(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => email_in_use(),
                other => other.into(),
            })?;

        info!(user_id = %user.id, "User registered");
        self.respond(&user)
    }

    /// Signs in with email and password
    pub async fn login(&self, stores: &Stores, input: LoginInput) -> ServiceResult<AuthResponse> {
        validate_input(&input)?;

        let hasher = self.hasher.clone();
        let password = input.password;

        let user = match stores.users.find_by_email(&input.email).await? {
            Some(user) => user,
            None => {
                off_runtime(move || hasher.verify_dummy(&password)).await?;
                debug!("Login rejected: unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let digest = user.password_hash.clone();
        if !off_runtime(move || hasher.verify(&password, &digest)).await? {
            debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        self.respond(&user)
    }

    /// Resolves an `Authorization` header value into a principal
    ///
    /// Read-only. The principal reflects the user's group as of this call.
    pub async fn authenticate(&self, stores: &Stores, authorization: Option<&str>) -> ServiceResult<Principal> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(ServiceError::Unauthenticated)?;

        let user_id = self.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "Token rejected");
            ServiceError::from(e)
        })?;

        match stores.users.find_by_id(user_id).await? {
            Some(user) => Ok(Principal::from_user(&user)),
            None => {
                debug!(user_id = %user_id, "Token subject no longer exists");
                Err(ServiceError::Unauthenticated)
            }
        }
    }

    fn respond(&self, user: &User) -> ServiceResult<AuthResponse> {
        Ok(AuthResponse {
            token: self.tokens.issue(user.id).map_err(|e| ServiceError::Storage(e.to_string()))?,
            user: UserProfile::from(user),
        })
    }
}

/// Runs an argon2 computation on the blocking pool
async fn off_runtime<T, F>(work: F) -> ServiceResult<T>
where
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Storage(format!("Hashing task failed: {}", e)))?
        .map_err(Into::into)
}

fn email_in_use() -> ServiceError {
    ServiceError::Conflict("Email already in use".to_string())
}

/// Fresh read of the principal's own record
pub(crate) async fn current_user(stores: &Stores, principal: &Principal) -> ServiceResult<User> {
    stores
        .users
        .find_by_id(principal.user_id)
        .await?
        .ok_or(ServiceError::Unauthenticated)
}

/// The principal's public profile (no credential hash)
pub async fn fetch_self(stores: &Stores, principal: &Principal) -> ServiceResult<UserProfile> {
    current_user(stores, principal).await.map(|user| UserProfile::from(&user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn test_signup_input_defaults_missing_fields() {
        let input: SignupInput = serde_json::from_str(r#"{"email":"a@example.com"}"#).unwrap();
        assert_eq!(input.name, "");
        assert_eq!(input.password, "");
        assert!(input.validate().is_err());
    }
}
