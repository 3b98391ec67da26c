/// User model and database operations
///
/// This module provides the User model and the PostgreSQL queries backing the
/// identity store. A user belongs to at most one group and may carry a
/// standing invite code that other users consume to join that group.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(320) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     group_id UUID REFERENCES groups(id),
///     invite_code VARCHAR(20) UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Emails are normalized (trimmed, lowercased) before they reach this module,
/// so the plain `UNIQUE` constraint gives case-insensitive uniqueness.
///
/// # Example
///
/// ```no_run
/// use duotask_shared::models::user::{User, NewUser};
/// use duotask_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, NewUser {
///     name: "Alex".to_string(),
///     email: "alex@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "alex@example.com").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, group_id, invite_code, created_at, updated_at";

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. The hash is
/// never serialized; use [`UserProfile`] for anything leaving the process.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, stored normalized (lowercase)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Group this user belongs to, if any
    pub group_id: Option<Uuid>,

    /// Standing invite code, unique among users when present
    pub invite_code: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// New users start with no group and no invite code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name (already trimmed)
    pub name: String,

    /// Normalized email address
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

/// Public view of a user, safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub group_id: Option<Uuid>,
    pub invite_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Minimal member view used when listing a group's members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            group_id: user.group_id,
            invite_code: user.invite_code.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<&User> for MemberSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Normalizes an email address for storage and lookup
///
/// Email identity is case-insensitive, so every write and lookup goes
/// through this function.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Whether the user is currently bound to a group
    pub fn is_grouped(&self) -> bool {
        self.group_id.is_some()
    }

    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: NewUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.password_hash)
            .fetch_one(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by (normalized) email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Finds the user owning an exact invite code
    pub async fn find_by_invite_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE invite_code = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Binds a groupless user to a group
    ///
    /// The update only applies while `group_id IS NULL`, so a concurrent
    /// create/join on the same user cannot overwrite an existing binding.
    ///
    /// # Returns
    ///
    /// True if the user was groupless and is now bound, false otherwise
    pub async fn assign_group(
        pool: &PgPool,
        id: Uuid,
        group_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET group_id = $2, updated_at = NOW()
            WHERE id = $1 AND group_id IS NULL
            "#,
        )
        .bind(id)
        .bind(group_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the user's invite code
    ///
    /// # Returns
    ///
    /// True if the user exists and was updated
    ///
    /// # Errors
    ///
    /// Returns a unique-violation database error if another user already
    /// holds `code`.
    pub async fn set_invite_code(
        pool: &PgPool,
        id: Uuid,
        code: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET invite_code = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(code)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            group_id: None,
            invite_code: Some("ABCdef123456".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Sam@Example.COM "), "sam@example.com");
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "sam@example.com");
    }

    #[test]
    fn test_profile_from_user() {
        let user = sample_user();
        let profile = UserProfile::from(&user);
        assert_eq!(profile.id, user.id);
        assert_eq!(profile.invite_code.as_deref(), Some("ABCdef123456"));
        assert!(!user.is_grouped());
    }
}
