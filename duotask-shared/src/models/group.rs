/// Group model and database operations
///
/// A group is a small set of users (typically two) who can see each other's
/// tasks. Groups are created by a groupless user and grow when another user
/// consumes an invite code. Groups are never deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE groups (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE group_members (
///     group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     position BIGSERIAL NOT NULL,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (group_id, user_id)
/// );
/// ```
///
/// The composite primary key on `group_members` is what keeps the member
/// list free of duplicates; `position` preserves join order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Group model with its ordered member list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique group ID
    pub id: Uuid,

    /// Display name (e.g. "Home")
    pub name: String,

    /// Member user IDs in join order, never containing duplicates
    pub members: Vec<Uuid>,

    /// When the group was created
    pub created_at: DateTime<Utc>,

    /// When the membership list last changed
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
    /// Group name (already trimmed, non-empty)
    pub name: String,

    /// User creating the group; becomes its sole member
    pub founder: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRow {
    fn with_members(self, members: Vec<Uuid>) -> Group {
        Group {
            id: self.id,
            name: self.name,
            members,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Group {
    /// Whether `user_id` is in the member list
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }

    /// Appends `user_id` unless already present
    ///
    /// # Returns
    ///
    /// True if the member list changed
    pub fn push_member(&mut self, user_id: Uuid) -> bool {
        if self.has_member(user_id) {
            return false;
        }
        self.members.push(user_id);
        self.updated_at = Utc::now();
        true
    }

    /// Creates a group with the founder as its only member
    ///
    /// Both rows are written in one transaction.
    pub async fn create(pool: &PgPool, data: NewGroup) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            INSERT INTO groups (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES ($1, $2)")
            .bind(row.id)
            .bind(data.founder)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.with_members(vec![data.founder]))
    }

    /// Finds a group by ID, loading its members in join order
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let members = Self::list_members(pool, id).await?;
        Ok(Some(row.with_members(members)))
    }

    /// Adds a member with add-to-set semantics
    ///
    /// A single `INSERT ... ON CONFLICT DO NOTHING` against the composite
    /// primary key, so concurrent joins can never produce a duplicate.
    ///
    /// # Returns
    ///
    /// The group after the insert, or None if the group does not exist
    pub async fn add_member(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id)
            SELECT id, $2 FROM groups WHERE id = $1
            ON CONFLICT (group_id, user_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        if inserted.rows_affected() > 0 {
            sqlx::query("UPDATE groups SET updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;
        }

        Self::find_by_id(pool, id).await
    }

    async fn list_members(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM group_members
            WHERE group_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }
}
