/// PostgreSQL store backend
///
/// Thin adapter from the store traits onto the model queries in
/// [`crate::models`]. Every trait method is a single statement (or one
/// transaction for group creation); consistency between a user row and a
/// group row is the service layer's concern.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{GroupStore, StoreError, StoreResult, TaskStore, UserStore};
use crate::models::group::{Group, NewGroup};
use crate::models::task::{NewTask, Task, TaskChanges, TaskFilter};
use crate::models::user::{NewUser, User};

/// Store backed by a sqlx PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_by_invite_code(&self, code: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_invite_code(&self.pool, code).await?)
    }

    async fn create(&self, data: NewUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn assign_group(&self, user_id: Uuid, group_id: Uuid) -> StoreResult<bool> {
        if User::assign_group(&self.pool, user_id, group_id).await? {
            return Ok(true);
        }

        // Distinguish "already grouped" from "no such user"
        match User::find_by_id(&self.pool, user_id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound),
        }
    }

    async fn set_invite_code(&self, user_id: Uuid, code: &str) -> StoreResult<()> {
        if User::set_invite_code(&self.pool, user_id, code).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}

#[async_trait]
impl GroupStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Group>> {
        Ok(Group::find_by_id(&self.pool, id).await?)
    }

    async fn create(&self, data: NewGroup) -> StoreResult<Group> {
        Ok(Group::create(&self.pool, data).await?)
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<Group> {
        Group::add_member(&self.pool, group_id, user_id)
            .await?
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn find(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        Ok(Task::list(&self.pool, filter).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn create(&self, data: NewTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn update(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Task> {
        Task::update(&self.pool, id, changes)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}
