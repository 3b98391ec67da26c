/// In-memory store backend
///
/// Each collection sits behind its own `RwLock`. Every trait method takes the
/// lock once, so the conditional operations (`assign_group`, `add_member`,
/// unique-key checks) are atomic exactly like their SQL counterparts.
///
/// Used by the test suites and for running the API without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{GroupStore, StoreError, StoreResult, TaskStore, UserStore};
use crate::models::group::{Group, NewGroup};
use crate::models::task::{sort_for_listing, NewTask, Task, TaskChanges, TaskFilter};
use crate::models::user::{normalize_email, NewUser, User};

/// Store holding all records in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    groups: RwLock<HashMap<Uuid, Group>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_invite_code(&self, code: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.invite_code.as_deref() == Some(code))
            .cloned())
    }

    async fn create(&self, data: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let email = normalize_email(&data.email);

        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email,
            password_hash: data.password_hash,
            group_id: None,
            invite_code: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn assign_group(&self, user_id: Uuid, group_id: Uuid) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or(StoreError::NotFound)?;

        if user.group_id.is_some() {
            return Ok(false);
        }

        user.group_id = Some(group_id);
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_invite_code(&self, user_id: Uuid, code: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;

        let taken = users
            .values()
            .any(|u| u.id != user_id && u.invite_code.as_deref() == Some(code));
        if taken {
            return Err(StoreError::Conflict("users_invite_code_key".to_string()));
        }

        let user = users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        user.invite_code = Some(code.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Group>> {
        Ok(self.groups.read().await.get(&id).cloned())
    }

    async fn create(&self, data: NewGroup) -> StoreResult<Group> {
        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4(),
            name: data.name,
            members: vec![data.founder],
            created_at: now,
            updated_at: now,
        };
        self.groups.write().await.insert(group.id, group.clone());

        Ok(group)
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<Group> {
        let mut groups = self.groups.write().await;
        let group = groups.get_mut(&group_id).ok_or(StoreError::NotFound)?;
        group.push_member(user_id);
        Ok(group.clone())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn find(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        sort_for_listing(&mut matching);

        Ok(matching)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn create(&self, data: NewTask) -> StoreResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            group_id: data.group_id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            status: data.status,
            priority: data.priority,
            tags: data.tags,
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().await.insert(task.id, task.clone());

        Ok(task)
    }

    async fn update(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(StoreError::NotFound)?;
        changes.apply_to(task);
        Ok(task.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }
}
