/// Storage contracts consumed by the service layer
///
/// The identity, group and task stores are async traits so the same service
/// code runs against PostgreSQL in production and an in-memory backend in
/// tests and local development.
///
/// # Backends
///
/// - [`postgres::PgStore`]: sqlx-backed, one pool shared by all three stores
/// - [`memory::MemoryStore`]: lock-protected maps, no persistence
///
/// A [`Stores`] handle bundles the three stores. It is constructed once and
/// passed explicitly to every service call; there is no global connection.
///
/// # Example
///
/// ```
/// use duotask_shared::store::Stores;
///
/// let stores = Stores::in_memory();
/// let cloned = stores.clone(); // cheap: Arc handles
/// ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::group::{Group, NewGroup};
use crate::models::task::{NewTask, Task, TaskChanges, TaskFilter};
use crate::models::user::{NewUser, User};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Referenced record does not exist
    #[error("Record not found")]
    NotFound,

    /// A uniqueness constraint rejected the write
    #[error("Conflict on {0}")]
    Conflict(String),

    /// Connectivity or any other backend fault
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                StoreError::Conflict(constraint.to_string())
            }
            other => StoreError::Storage(other.to_string()),
        }
    }
}

/// Identity store
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Lookup by email; callers pass any casing
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_invite_code(&self, code: &str) -> StoreResult<Option<User>>;

    /// Inserts a user; `Conflict` if the email is taken
    async fn create(&self, data: NewUser) -> StoreResult<User>;

    /// Sets the user's group only if it is currently unset
    ///
    /// Returns whether the assignment applied. `NotFound` if the user is gone.
    async fn assign_group(&self, user_id: Uuid, group_id: Uuid) -> StoreResult<bool>;

    /// Replaces the user's invite code; `Conflict` if another user holds it
    async fn set_invite_code(&self, user_id: Uuid, code: &str) -> StoreResult<()>;
}

/// Group store
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Group>>;

    /// Creates a group whose only member is the founder
    async fn create(&self, data: NewGroup) -> StoreResult<Group>;

    /// Atomic add-to-set on the member list; `NotFound` if the group is gone
    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<Group>;
}

/// Task store
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks matching `filter`, due date ascending then newest first
    async fn find(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn create(&self, data: NewTask) -> StoreResult<Task>;

    /// Partial merge of `changes`; `NotFound` if the task is gone
    async fn update(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Task>;

    /// Returns whether a task was deleted
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Handle bundling the three stores
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub groups: Arc<dyn GroupStore>,
    pub tasks: Arc<dyn TaskStore>,
    pool: Option<PgPool>,
}

impl Stores {
    /// All three stores backed by one PostgreSQL pool
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool.clone()));
        Self {
            users: store.clone(),
            groups: store.clone(),
            tasks: store,
            pool: Some(pool),
        }
    }

    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self {
            users: store.clone(),
            groups: store.clone(),
            tasks: store,
            pool: None,
        }
    }

    /// Name of the active backend, for health reporting
    pub fn backend(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Verifies the backend is reachable
    pub async fn health_check(&self) -> StoreResult<()> {
        match self.pool {
            Some(ref pool) => crate::db::pool::health_check(pool).await.map_err(Into::into),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("backend", &self.backend())
            .finish()
    }
}
