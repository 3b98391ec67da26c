/// Task model and database operations
///
/// Tasks are dated to-do items owned by exactly one user. A task created by a
/// grouped user is stamped with that user's group at creation time, which is
/// what makes it visible to the other group members. The stamp is a snapshot:
/// it is never re-derived from the owner's current group.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('Not Started', 'In Progress', 'Completed');
/// CREATE TYPE task_priority AS ENUM ('Low', 'Medium', 'High', 'Urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     group_id UUID REFERENCES groups(id),
///     title VARCHAR(500) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     due_date TIMESTAMPTZ NOT NULL,
///     status task_status NOT NULL DEFAULT 'Not Started',
///     priority task_priority NOT NULL DEFAULT 'Low',
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use duotask_shared::models::task::{Task, NewTask, TaskFilter, TaskPriority, TaskStatus};
/// use duotask_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let owner = Uuid::new_v4();
///
/// let task = Task::create(&pool, NewTask {
///     owner_id: owner,
///     group_id: None,
///     title: "Pay rent".to_string(),
///     description: String::new(),
///     due_date: chrono::Utc::now(),
///     status: TaskStatus::NotStarted,
///     priority: TaskPriority::High,
///     tags: vec!["home".to_string()],
/// }).await?;
///
/// let visible = Task::list(&pool, &TaskFilter::visible_to(owner, None)).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, owner_id, group_id, title, description, due_date, status, \
                            priority, tags, created_at, updated_at";

/// Task progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Not Started")]
    #[sqlx(rename = "Not Started")]
    NotStarted,

    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,

    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    #[default]
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Urgent => "Urgent",
        }
    }
}

/// Task model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Creator and sole holder of mutation rights; immutable
    pub owner_id: Uuid,

    /// Owner's group at creation time, if any
    pub group_id: Option<Uuid>,

    pub title: String,

    pub description: String,

    /// Due date
    #[serde(rename = "date")]
    pub due_date: DateTime<Utc>,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// Owner and group are stamped by the service layer, never taken from the
/// client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub owner_id: Uuid,
    pub group_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
}

/// Partial update for a task
///
/// Only `Some` fields are written. There is no owner or group
/// field: neither can change after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub tags: Option<Vec<String>>,
}

impl TaskChanges {
    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
    }

    /// Merges the present fields into `task` and bumps `updated_at`
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref description) = self.description {
            task.description = description.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(ref tags) = self.tags {
            task.tags = tags.clone();
        }
        task.updated_at = Utc::now();
    }
}

/// Listing filter: the owner-or-group union plus optional inclusive due-date bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    /// Tasks owned by this user are included
    pub owner_id: Uuid,

    /// Tasks stamped with this group are included (ignored when None)
    pub group_id: Option<Uuid>,

    /// Inclusive lower bound on due date
    pub from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on due date
    pub to: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// Everything visible to a principal with the given identity and group
    pub fn visible_to(owner_id: Uuid, group_id: Option<Uuid>) -> Self {
        Self {
            owner_id,
            group_id,
            from: None,
            to: None,
        }
    }

    /// Restricts the filter to an inclusive due-date range
    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Evaluates the filter against a single task
    pub fn matches(&self, task: &Task) -> bool {
        let in_scope = task.owner_id == self.owner_id
            || (self.group_id.is_some() && task.group_id == self.group_id);

        in_scope
            && self.from.map_or(true, |from| task.due_date >= from)
            && self.to.map_or(true, |to| task.due_date <= to)
    }
}

/// Sorts tasks for listing: due date ascending, newest creation first on ties
pub fn sort_for_listing(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: NewTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (owner_id, group_id, title, description, due_date, status, priority, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.owner_id)
            .bind(data.group_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.due_date)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.tags)
            .fetch_one(pool)
            .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists tasks matching `filter`, sorted for display
    ///
    /// A NULL `group_id` parameter never matches, so groupless tasks are only
    /// reachable through ownership.
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE (owner_id = $1 OR ($2::uuid IS NOT NULL AND group_id = $2))
              AND ($3::timestamptz IS NULL OR due_date >= $3)
              AND ($4::timestamptz IS NULL OR due_date <= $4)
            ORDER BY due_date ASC, created_at DESC
            "#,
            TASK_COLUMNS
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(filter.owner_id)
            .bind(filter.group_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Applies a partial update
    ///
    /// Only `Some` fields in `data` are written; `updated_at` is always bumped.
    ///
    /// # Returns
    ///
    /// The updated task, or None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.tags.is_some() {
            bind_count += 1;
            query.push_str(&format!(", tags = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", TASK_COLUMNS));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a task by ID
    ///
    /// # Returns
    ///
    /// True if the task was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
