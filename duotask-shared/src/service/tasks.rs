/// Task operations under the access policy
///
/// - Create stamps owner = principal and group = principal's current group.
/// - List returns the owner-or-group union, optionally bounded by due date.
/// - Get applies the visibility rule; an invisible task reports not-found.
/// - Update and delete are owner-only. A task that exists but belongs to
///   someone else reports `Forbidden`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::dates::{deserialize_opt, parse_datetime};
use super::error::{FieldViolation, ServiceError, ServiceResult};
use super::validation::{check_not_blank, validate_with};
use crate::auth::authorization::{require_ownership, require_visibility, Principal};
use crate::models::task::{NewTask, Task, TaskChanges, TaskFilter, TaskPriority, TaskStatus};
use crate::store::{StoreError, Stores};

/// Create-task request
///
/// Omitted optional fields take their defaults: status Not Started, priority
/// Low, no tags, empty description.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateTaskInput {
    #[serde(default)]
    #[validate(length(max = 500, message = "Title must be at most 500 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Due date; required
    #[serde(default, deserialize_with = "deserialize_opt")]
    pub date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// Update-task request
///
/// Only present fields are applied. Unknown fields, including any attempt to
/// set an owner, are ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTaskInput {
    #[validate(length(max = 500, message = "Title must be at most 500 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[serde(default, deserialize_with = "deserialize_opt")]
    pub date: Option<DateTime<Utc>>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub tags: Option<Vec<String>>,
}

impl UpdateTaskInput {
    fn into_changes(self) -> TaskChanges {
        TaskChanges {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            due_date: self.date,
            status: self.status,
            priority: self.priority,
            tags: self.tags,
        }
    }
}

/// Raw listing bounds as they arrive in a query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ListTasksQuery {
    /// Parses both bounds; empty strings count as absent
    pub fn bounds(&self) -> ServiceResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let mut violations = Vec::new();
        let mut parse = |field: &str, raw: &Option<String>| match raw.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = parse_datetime(raw);
                if parsed.is_none() {
                    violations.push(FieldViolation::new(field, "Invalid date"));
                }
                parsed
            }
        };

        let from = parse("from", &self.from);
        let to = parse("to", &self.to);

        if violations.is_empty() {
            Ok((from, to))
        } else {
            Err(ServiceError::ValidationFailed(violations))
        }
    }
}

fn title_violation(title: &str) -> Option<FieldViolation> {
    check_not_blank("title", title, "Title is required")
}

/// Creates a task owned by the principal
pub async fn create_task(stores: &Stores, principal: &Principal, input: CreateTaskInput) -> ServiceResult<Task> {
    let missing_date = input
        .date
        .is_none()
        .then(|| FieldViolation::new("date", "Date is required"));
    validate_with(&input, [title_violation(&input.title), missing_date])?;

    let due_date = input
        .date
        .ok_or_else(|| ServiceError::invalid("date", "Date is required"))?;

    let task = stores
        .tasks
        .create(NewTask {
            owner_id: principal.user_id,
            group_id: principal.group_id,
            title: input.title.trim().to_string(),
            description: input.description,
            due_date,
            status: input.status,
            priority: input.priority,
            tags: input.tags,
        })
        .await?;

    info!(task_id = %task.id, owner_id = %task.owner_id, group_id = ?task.group_id, "Task created");
    Ok(task)
}

/// Every task visible to the principal within the inclusive range
pub async fn list_tasks(
    stores: &Stores,
    principal: &Principal,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> ServiceResult<Vec<Task>> {
    let filter = TaskFilter::visible_to(principal.user_id, principal.group_id).between(from, to);
    Ok(stores.tasks.find(&filter).await?)
}

async fn load(stores: &Stores, id: Uuid) -> ServiceResult<Task> {
    stores
        .tasks
        .find_by_id(id)
        .await?
        .ok_or_else(ServiceError::task_not_found)
}

/// A single task, if visible to the principal
pub async fn get_task(stores: &Stores, principal: &Principal, id: Uuid) -> ServiceResult<Task> {
    let task = load(stores, id).await?;
    require_visibility(principal, &task)?;
    Ok(task)
}

/// Applies a partial update to a task the principal owns
pub async fn update_task(
    stores: &Stores,
    principal: &Principal,
    id: Uuid,
    input: UpdateTaskInput,
) -> ServiceResult<Task> {
    let task = load(stores, id).await?;
    if let Err(e) = require_ownership(principal, &task) {
        debug!(task_id = %id, user_id = %principal.user_id, "Update denied");
        return Err(e.into());
    }

    validate_with(&input, [input.title.as_deref().and_then(title_violation)])?;

    let changes = input.into_changes();
    if changes.is_empty() {
        return Ok(task);
    }

    let task = stores.tasks.update(id, changes).await.map_err(not_found_as_task)?;

    info!(task_id = %task.id, "Task updated");
    Ok(task)
}

/// Deletes a task the principal owns
pub async fn delete_task(stores: &Stores, principal: &Principal, id: Uuid) -> ServiceResult<()> {
    let task = load(stores, id).await?;
    if let Err(e) = require_ownership(principal, &task) {
        debug!(task_id = %id, user_id = %principal.user_id, "Delete denied");
        return Err(e.into());
    }

    if !stores.tasks.delete(id).await? {
        return Err(ServiceError::task_not_found());
    }

    info!(task_id = %id, "Task deleted");
    Ok(())
}

fn not_found_as_task(err: StoreError) -> ServiceError {
    match err {
        StoreError::NotFound => ServiceError::task_not_found(),
        other => other.into(),
    }
}
