/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /v1/tasks?from=&to=` - `{ tasks }`, due date ascending
/// - `POST   /v1/tasks` - `{ task }`
/// - `GET    /v1/tasks/:id` - `{ task }`
/// - `PUT    /v1/tasks/:id` - `{ task }`
/// - `DELETE /v1/tasks/:id` - `{ ok: true }`
///
/// A path id that is not a UUID is reported the same as an unknown task.
///
/// # Example
///
/// ```text
/// POST /v1/tasks
/// Authorization: Bearer eyJ...
///
/// {
///   "title": "Groceries",
///   "date": "2025-06-01",
///   "priority": "High",
///   "tags": ["errands"]
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use duotask_shared::{
    auth::authorization::Principal,
    models::task::Task,
    service::{
        tasks::{self, CreateTaskInput, ListTasksQuery, UpdateTaskInput},
        ServiceError,
    },
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct TaskEnvelope {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TaskListEnvelope {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub ok: bool,
}

fn parse_task_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::from(ServiceError::task_not_found()))
}

/// List tasks visible to the caller
///
/// # Errors
///
/// - `422 Unprocessable Entity`: `from` or `to` is not a date
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<TaskListEnvelope>> {
    let (from, to) = query.bounds()?;
    let tasks = tasks::list_tasks(&state.stores, &principal, from, to).await?;
    Ok(Json(TaskListEnvelope { tasks }))
}

/// Create a task owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: Body is not valid JSON for the task shape
/// - `422 Unprocessable Entity`: Missing title or date
pub async fn create_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateTaskInput>, JsonRejection>,
) -> ApiResult<Json<TaskEnvelope>> {
    let Json(input) = payload?;
    let task = tasks::create_task(&state.stores, &principal, input).await?;
    Ok(Json(TaskEnvelope { task }))
}

/// Fetch one task if the caller may see it
pub async fn get_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskEnvelope>> {
    let id = parse_task_id(&id)?;
    let task = tasks::get_task(&state.stores, &principal, id).await?;
    Ok(Json(TaskEnvelope { task }))
}

/// Partially update a task the caller owns
///
/// # Errors
///
/// - `403 Forbidden`: Task belongs to someone else
/// - `404 Not Found`: No such task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskInput>, JsonRejection>,
) -> ApiResult<Json<TaskEnvelope>> {
    let id = parse_task_id(&id)?;
    let Json(input) = payload?;
    let task = tasks::update_task(&state.stores, &principal, id, input).await?;
    Ok(Json(TaskEnvelope { task }))
}

/// Delete a task the caller owns
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let id = parse_task_id(&id)?;
    tasks::delete_task(&state.stores, &principal, id).await?;
    Ok(Json(DeletedResponse { ok: true }))
}
