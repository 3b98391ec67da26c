/// Relationship endpoints: profile, groups and invite codes
///
/// All routes require a bearer token; the resolved principal arrives via
/// request extensions.
///
/// # Endpoints
///
/// - `GET  /v1/relationships/me` - `{ user }`
/// - `POST /v1/relationships/create-group` - `{ name? }` → `{ group }`
/// - `POST /v1/relationships/invite-code` - `{ code }`
/// - `POST /v1/relationships/join-by-code` - `{ code }` → `{ group }`
/// - `GET  /v1/relationships/my-group` - `{ group: null | { id, name, members } }`

use crate::{app::AppState, error::ApiResult};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use duotask_shared::{
    auth::authorization::Principal,
    models::{group::Group, user::UserProfile},
    service::{
        accounts,
        groups::{self, CreateGroupInput, GroupView, JoinByCodeInput},
    },
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct GroupEnvelope {
    pub group: Group,
}

#[derive(Debug, Serialize)]
pub struct CodeEnvelope {
    pub code: String,
}

/// `group` serializes as `null` for a groupless user
#[derive(Debug, Serialize)]
pub struct MyGroupEnvelope {
    pub group: Option<GroupView>,
}

/// The caller's own profile
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<UserEnvelope>> {
    let user = accounts::fetch_self(&state.stores, &principal).await?;
    Ok(Json(UserEnvelope { user }))
}

/// Create a group with the caller as its only member
///
/// The body is optional; an empty body or one without a usable `name`
/// gets "<name>'s Household". A body that is present must be valid JSON.
///
/// # Errors
///
/// - `400 Bad Request`: Body is present but malformed
/// - `409 Conflict`: Caller already belongs to a group
pub async fn create_group(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> ApiResult<Json<GroupEnvelope>> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        CreateGroupInput::default()
    } else {
        let Json(input) = Json::<CreateGroupInput>::from_bytes(&body)?;
        input
    };
    let group = groups::create_group(&state.stores, &principal, input).await?;
    Ok(Json(GroupEnvelope { group }))
}

/// Issue a fresh invite code, replacing the previous one
///
/// # Errors
///
/// - `400 Bad Request`: Caller has no group yet
pub async fn invite_code(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<CodeEnvelope>> {
    let code = groups::issue_invite_code(&state.stores, &principal).await?;
    Ok(Json(CodeEnvelope { code }))
}

/// Join the inviter's group
///
/// # Errors
///
/// - `404 Not Found`: Unknown code, inviter without a group, or group gone
/// - `409 Conflict`: Caller already belongs to a different group
/// - `422 Unprocessable Entity`: Code length outside 6..=20
pub async fn join_by_code(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<JoinByCodeInput>, JsonRejection>,
) -> ApiResult<Json<GroupEnvelope>> {
    let Json(input) = payload?;
    let group = groups::join_by_code(&state.stores, &principal, input).await?;
    Ok(Json(GroupEnvelope { group }))
}

/// The caller's group with member summaries
pub async fn my_group(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<MyGroupEnvelope>> {
    let group = groups::my_group(&state.stores, &principal).await?;
    Ok(Json(MyGroupEnvelope { group }))
}
