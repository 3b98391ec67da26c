/// Group-join protocol
///
/// Each user is either *groupless* or *grouped*. The only transition that
/// exists is groupless → grouped, reached by creating a group or by joining
/// one with an invite code.
///
/// | Operation           | From       | Result                                  |
/// |---------------------|------------|-----------------------------------------|
/// | `create_group`      | groupless  | new group, founder is the sole member   |
/// | `create_group`      | grouped    | `Conflict`                              |
/// | `issue_invite_code` | grouped    | fresh code replaces any previous one    |
/// | `issue_invite_code` | groupless  | `GroupRequired`                         |
/// | `join_by_code`      | groupless  | joined; member appended exactly once    |
/// | `join_by_code`      | same group | no-op success                           |
/// | `join_by_code`      | other group| `Conflict`                              |
///
/// The two writes involved (user's group reference, group's member set) are
/// each a single atomic store primitive: a conditional null→set update and an
/// add-to-set. Concurrent joins therefore never duplicate a member, and a
/// user racing `create_group` against `join_by_code` ends up in exactly one
/// group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::accounts::current_user;
use super::error::{ServiceError, ServiceResult};
use super::validation::validate_input;
use crate::auth::authorization::{require_group, Principal};
use crate::auth::invite_code::generate_invite_code;
use crate::models::group::{Group, NewGroup};
use crate::models::user::MemberSummary;
use crate::store::{StoreError, Stores};

/// How many fresh codes to try before giving up on a collision streak
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Create-group request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateGroupInput {
    /// Blank or missing means "<name>'s Household"
    #[serde(default)]
    #[validate(length(max = 100, message = "Group name must be at most 100 characters"))]
    pub name: Option<String>,
}

/// Join-by-code request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JoinByCodeInput {
    #[serde(default)]
    #[validate(length(min = 6, max = 20, message = "Code must be 6 to 20 characters"))]
    pub code: String,
}

/// A group with its members resolved to public summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub id: Uuid,
    pub name: String,
    pub members: Vec<MemberSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn already_grouped() -> ServiceError {
    ServiceError::Conflict("Already in a group".to_string())
}

/// Creates a group whose only member is the principal
pub async fn create_group(stores: &Stores, principal: &Principal, input: CreateGroupInput) -> ServiceResult<Group> {
    validate_input(&input)?;

    let user = current_user(stores, principal).await?;
    if user.is_grouped() {
        debug!(user_id = %user.id, "Create group rejected: already grouped");
        return Err(already_grouped());
    }

    let name = input
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}'s Household", user.name));

    let group = stores
        .groups
        .create(NewGroup {
            name,
            founder: user.id,
        })
        .await?;

    if !stores.users.assign_group(user.id, group.id).await? {
        // Lost a race against another create or join for this user
        warn!(user_id = %user.id, group_id = %group.id, "Group created but user was grouped meanwhile; group left orphaned");
        return Err(already_grouped());
    }

    info!(user_id = %user.id, group_id = %group.id, "Group created");
    Ok(group)
}

/// Generates and stores a fresh invite code for the principal
///
/// Replaces any previous code. A collision with another user's live code is
/// retried with a new code up to [`MAX_CODE_ATTEMPTS`] times.
pub async fn issue_invite_code(stores: &Stores, principal: &Principal) -> ServiceResult<String> {
    let group_id = require_group(principal)?;

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = generate_invite_code();

        match stores.users.set_invite_code(principal.user_id, &code).await {
            Ok(()) => {
                info!(user_id = %principal.user_id, group_id = %group_id, "Invite code issued");
                return Ok(code);
            }
            Err(StoreError::Conflict(_)) => {
                warn!(attempt, "Invite code collision, regenerating");
            }
            Err(StoreError::NotFound) => return Err(ServiceError::Unauthenticated),
            Err(e) => return Err(e.into()),
        }
    }

    Err(ServiceError::Storage(format!(
        "No unique invite code after {} attempts",
        MAX_CODE_ATTEMPTS
    )))
}

/// Joins the group of whoever owns `input.code`
///
/// # Errors
///
/// - `ValidationFailed`: code shorter than 6 or longer than 20 characters
/// - `InvalidCode`: nobody holds the code, or its holder has no group
/// - `ResourceNotFound`: the holder's group record is missing
/// - `Conflict`: the principal already belongs to a different group
///
/// Nothing is written before all of the above have been ruled out.
pub async fn join_by_code(stores: &Stores, principal: &Principal, input: JoinByCodeInput) -> ServiceResult<Group> {
    validate_input(&input)?;

    let inviter = stores
        .users
        .find_by_invite_code(&input.code)
        .await?
        .ok_or(ServiceError::InvalidCode)?;
    let group_id = inviter.group_id.ok_or(ServiceError::InvalidCode)?;

    let group = stores
        .groups
        .find_by_id(group_id)
        .await?
        .ok_or_else(ServiceError::group_not_found)?;

    let user = current_user(stores, principal).await?;
    match user.group_id {
        Some(current) if current == group.id => {
            debug!(user_id = %user.id, group_id = %group.id, "Already in this group");
        }
        Some(_) => {
            debug!(user_id = %user.id, "Join rejected: in another group");
            return Err(ServiceError::Conflict("Already in a different group".to_string()));
        }
        None => {
            if !stores.users.assign_group(user.id, group.id).await? {
                // Someone else set our group between the read and the write
                let user = current_user(stores, principal).await?;
                if user.group_id != Some(group.id) {
                    return Err(ServiceError::Conflict("Already in a different group".to_string()));
                }
            }
        }
    }

    let group = stores
        .groups
        .add_member(group.id, user.id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ServiceError::group_not_found(),
            other => other.into(),
        })?;

    info!(user_id = %user.id, group_id = %group.id, members = group.members.len(), "Joined group");
    Ok(group)
}

/// The principal's group with member summaries, or `None` if groupless
///
/// Members whose user record has disappeared are skipped.
pub async fn my_group(stores: &Stores, principal: &Principal) -> ServiceResult<Option<GroupView>> {
    let Some(group_id) = principal.group_id else {
        return Ok(None);
    };

    let Some(group) = stores.groups.find_by_id(group_id).await? else {
        warn!(group_id = %group_id, "User references a missing group");
        return Ok(None);
    };

    let mut members = Vec::with_capacity(group.members.len());
    for member_id in &group.members {
        if let Some(member) = stores.users.find_by_id(*member_id).await? {
            members.push(MemberSummary::from(&member));
        }
    }

    Ok(Some(GroupView {
        id: group.id,
        name: group.name,
        members,
        created_at: group.created_at,
        updated_at: group.updated_at,
    }))
}
