/// Access-control policy for tasks and groups
///
/// Pure decision functions: given the resolved [`Principal`] and a record,
/// decide what the principal may do. Nothing here touches storage.
///
/// # Permission Model
///
/// 1. **View**: the owner, or any principal whose current group equals the
///    task's stamped group. A task with no group is visible to its owner only;
///    two groupless principals never match each other through a null group.
/// 2. **Mutate** (update/delete): the owner only. Group peers can read each
///    other's tasks but never change them.
/// 3. **Group actions**: issuing an invite code needs a group.
///
/// # Example
///
/// ```no_run
/// use duotask_shared::auth::authorization::{require_ownership, Principal};
/// use duotask_shared::models::task::Task;
///
/// fn check(principal: &Principal, task: &Task) -> Result<(), Box<dyn std::error::Error>> {
///     require_ownership(principal, task)?;
///     Ok(())
/// }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::task::Task;
use crate::models::user::User;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Principal does not own the task
    #[error("Not the owner of this task")]
    NotOwner,

    /// Principal may not see the task at all
    #[error("Task not visible")]
    NotVisible,

    /// Action needs group membership first
    #[error("Create or join a group first")]
    GroupRequired,
}

/// The authenticated identity performing an operation
///
/// Resolved fresh from the identity store on every request and passed
/// explicitly into each service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,

    /// Current group, as of resolution
    pub group_id: Option<Uuid>,
}

impl Principal {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            group_id: user.group_id,
        }
    }

    pub fn owns(&self, task: &Task) -> bool {
        task.owner_id == self.user_id
    }

    /// Whether the principal shares a (non-null) group with the task
    pub fn shares_group_with(&self, task: &Task) -> bool {
        matches!((self.group_id, task.group_id), (Some(mine), Some(theirs)) if mine == theirs)
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal::from_user(user)
    }
}

/// Whether `principal` may see `task`
pub fn can_view(principal: &Principal, task: &Task) -> bool {
    principal.owns(task) || principal.shares_group_with(task)
}

/// Whether `principal` may update or delete `task`
pub fn can_mutate(principal: &Principal, task: &Task) -> bool {
    principal.owns(task)
}

/// Requires view rights
pub fn require_visibility(principal: &Principal, task: &Task) -> Result<(), AuthzError> {
    if !can_view(principal, task) {
        return Err(AuthzError::NotVisible);
    }

    Ok(())
}

/// Requires mutation rights
///
/// Group membership grants nothing here: a peer and a stranger both get
/// `NotOwner`.
pub fn require_ownership(principal: &Principal, task: &Task) -> Result<(), AuthzError> {
    if !can_mutate(principal, task) {
        return Err(AuthzError::NotOwner);
    }

    Ok(())
}

/// Requires a group and returns its ID
pub fn require_group(principal: &Principal) -> Result<Uuid, AuthzError> {
    principal.group_id.ok_or(AuthzError::GroupRequired)
}
