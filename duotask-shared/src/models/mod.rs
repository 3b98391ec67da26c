/// Database models for duotask
///
/// This module contains the domain records and their PostgreSQL queries.
/// Services never call these queries directly; they go through the store
/// traits in [`crate::store`], which have both a PostgreSQL and an
/// in-memory backend.
///
/// # Models
///
/// - `user`: User accounts, group binding and invite codes
/// - `group`: Groups and their ordered, duplicate-free member lists
/// - `task`: Dated tasks with owner and group-at-creation stamp
///
/// # Example
///
/// ```no_run
/// use duotask_shared::models::user::{User, NewUser};
/// use duotask_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = NewUser {
///     name: "Alex".to_string(),
///     email: "alex@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod group;
pub mod task;
pub mod user;
