/// Core operations
///
/// Every operation takes the [`Stores`](crate::store::Stores) handle and, when
/// it acts on behalf of a user, the resolved
/// [`Principal`](crate::auth::authorization::Principal) as explicit arguments.
/// There is no ambient request state.
///
/// # Modules
///
/// - [`accounts`]: signup, login, bearer verification, fetch-self
/// - [`groups`]: create group, issue invite code, join by code, my group
/// - [`tasks`]: create, list, get, update, delete
/// - [`validation`]: structured input validation
/// - [`dates`]: lenient due-date parsing
/// - [`error`]: the [`ServiceError`] taxonomy
///
/// # Example
///
/// ```no_run
/// use duotask_shared::auth::jwt::TokenCodec;
/// use duotask_shared::auth::password::{PasswordParams, SecretHasher};
/// use duotask_shared::service::accounts::{Accounts, SignupInput};
/// use duotask_shared::service::groups::{self, CreateGroupInput};
/// use duotask_shared::store::Stores;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
/// let accounts = Accounts::new(
///     TokenCodec::new("secret-key-at-least-32-bytes-long!", TokenCodec::default_ttl()),
///     SecretHasher::new(PasswordParams::default())?,
/// );
///
/// let signed_up = accounts
///     .register(&stores, SignupInput {
///         name: "Ada".into(),
///         email: "ada@example.com".into(),
///         password: "secret1".into(),
///     })
///     .await?;
///
/// let header = format!("Bearer {}", signed_up.token);
/// let principal = accounts.authenticate(&stores, Some(&header)).await?;
/// let group = groups::create_group(&stores, &principal, CreateGroupInput::default()).await?;
/// assert_eq!(group.members, vec![principal.user_id]);
/// # Ok(())
/// # }
/// ```

pub mod accounts;
pub mod dates;
pub mod error;
pub mod groups;
pub mod tasks;
pub mod validation;

pub use error::{FieldViolation, ServiceError, ServiceResult};
