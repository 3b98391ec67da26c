/// PostgreSQL plumbing for the sqlx-backed store
///
/// # Modules
///
/// - `pool`: connection pool construction, health check, shutdown
/// - `migrations`: embedded schema migrations
///
/// Row mapping and queries live next to each model in [`crate::models`];
/// [`crate::store::postgres`] adapts them to the store traits.
///
/// # Example
///
/// ```no_run
/// use duotask_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
/// use duotask_shared::store::Stores;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
///     run_migrations(&pool).await?;
///
///     let stores = Stores::postgres(pool);
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
