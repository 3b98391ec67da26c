/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use duotask_api::{app::AppState, config::Config};
/// use duotask_shared::db::pool::{create_pool, DatabaseConfig};
/// use duotask_shared::store::Stores;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::new(config.database.url.clone())).await?;
/// let state = AppState::new(Stores::postgres(pool), config)?;
/// let app = duotask_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::Duration;
use duotask_shared::{
    auth::{jwt::TokenCodec, password::SecretHasher},
    service::accounts::Accounts,
    store::Stores,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference-counted internally.
#[derive(Clone)]
pub struct AppState {
    /// User, group and task stores
    pub stores: Stores,

    /// Token codec and secret hasher
    pub accounts: Accounts,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    ///
    /// The token codec and hasher are built from `config.jwt` and
    /// `config.password`.
    ///
    /// # Errors
    ///
    /// Returns an error if the password work factor is unusable
    pub fn new(stores: Stores, config: Config) -> anyhow::Result<Self> {
        let tokens = TokenCodec::new(
            config.jwt.secret.clone(),
            Duration::seconds(config.jwt.ttl_seconds),
        );
        let hasher = SecretHasher::new(config.password)?;

        Ok(Self {
            stores,
            accounts: Accounts::new(tokens, hasher),
            config: Arc::new(config),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                         # Health check (public)
/// └── /v1/
///     ├── /auth/                      # Public
///     │   ├── POST /signup
///     │   └── POST /login
///     ├── /relationships/             # Bearer token required
///     │   ├── GET  /me
///     │   ├── POST /create-group
///     │   ├── POST /invite-code
///     │   ├── POST /join-by-code
///     │   └── GET  /my-group
///     └── /tasks                      # Bearer token required
///         ├── GET    /                # ?from=&to=
///         ├── POST   /
///         ├── GET    /:id
///         ├── PUT    /:id
///         └── DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Principal resolution (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login));

    let relationship_routes = Router::new()
        .route("/me", get(routes::relationships::me))
        .route("/create-group", post(routes::relationships::create_group))
        .route("/invite-code", post(routes::relationships::invite_code))
        .route("/join-by-code", post(routes::relationships::join_by_code))
        .route("/my-group", get(routes::relationships::my_group))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_principal,
        ));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_principal,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/relationships", relationship_routes)
        .nest("/tasks", task_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Bearer authentication middleware
///
/// Resolves the `Authorization` header into a fresh
/// [`Principal`](duotask_shared::auth::authorization::Principal) and inserts
/// it into request extensions. Every failure is the same 401.
async fn require_principal(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let principal = state.accounts.authenticate(&state.stores, header).await?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
