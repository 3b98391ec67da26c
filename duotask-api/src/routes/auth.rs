/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Create an account and get a session token
/// - `POST /v1/auth/login` - Exchange email and password for a session token
///
/// Both answer with:
///
/// ```json
/// {
///   "token": "eyJ...",
///   "user": { "id": "uuid", "name": "Alice", "email": "alice@example.com", "group_id": null }
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use duotask_shared::service::accounts::{AuthResponse, LoginInput, SignupInput};

/// Create a new account
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Blank name, invalid email, short password
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupInput>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(input) = payload?;
    Ok(Json(state.accounts.register(&state.stores, input).await?))
}

/// Sign in with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (indistinguishable)
/// - `422 Unprocessable Entity`: Malformed input
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(input) = payload?;
    Ok(Json(state.accounts.login(&state.stores, input).await?))
}
