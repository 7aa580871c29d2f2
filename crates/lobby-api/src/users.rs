use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use lobby_types::api::{StatusMessage, WalletQuery};

use crate::auth::AppState;
use crate::blocking::run_db;
use crate::convert::profile_from_row;
use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::CurrentUser;

/// GET / — liveness.
pub async fn root() -> Json<StatusMessage> {
    Json(StatusMessage::new("Hello World"))
}

/// GET /users/me
pub async fn me(Extension(user): Extension<CurrentUser>) -> impl IntoResponse {
    Json(user.0)
}

/// DELETE /users/me — removes the account and everything it owns.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let username = user.username().to_string();
    let deleted = run_db(&state, move |db| db.delete_user(&username)).await?;
    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }

    info!("Deleted user {}", user.username());
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/{username}
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(profile_from_row(&user)))
}

/// PUT /api/users/{username}/metamask?metamaskID=...
pub async fn set_wallet(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
    ApiQuery(query): ApiQuery<WalletQuery>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet_id = query.metamask_id.trim().to_string();
    if wallet_id.is_empty() {
        return Err(ApiError::bad_request("metamaskID must not be empty"));
    }

    let lookup = username.clone();
    if run_db(&state, move |db| db.get_user_by_username(&lookup)).await?.is_none() {
        return Err(ApiError::bad_request("Username does not exist"));
    }
    if caller.username() != username {
        return Err(ApiError::Forbidden("cannot change another user's wallet".into()));
    }

    let updated = run_db(&state, move |db| db.set_wallet_id(&username, &wallet_id)).await?;
    if !updated {
        return Err(ApiError::bad_request("Username does not exist"));
    }

    Ok(Json(StatusMessage::new("User successfully updated")))
}
