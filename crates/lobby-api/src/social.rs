use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use lobby_db::DbError;
use lobby_types::api::{NotificationResponse, StatusMessage};

use crate::auth::AppState;
use crate::blocking::run_db;
use crate::convert::notification_response;
use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::CurrentUser;

const DEFAULT_NOTIFICATION_LIMIT: u32 = 50;
const MAX_NOTIFICATION_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<u32>,
}

impl NotificationQuery {
    fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
            .min(MAX_NOTIFICATION_LIMIT)
    }
}

// -- Friends --

/// GET /api/friends — usernames, sorted.
pub async fn list_friends(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let username = caller.username().to_string();
    let friends = run_db(&state, move |db| db.get_friends(&username)).await?;
    Ok(Json(friends))
}

/// POST /api/friends/{username}
pub async fn add_friend(
    State(state): State<AppState>,
    ApiPath(friend): ApiPath<String>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let username = caller.username().to_string();
    if friend == username {
        return Err(ApiError::bad_request("cannot befriend yourself"));
    }

    let added = run_db(&state, move |db| match db.add_friend(&username, &friend) {
        Err(DbError::Duplicate(_)) => Ok(Err(ApiError::Conflict("already friends".into()))),
        other => other.map(Ok),
    })
    .await??;
    if !added {
        return Err(ApiError::not_found("User not found"));
    }

    Ok((StatusCode::CREATED, Json(StatusMessage::new("Friend successfully added"))))
}

// -- Notifications --

/// GET /api/notifications?limit=N — newest first, at most 200.
pub async fn list_notifications(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NotificationQuery>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let username = caller.username().to_string();
    let limit = query.effective_limit();

    let rows = run_db(&state, move |db| db.get_notifications(&username, limit)).await?;
    let notifications: Vec<NotificationResponse> =
        rows.into_iter().map(notification_response).collect();
    Ok(Json(notifications))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_limit_defaults_and_caps() {
        assert_eq!(NotificationQuery { limit: None }.effective_limit(), 50);
        assert_eq!(NotificationQuery { limit: Some(5) }.effective_limit(), 5);
        assert_eq!(NotificationQuery { limit: Some(1000) }.effective_limit(), 200);
    }
}
