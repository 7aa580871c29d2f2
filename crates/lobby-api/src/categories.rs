use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use lobby_types::api::{CreateCategoryRequest, StatusMessage};

use crate::auth::AppState;
use crate::blocking::run_db;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;

/// GET /api/categories — alphabetical.
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let names = run_db(&state, |db| db.get_categories()).await?;
    Ok(Json(names))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    Extension(_caller): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() || name.chars().count() > 64 {
        return Err(ApiError::bad_request("category name must be 1 to 64 characters"));
    }

    run_db(&state, move |db| db.create_category(&name))
        .await
        .map_err(|e| match e {
            ApiError::Conflict(_) => ApiError::Conflict("category already exists".into()),
            other => other,
        })?;

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::new("Category successfully added")),
    ))
}
