use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use lobby_db::models::NewIdea;
use lobby_types::api::{CreateIdeaRequest, IdeaResponse, ToggleResponse};
use lobby_types::models::IdeaMark;

use crate::auth::AppState;
use crate::blocking::run_db;
use crate::convert::idea_response;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::CurrentUser;

const MAX_TITLE_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 64;
/// Stake ends are stored as `%Y-%m-%d %H:%M:%S` text and compared as text,
/// which only orders correctly for four-digit years.
const MAX_STAKE_YEAR: i32 = 9999;

/// POST /api/ideas
pub async fn create_idea(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreateIdeaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim().to_string();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::bad_request("title must be 1 to 200 characters"));
    }
    if req.body.trim().is_empty() {
        return Err(ApiError::bad_request("body must not be empty"));
    }
    check_stake_period_end(req.stake_period_end, Utc::now())?;

    let categories = normalize_categories(&req.categories)?;
    for url in &req.image_urls {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ApiError::bad_request(format!("invalid image url: {url}")));
        }
    }

    let idea_id = Uuid::new_v4().to_string();
    let creator = caller.username().to_string();
    let detail = run_db(&state, move |db| {
        db.create_idea(&NewIdea {
            id: &idea_id,
            title: &title,
            body: &req.body,
            creator: &creator,
            stake_period_end: req.stake_period_end,
            categories: &categories,
            image_urls: &req.image_urls,
        })?;
        db.get_idea(&idea_id)
    })
    .await?
    .ok_or_else(|| ApiError::Internal("idea vanished after insert".into()))?;

    Ok((StatusCode::CREATED, Json(idea_response(detail))))
}

/// GET /api/ideas/{idea_id}
pub async fn get_idea(
    State(state): State<AppState>,
    ApiPath(idea_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = run_db(&state, move |db| db.get_idea(&idea_id.to_string()))
        .await?
        .ok_or_else(|| ApiError::not_found("Idea not found"))?;

    Ok(Json(idea_response(detail)))
}

/// GET /api/users/{username}/ideas — newest first.
pub async fn list_user_ideas(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ideas = run_db(&state, move |db| {
        if db.get_user_by_username(&username)?.is_none() {
            return Ok(None);
        }
        db.get_ideas_by_creator(&username).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    let ideas: Vec<IdeaResponse> = ideas.into_iter().map(idea_response).collect();
    Ok(Json(ideas))
}

/// POST /api/ideas/{idea_id}/{support|save|question}
pub async fn toggle_mark(
    State(state): State<AppState>,
    ApiPath((idea_id, mark)): ApiPath<(Uuid, IdeaMark)>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let username = caller.username().to_string();
    let idea_id = idea_id.to_string();

    let added = run_db(&state, move |db| db.toggle_mark(mark, &username, &idea_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Idea not found"))?;

    Ok(Json(ToggleResponse { added }))
}

fn check_stake_period_end(end: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ApiError> {
    if end <= now {
        return Err(ApiError::bad_request("stakePeriodEnd must be in the future"));
    }
    if end.year() > MAX_STAKE_YEAR {
        return Err(ApiError::bad_request("stakePeriodEnd must be before the year 10000"));
    }
    Ok(())
}

/// Trim, drop duplicates (first occurrence wins) and check lengths.
fn normalize_categories(raw: &[String]) -> Result<Vec<String>, ApiError> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_CATEGORY_LEN {
            return Err(ApiError::bad_request("category names must be 1 to 64 characters"));
        }
        if !out.iter().any(|existing| existing == name) {
            out.push(name.to_string());
        }
    }
    Ok(out)
}
