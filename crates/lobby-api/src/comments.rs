use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use lobby_db::models::{CommentOutcome, CommentRow, format_timestamp};
use lobby_types::api::{CommentResponse, CreateCommentRequest};

use crate::auth::AppState;
use crate::blocking::run_db;
use crate::convert::comment_response;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::CurrentUser;

const MAX_HASHTAG_LEN: usize = 64;

/// GET /api/ideas/{idea_id}/comments — oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(idea_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let idea_id = idea_id.to_string();
    let rows = run_db(&state, move |db| {
        if db.get_idea_creator(&idea_id)?.is_none() {
            return Ok(None);
        }
        db.get_comments(&idea_id).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Idea not found"))?;

    let comments: Vec<CommentResponse> = rows.into_iter().map(comment_response).collect();
    Ok(Json(comments))
}

/// POST /api/ideas/{idea_id}/comments
pub async fn post_comment(
    State(state): State<AppState>,
    ApiPath(idea_id): ApiPath<Uuid>,
    Extension(caller): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.body.trim().is_empty() {
        return Err(ApiError::bad_request("body must not be empty"));
    }
    if req.hashtag.chars().count() > MAX_HASHTAG_LEN {
        return Err(ApiError::bad_request("hashtag must be at most 64 characters"));
    }

    let row = CommentRow {
        id: Uuid::new_v4().to_string(),
        idea_id: idea_id.to_string(),
        commentor: caller.username().to_string(),
        body: req.body,
        hashtag: req.hashtag,
        replying_to: req.replying_to.map(|id| id.to_string()),
        created_at: format_timestamp(Utc::now()),
    };

    let (outcome, row) = run_db(&state, move |db| {
        let outcome = db.add_comment(&row)?;
        Ok((outcome, row))
    })
    .await?;

    match outcome {
        CommentOutcome::Added => {}
        CommentOutcome::IdeaNotFound => return Err(ApiError::not_found("Idea not found")),
        CommentOutcome::ParentNotOnIdea => {
            return Err(ApiError::bad_request(
                "replyingTo must reference a comment on the same idea",
            ));
        }
    }

    Ok((StatusCode::CREATED, Json(comment_response(row))))
}
