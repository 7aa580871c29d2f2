use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use lobby_types::api::UserProfile;

use crate::auth::AppState;
use crate::blocking::run_db;
use crate::convert::profile_from_row;
use crate::error::ApiError;
use crate::token;

/// The authenticated caller, inserted as a request extension by `require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

impl CurrentUser {
    pub fn username(&self) -> &str {
        &self.0.username
    }
}

/// Validate the bearer token and resolve its subject to a live user row.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(ApiError::invalid_token)?;

    let claims = token::decode_token(&state.jwt_secret, token).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        ApiError::invalid_token()
    })?;

    let username = claims.sub;
    let user = run_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or_else(|| {
            warn!("Bearer token subject no longer exists");
            ApiError::invalid_token()
        })?;

    req.extensions_mut().insert(CurrentUser(profile_from_row(&user)));
    Ok(next.run(req).await)
}
