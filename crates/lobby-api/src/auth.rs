use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use tracing::{info, warn};

use lobby_db::models::{NewUser, UserRow};
use lobby_db::{Database, DbError};
use lobby_types::api::{LoginForm, RegisterRequest, StatusMessage, TokenResponse};

use crate::error::ApiError;
use crate::extract::{ApiForm, ApiJson};
use crate::{blocking, password, token};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no such user")]
    NoSuchUser,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("stored password hash is unreadable: {0}")]
    CorruptHash(String),
}

/// Look the user up and check `password` against the stored Argon2 hash.
/// Blocking: call from `spawn_blocking`.
pub fn verify_credentials(db: &Database, username: &str, password: &str) -> Result<UserRow, CredentialError> {
    let user = db
        .get_user_by_username(username)?
        .ok_or(CredentialError::NoSuchUser)?;

    match password::verify_password(password, &user.password_hash) {
        Ok(true) => Ok(user),
        Ok(false) => Err(CredentialError::InvalidCredentials),
        Err(e) => Err(CredentialError::CorruptHash(e.to_string())),
    }
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&req.username)?;
    if !req.email.contains('@') {
        return Err(ApiError::bad_request("email address is invalid"));
    }
    password::check_policy(&req.password).map_err(ApiError::bad_request)?;

    blocking::run(move || -> Result<(), ApiError> {
        if state.db.get_user_by_username(&req.username)?.is_some() {
            return Err(ApiError::Conflict("username already exists".into()));
        }

        let password_hash = password::hash_password(&req.password)
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

        state
            .db
            .create_user(&NewUser {
                username: &req.username,
                first_name: &req.first_name,
                middle_name: &req.middle_name,
                last_name: &req.last_name,
                email: &req.email,
                password_hash: &password_hash,
                phone_number: &req.phone_number,
                address_line1: &req.address_line1,
                address_line2: &req.address_line2,
                city: &req.city,
                state: &req.state,
                zip_code: &req.zip_code,
                country: &req.country,
            })
            .map_err(|e| match e {
                DbError::Duplicate(detail) if detail.contains("users.email") => {
                    ApiError::Conflict("email already registered".into())
                }
                DbError::Duplicate(_) => ApiError::Conflict("username already exists".into()),
                other => other.into(),
            })?;

        info!("Registered user {}", req.username);
        Ok(())
    })
    .await??;

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::new("User successfully added")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let username = form.username.clone();
    let result =
        blocking::run(move || verify_credentials(&db_state.db, &form.username, &form.password)).await?;

    let user = match result {
        Ok(user) => user,
        Err(CredentialError::NoSuchUser | CredentialError::InvalidCredentials) => {
            warn!("Failed login for {}", username);
            return Err(ApiError::Unauthorized("Incorrect username or password"));
        }
        Err(CredentialError::Db(e)) => return Err(e.into()),
        Err(e @ CredentialError::CorruptHash(_)) => return Err(ApiError::Internal(e.to_string())),
    };

    let access_token = token::create_token(&state.jwt_secret, &user.username)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(ApiError::bad_request("username must be 3 to 32 characters"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ApiError::bad_request(
            "username may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_user(username: &str, password: &str) -> Database {
        let db = Database::open_in_memory().unwrap();
        let hash = password::hash_password(password).unwrap();
        db.create_user(&NewUser {
            username,
            first_name: "Alex",
            middle_name: "J",
            last_name: "Klevans",
            email: "alex@email.com",
            password_hash: &hash,
            phone_number: "1234567890",
            address_line1: "123 User Street",
            address_line2: "",
            city: "Raleigh",
            state: "NC",
            zip_code: "27519",
            country: "USA",
        })
        .unwrap();
        db
    }

    #[test]
    fn credentials_match_only_the_creation_password() {
        let db = db_with_user("aklevans", "P@ssword123456789");

        let user = verify_credentials(&db, "aklevans", "P@ssword123456789").unwrap();
        assert_eq!(user.username, "aklevans");

        assert!(matches!(
            verify_credentials(&db, "aklevans", "p@ssword123456789"),
            Err(CredentialError::InvalidCredentials)
        ));
    }

    #[test]
    fn unknown_user_is_reported() {
        let db = db_with_user("aklevans", "P@ssword123456789");
        assert!(matches!(
            verify_credentials(&db, "vsiyer", "P@ssword123456789"),
            Err(CredentialError::NoSuchUser)
        ));
    }

    #[test]
    fn usernames_are_validated() {
        assert!(validate_username("aklevans").is_ok());
        assert!(validate_username("new.user_2-x").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }
}
