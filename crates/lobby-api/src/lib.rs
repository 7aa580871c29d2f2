//! HTTP API for the idea lobby: auth, profiles, ideas, comments, categories,
//! friends and notifications.

pub mod auth;
pub mod blocking;
pub mod categories;
pub mod comments;
pub mod convert;
pub mod error;
pub mod extract;
pub mod ideas;
pub mod middleware;
pub mod password;
pub mod social;
pub mod token;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};

use crate::auth::AppState;
use crate::middleware::require_auth;

/// All API routes. CORS and tracing layers are added by the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(users::root))
        .route("/api/login", post(auth::login))
        .route("/api/users", post(auth::register))
        .route("/api/users/", post(auth::register))
        .route("/api/users/{username}", get(users::get_user))
        .route("/api/users/{username}/ideas", get(ideas::list_user_ideas))
        .route("/api/ideas/{idea_id}", get(ideas::get_idea))
        .route("/api/ideas/{idea_id}/comments", get(comments::list_comments))
        .route("/api/categories", get(categories::list_categories));

    let protected_routes = Router::new()
        .route("/users/me", get(users::me).delete(users::delete_me))
        .route("/api/users/{username}/metamask", put(users::set_wallet))
        .route("/api/ideas", post(ideas::create_idea))
        .route("/api/ideas/{idea_id}/comments", post(comments::post_comment))
        .route("/api/ideas/{idea_id}/{mark}", post(ideas::toggle_mark))
        .route("/api/categories", post(categories::create_category))
        .route("/api/friends", get(social::list_friends))
        .route("/api/friends/{username}", post(social::add_friend))
        .route("/api/notifications", get(social::list_notifications))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
