use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use hushpost_types::api::{Envelope, UserPostsPayload, UsernameQuery};

use crate::auth::validate_username;
use crate::error::AppError;
use crate::state::{AppState, with_db};

/// GET /users/{username}/posts: public profile.
pub async fn user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lookup = username.clone();
    let posts = with_db(&state, move |db| db.list_user_posts(&lookup))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(Envelope::ok(UserPostsPayload { username, posts })))
}

/// GET /users/check-username?username=
pub async fn check_username(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> Result<impl IntoResponse, AppError> {
    let username = query.username.trim().to_string();
    validate_username(&username)?;

    let taken = with_db(&state, move |db| db.username_exists(&username)).await?;
    if taken {
        return Err(AppError::Conflict("Username is already taken".into()));
    }
    Ok(Json(Envelope::message("Username is available")))
}
