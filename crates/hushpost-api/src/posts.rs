use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use hushpost_types::api::{
    AppendReplyRequest, Claims, CreatePostRequest, Envelope, PostPayload, PostsPayload,
    PublicPostPayload, ReplyPayload, ToggleMessagesRequest, TogglePayload,
};

use crate::error::{AppError, conceal_foreign};
use crate::state::{AppState, with_db};

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let owner = claims.sub;

    let post = with_db(&state, move |db| db.create_post(owner, &req.content)).await?;
    info!("Post {} created by {}", post.id, claims.username);

    Ok(Json(Envelope::ok_with_message(
        "Post created successfully",
        PostPayload { post },
    )))
}

/// GET /posts: the caller's posts with full reply lists.
pub async fn list_own_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let owner = claims.sub;
    let posts = with_db(&state, move |db| db.list_own_posts(owner)).await?;
    Ok(Json(Envelope::ok(PostsPayload { posts })))
}

/// PATCH /posts/{post_id}/toggle-messages
pub async fn toggle_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ToggleMessagesRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(post_id) = path?;
    let Json(req) = payload?;
    let owner = claims.sub;
    let desired = req.is_accepting_messages;

    let accepting = with_db(&state, move |db| {
        db.set_accepting(post_id, owner, desired).map_err(conceal_foreign)
    })
    .await?;

    let message = if accepting { "Replies enabled" } else { "Replies disabled" };
    Ok(Json(Envelope::ok_with_message(
        message,
        TogglePayload {
            is_accepting_messages: accepting,
        },
    )))
}

/// DELETE /posts/{post_id}
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(post_id) = path?;
    let owner = claims.sub;

    with_db(&state, move |db| db.delete_post(post_id, owner).map_err(conceal_foreign)).await?;
    info!("Post {} deleted by {}", post_id, claims.username);

    Ok(Json(Envelope::message("Post deleted successfully")))
}

/// DELETE /posts/{post_id}/replies/{reply_id}
pub async fn remove_reply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path((post_id, reply_id)) = path?;
    let owner = claims.sub;

    with_db(&state, move |db| {
        db.remove_reply(post_id, owner, reply_id)
            .map_err(conceal_foreign)
    })
    .await?;

    Ok(Json(Envelope::message("Reply deleted successfully")))
}

/// GET /posts/{post_id}: public, no reply contents.
pub async fn get_public_post(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(post_id) = path?;

    let post = with_db(&state, move |db| db.get_public_post(post_id))
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    Ok(Json(Envelope::ok(PublicPostPayload { post })))
}

/// POST /posts/{post_id}/replies: anonymous, no session.
pub async fn append_reply(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AppendReplyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(post_id) = path?;
    let Json(req) = payload?;

    let reply = with_db(&state, move |db| db.append_reply(post_id, &req.content)).await?;

    Ok(Json(Envelope::ok_with_message(
        "Reply sent successfully",
        ReplyPayload { reply },
    )))
}
