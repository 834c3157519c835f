use std::convert::Infallible;

use axum::{
    Json,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
};
use futures_util::StreamExt;

use hushpost_types::api::SuggestRequest;

use crate::error::AppError;
use crate::state::AppState;

/// POST /suggest-messages: relays the provider's text as a chunked
/// `text/plain` body.
///
/// A provider that cannot be reached yields an error envelope. Once bytes
/// have gone out the body simply ends on failure. When the client goes away
/// axum drops the body, and with it the upstream response.
pub async fn suggest_messages(
    State(state): State<AppState>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let fragments = state.relay.stream(&req.post_content, &req.user_draft).await?;
    let body = Body::from_stream(fragments.map(Ok::<_, Infallible>));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    ))
}
