use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use hushpost_db::feed::{DEFAULT_PAGE_SIZE, clamp_page};
use hushpost_types::api::{Envelope, FeedQuery};

use crate::error::AppError;
use crate::state::{AppState, with_db};

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// GET /posts/explore?page=&limit=: open posts, newest first.
pub async fn explore(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (page, page_size) = clamp_page(
        parse_or(query.page.as_deref(), 1),
        parse_or(query.limit.as_deref(), i64::from(DEFAULT_PAGE_SIZE)),
    );

    let feed = with_db(&state, move |db| db.list_open_posts(page, page_size)).await?;
    Ok(Json(Envelope::ok(feed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_falls_back_to_default() {
        assert_eq!(parse_or(Some("3"), 1), 3);
        assert_eq!(parse_or(Some(" 7 "), 1), 7);
        assert_eq!(parse_or(Some("abc"), 1), 1);
        assert_eq!(parse_or(None, 10), 10);
    }
}
