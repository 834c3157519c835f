use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use hushpost_db::PostError;
use hushpost_relay::RelayError;
use hushpost_types::api::Envelope;

/// Everything a handler can fail with. Rendered as the uniform
/// `{ success: false, message }` envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("This post is not accepting replies")]
    Closed,

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to generate suggestions")]
    Upstream(#[from] RelayError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::Closed => StatusCode::CONFLICT,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Upstream(e) => {
                warn!("Suggestion relay error: {}", e);
                self.to_string()
            }
            Self::Internal(e) => {
                error!("Internal error: {:?}", e);
                "An unexpected error occurred".to_string()
            }
            _ => self.to_string(),
        };

        (self.status(), Json(Envelope::failure(message))).into_response()
    }
}

impl From<PostError> for AppError {
    fn from(e: PostError) -> Self {
        match e {
            PostError::PostNotFound | PostError::ReplyNotFound => Self::NotFound(e.to_string()),
            PostError::Forbidden => Self::Forbidden,
            PostError::Closed => Self::Closed,
            PostError::Validation(v) => Self::Validation(v.to_string()),
            PostError::Storage(inner) => Self::Internal(inner),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Owner-scoped routes answer "not yours" exactly like "doesn't exist", so
/// post ids cannot be probed by other accounts.
pub fn conceal_foreign(e: PostError) -> AppError {
    match e {
        PostError::Forbidden => AppError::NotFound(PostError::PostNotFound.to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hushpost_types::models::ContentError;

    #[test]
    fn post_errors_map_to_expected_statuses() {
        let cases = [
            (AppError::from(PostError::PostNotFound), StatusCode::NOT_FOUND),
            (AppError::from(PostError::ReplyNotFound), StatusCode::NOT_FOUND),
            (AppError::from(PostError::Closed), StatusCode::CONFLICT),
            (AppError::from(PostError::Forbidden), StatusCode::FORBIDDEN),
            (
                AppError::from(PostError::Validation(ContentError::Empty)),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(PostError::Storage(anyhow::anyhow!("disk full"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }

    #[test]
    fn foreign_posts_look_missing() {
        let err = conceal_foreign(PostError::Forbidden);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Post not found");
        assert_eq!(conceal_foreign(PostError::Closed).status(), StatusCode::CONFLICT);
    }
}
