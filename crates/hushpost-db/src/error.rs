use hushpost_types::models::ContentError;

/// Outcomes of aggregate operations that are not plain success.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("Post not found")]
    PostNotFound,

    /// Never-existed and already-removed are indistinguishable.
    #[error("Reply not found or already deleted")]
    ReplyNotFound,

    #[error("Not the owner of this post")]
    Forbidden,

    #[error("Post is not accepting replies")]
    Closed,

    #[error(transparent)]
    Validation(#[from] ContentError),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl PostError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PostNotFound | Self::ReplyNotFound)
    }
}

impl From<rusqlite::Error> for PostError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.into())
    }
}
