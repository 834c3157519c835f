use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound for post and reply bodies, counted in characters.
pub const MAX_CONTENT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("Content cannot be empty")]
    Empty,
    #[error("Content must be at most {max} characters")]
    TooLong { max: usize },
}

/// Trim and bound-check user supplied text before it touches storage.
pub fn normalize_content(raw: &str) -> Result<String, ContentError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ContentError::Empty);
    }
    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(ContentError::TooLong { max: MAX_CONTENT_CHARS });
    }
    Ok(trimmed.to_string())
}

/// An anonymous reply. Lives only inside its parent post's reply list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The full aggregate as its owner sees it. `replies` is in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub is_accepting_messages: bool,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<Reply>,
}

impl Post {
    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }
}

/// What non-owners get to see: the post and how many replies it has.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPost {
    pub id: Uuid,
    pub username: String,
    pub content: String,
    pub is_accepting_messages: bool,
    pub created_at: DateTime<Utc>,
    pub reply_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_posts: u64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32, total_posts: u64) -> Self {
        let total_pages = total_posts.div_ceil(u64::from(page_size.max(1))) as u32;
        Self {
            current_page: page,
            total_pages,
            total_posts,
            has_more: page < total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub posts: Vec<PublicPost>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_trimmed() {
        assert_eq!(normalize_content("  Hello \n").unwrap(), "Hello");
    }

    #[test]
    fn blank_content_is_rejected() {
        assert_eq!(normalize_content(" \t "), Err(ContentError::Empty));
    }

    #[test]
    fn bound_counts_characters_not_bytes() {
        let at_limit = "é".repeat(MAX_CONTENT_CHARS);
        assert!(normalize_content(&at_limit).is_ok());

        let over = "a".repeat(MAX_CONTENT_CHARS + 1);
        assert_eq!(
            normalize_content(&over),
            Err(ContentError::TooLong { max: MAX_CONTENT_CHARS })
        );
    }

    #[test]
    fn pagination_rounds_pages_up() {
        let p = Pagination::new(1, 10, 21);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_more);

        let last = Pagination::new(3, 10, 21);
        assert!(!last.has_more);
    }

    #[test]
    fn empty_feed_has_no_pages() {
        let p = Pagination::new(1, 10, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_more);
    }
}
