//! Database row types. These map directly to SQLite rows and stay separate
//! from the hushpost-types API models; `into_*` does the conversion.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use hushpost_types::models::{Post, PublicPost, Reply};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_verified: bool,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    pub is_accepting_messages: bool,
    pub created_at: String,
}

pub struct ReplyRow {
    pub id: String,
    pub post_id: String,
    pub content: String,
    pub created_at: String,
}

/// A post joined with its owner's username and a live reply count.
pub struct PublicPostRow {
    pub id: String,
    pub username: String,
    pub content: String,
    pub is_accepting_messages: bool,
    pub created_at: String,
    pub reply_count: i64,
}

impl ReplyRow {
    pub fn into_reply(self) -> Reply {
        Reply {
            id: parse_uuid(&self.id, "reply id"),
            content: self.content,
            created_at: parse_ts(&self.created_at, &self.id),
        }
    }
}

impl PostRow {
    pub fn into_post(self, replies: Vec<Reply>) -> Post {
        Post {
            id: parse_uuid(&self.id, "post id"),
            owner_id: parse_uuid(&self.owner_id, "owner_id"),
            content: self.content,
            is_accepting_messages: self.is_accepting_messages,
            created_at: parse_ts(&self.created_at, &self.id),
            replies,
        }
    }
}

impl PublicPostRow {
    pub fn into_public(self) -> PublicPost {
        PublicPost {
            id: parse_uuid(&self.id, "post id"),
            username: self.username,
            content: self.content,
            is_accepting_messages: self.is_accepting_messages,
            created_at: parse_ts(&self.created_at, &self.id),
            reply_count: self.reply_count.max(0) as usize,
        }
    }
}

fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

fn parse_ts(raw: &str, row_id: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}
