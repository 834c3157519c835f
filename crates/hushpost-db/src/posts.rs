//! The post/reply aggregate.
//!
//! A post and its replies form one consistency unit. Each mutation below is a
//! single conditional statement run while holding the connection lock, so a
//! reply insert either sees the post open and lands, or sees it closed (or
//! gone) and changes nothing. Ownership is part of the `WHERE` clause; the
//! follow-up lookup on a miss only decides which error to report.

use rusqlite::Connection;
use uuid::Uuid;

use hushpost_types::models::{Post, PublicPost, Reply, normalize_content};

use crate::models::{PostRow, PublicPostRow, ReplyRow};
use crate::queries::OptionalExt;
use crate::{Database, PostError, format_ts, now};

/// Columns for [`PublicPostRow`]; expects `posts p` joined with `users u`.
pub(crate) const PUBLIC_POST_COLUMNS: &str = "p.id, COALESCE(u.username, 'unknown'), p.content,
     p.is_accepting_messages, p.created_at,
     (SELECT COUNT(*) FROM replies r WHERE r.post_id = p.id)";

impl Database {
    pub fn create_post(&self, owner_id: Uuid, content: &str) -> Result<Post, PostError> {
        let content = normalize_content(content)?;
        let id = Uuid::new_v4();
        let created_at = now();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO posts (id, owner_id, content, is_accepting_messages, created_at)
             VALUES (?1, ?2, ?3, 1, ?4)",
            (id.to_string(), owner_id.to_string(), &content, format_ts(&created_at)),
        )?;

        Ok(Post {
            id,
            owner_id,
            content,
            is_accepting_messages: true,
            created_at,
            replies: Vec::new(),
        })
    }

    /// Anonymous write path. The insert only happens if the post is open at
    /// the moment the statement runs.
    pub fn append_reply(&self, post_id: Uuid, content: &str) -> Result<Reply, PostError> {
        let content = normalize_content(content)?;
        let id = Uuid::new_v4();
        let created_at = now();
        let pid = post_id.to_string();

        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT INTO replies (id, post_id, content, created_at)
             SELECT ?1, id, ?3, ?4 FROM posts WHERE id = ?2 AND is_accepting_messages = 1",
            (id.to_string(), &pid, &content, format_ts(&created_at)),
        )?;

        if inserted == 0 {
            return Err(match post_owner(&conn, &pid)? {
                Some(_) => PostError::Closed,
                None => PostError::PostNotFound,
            });
        }

        Ok(Reply { id, content, created_at })
    }

    /// Set the accepting flag to `accepting`. Returns the stored value.
    pub fn set_accepting(
        &self,
        post_id: Uuid,
        owner_id: Uuid,
        accepting: bool,
    ) -> Result<bool, PostError> {
        let pid = post_id.to_string();
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE posts SET is_accepting_messages = ?3 WHERE id = ?1 AND owner_id = ?2",
            (&pid, owner_id.to_string(), accepting),
        )?;

        if updated == 0 {
            return Err(ownership_miss(&conn, &pid)?);
        }
        Ok(accepting)
    }

    /// Remove a post; its replies go with it through the cascade.
    pub fn delete_post(&self, post_id: Uuid, owner_id: Uuid) -> Result<(), PostError> {
        let pid = post_id.to_string();
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM posts WHERE id = ?1 AND owner_id = ?2",
            (&pid, owner_id.to_string()),
        )?;

        if deleted == 0 {
            return Err(ownership_miss(&conn, &pid)?);
        }
        Ok(())
    }

    pub fn remove_reply(
        &self,
        post_id: Uuid,
        owner_id: Uuid,
        reply_id: Uuid,
    ) -> Result<(), PostError> {
        let pid = post_id.to_string();
        let oid = owner_id.to_string();
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM replies
             WHERE id = ?1
               AND post_id IN (SELECT id FROM posts WHERE id = ?2 AND owner_id = ?3)",
            (reply_id.to_string(), &pid, &oid),
        )?;

        if removed == 0 {
            return Err(match post_owner(&conn, &pid)? {
                None => PostError::PostNotFound,
                Some(owner) if owner != oid => PostError::Forbidden,
                Some(_) => PostError::ReplyNotFound,
            });
        }
        Ok(())
    }

    /// All of an owner's posts, newest first, each with its full reply list
    /// in arrival order.
    pub fn list_own_posts(&self, owner_id: Uuid) -> Result<Vec<Post>, PostError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, owner_id, content, is_accepting_messages, created_at
             FROM posts
             WHERE owner_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map([owner_id.to_string()], |row| {
                Ok(PostRow {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    content: row.get(2)?,
                    is_accepting_messages: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut replies = query_owner_replies(&conn, &owner_id.to_string())?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mine = replies.remove(&row.id).unwrap_or_default();
                row.into_post(mine)
            })
            .collect())
    }

    /// Public view of a single post, without reply contents.
    pub fn get_public_post(&self, post_id: Uuid) -> Result<Option<PublicPost>, PostError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {PUBLIC_POST_COLUMNS}
             FROM posts p LEFT JOIN users u ON u.id = p.owner_id
             WHERE p.id = ?1"
        );
        let row = conn
            .query_row(&sql, [post_id.to_string()], read_public_row)
            .optional()?;
        Ok(row.map(PublicPostRow::into_public))
    }

    /// Every post by `username`, open or closed, newest first.
    /// `None` when no such user exists.
    pub fn list_user_posts(&self, username: &str) -> Result<Option<Vec<PublicPost>>, PostError> {
        let conn = self.lock()?;

        let user_id: Option<String> = conn
            .query_row("SELECT id FROM users WHERE username = ?1", [username], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {PUBLIC_POST_COLUMNS}
             FROM posts p LEFT JOIN users u ON u.id = p.owner_id
             WHERE p.owner_id = ?1
             ORDER BY p.created_at DESC, p.rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map([user_id], read_public_row)?
            .map(|r| r.map(PublicPostRow::into_public))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(posts))
    }
}

pub(crate) fn read_public_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PublicPostRow> {
    Ok(PublicPostRow {
        id: row.get(0)?,
        username: row.get(1)?,
        content: row.get(2)?,
        is_accepting_messages: row.get(3)?,
        created_at: row.get(4)?,
        reply_count: row.get(5)?,
    })
}

fn post_owner(conn: &Connection, post_id: &str) -> anyhow::Result<Option<String>> {
    conn.query_row("SELECT owner_id FROM posts WHERE id = ?1", [post_id], |row| {
        row.get(0)
    })
    .optional()
}

/// Classify a zero-row owner-scoped update.
fn ownership_miss(conn: &Connection, post_id: &str) -> anyhow::Result<PostError> {
    Ok(match post_owner(conn, post_id)? {
        Some(_) => PostError::Forbidden,
        None => PostError::PostNotFound,
    })
}

/// Every reply on the owner's posts, grouped by post id, arrival order.
fn query_owner_replies(
    conn: &Connection,
    owner_id: &str,
) -> anyhow::Result<std::collections::HashMap<String, Vec<Reply>>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.post_id, r.content, r.created_at
         FROM replies r JOIN posts p ON p.id = r.post_id
         WHERE p.owner_id = ?1
         ORDER BY r.rowid ASC",
    )?;
    let rows = stmt
        .query_map([owner_id], |row| {
            Ok(ReplyRow {
                id: row.get(0)?,
                post_id: row.get(1)?,
                content: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut grouped: std::collections::HashMap<String, Vec<Reply>> = Default::default();
    for row in rows {
        grouped.entry(row.post_id.clone()).or_default().push(row.into_reply());
    }
    Ok(grouped)
}
