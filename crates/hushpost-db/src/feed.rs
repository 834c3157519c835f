//! Public feed: offset pagination over open posts, newest first.
//!
//! Pages are computed from one locked read, so the count and the slice agree.
//! Across requests there is no cursor: inserts or deletes between two page
//! fetches can shift items over a page boundary.

use hushpost_types::models::{FeedPage, Pagination};

use crate::models::PublicPostRow;
use crate::posts::{PUBLIC_POST_COLUMNS, read_public_row};
use crate::{Database, PostError};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

/// Clamp caller-supplied values: `page` to at least 1, `page_size` to
/// `1..=MAX_PAGE_SIZE`.
pub fn clamp_page(page: i64, page_size: i64) -> (u32, u32) {
    let page = page.clamp(1, i64::from(u32::MAX)) as u32;
    let page_size = page_size.clamp(1, i64::from(MAX_PAGE_SIZE)) as u32;
    (page, page_size)
}

impl Database {
    /// `page` is 1-based. Callers are expected to pass clamped values.
    pub fn list_open_posts(&self, page: u32, page_size: u32) -> Result<FeedPage, PostError> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let offset = u64::from(page - 1) * u64::from(page_size);

        let conn = self.lock()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE is_accepting_messages = 1",
            [],
            |row| row.get(0),
        )?;

        // Ties on created_at fall back to insertion order
        let sql = format!(
            "SELECT {PUBLIC_POST_COLUMNS}
             FROM posts p LEFT JOIN users u ON u.id = p.owner_id
             WHERE p.is_accepting_messages = 1
             ORDER BY p.created_at DESC, p.rowid ASC
             LIMIT ?1 OFFSET ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map((i64::from(page_size), offset as i64), read_public_row)?
            .map(|r| r.map(PublicPostRow::into_public))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(FeedPage {
            posts,
            pagination: Pagination::new(page, page_size, total.max(0) as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn seeded(open: usize, closed: usize) -> Database {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        db.create_user(&owner.to_string(), "alice", "alice@example.com", "hash")
            .unwrap();
        for i in 0..open {
            db.create_post(owner, &format!("open {i}")).unwrap();
        }
        for i in 0..closed {
            let post = db.create_post(owner, &format!("closed {i}")).unwrap();
            db.set_accepting(post.id, owner, false).unwrap();
        }
        db
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(clamp_page(0, 10), (1, 10));
        assert_eq!(clamp_page(-4, 0), (1, 1));
        assert_eq!(clamp_page(3, 10_000), (3, MAX_PAGE_SIZE));
    }

    #[test]
    fn pages_cover_every_open_post_once() {
        let db = seeded(23, 5);
        let mut seen = HashSet::new();
        let mut all = Vec::new();

        let first = db.list_open_posts(1, 10).unwrap();
        assert_eq!(first.pagination.total_posts, 23);
        assert_eq!(first.pagination.total_pages, 3);

        for page in 1..=first.pagination.total_pages {
            let feed = db.list_open_posts(page, 10).unwrap();
            assert_eq!(feed.pagination.current_page, page);
            assert_eq!(feed.pagination.has_more, page < 3);
            for post in feed.posts {
                assert!(post.is_accepting_messages);
                assert!(seen.insert(post.id), "duplicate post across pages");
                all.push(post);
            }
        }

        assert_eq!(all.len(), 23);
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let db = seeded(3, 0);
        let feed = db.list_open_posts(5, 10).unwrap();
        assert!(feed.posts.is_empty());
        assert_eq!(feed.pagination.total_pages, 1);
        assert!(!feed.pagination.has_more);
    }

    #[test]
    fn closing_a_post_removes_it_from_the_feed() {
        let db = seeded(0, 0);
        let owner = Uuid::new_v4();
        db.create_user(&owner.to_string(), "bob", "bob@example.com", "hash")
            .unwrap();
        let post = db.create_post(owner, "visible").unwrap();
        db.append_reply(post.id, "hi").unwrap();

        let feed = db.list_open_posts(1, 10).unwrap();
        assert_eq!(feed.posts.len(), 1);
        assert_eq!(feed.posts[0].username, "bob");
        assert_eq!(feed.posts[0].reply_count, 1);

        db.set_accepting(post.id, owner, false).unwrap();
        let feed = db.list_open_posts(1, 10).unwrap();
        assert!(feed.posts.is_empty());
        assert_eq!(feed.pagination.total_posts, 0);
    }
}
