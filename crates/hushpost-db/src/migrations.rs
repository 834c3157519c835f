use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                      TEXT PRIMARY KEY,
            username                TEXT NOT NULL UNIQUE,
            email                   TEXT NOT NULL UNIQUE,
            password                TEXT NOT NULL,
            is_verified             INTEGER NOT NULL DEFAULT 0,
            -- legacy account-wide switch, superseded by posts.is_accepting_messages
            is_accepting_messages   INTEGER NOT NULL DEFAULT 1,
            created_at              TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS posts (
            id                      TEXT PRIMARY KEY,
            owner_id                TEXT NOT NULL REFERENCES users(id),
            content                 TEXT NOT NULL,
            is_accepting_messages   INTEGER NOT NULL DEFAULT 1,
            created_at              TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_posts_open_feed
            ON posts(is_accepting_messages, created_at);

        CREATE INDEX IF NOT EXISTS idx_posts_owner
            ON posts(owner_id, created_at);

        CREATE TABLE IF NOT EXISTS replies (
            id          TEXT PRIMARY KEY,
            post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_replies_post
            ON replies(post_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
