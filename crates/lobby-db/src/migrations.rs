use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                username        TEXT PRIMARY KEY,
                first_name      TEXT NOT NULL,
                middle_name     TEXT NOT NULL,
                last_name       TEXT NOT NULL,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                phone_number    TEXT NOT NULL,
                address_line1   TEXT NOT NULL,
                address_line2   TEXT NOT NULL,
                city            TEXT NOT NULL,
                state           TEXT NOT NULL,
                zip_code        TEXT NOT NULL,
                country         TEXT NOT NULL,
                wallet_id       TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- One row per friendship, stored with user1 < user2.
            CREATE TABLE user_friends (
                user1       TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
                user2       TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user1, user2),
                CHECK (user1 < user2)
            );

            CREATE INDEX idx_user_friends_user2 ON user_friends(user2);

            CREATE TABLE notifications (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
                title       TEXT NOT NULL,
                body        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_notifications_user ON notifications(username, created_at);

            CREATE TABLE ideas (
                id                  TEXT PRIMARY KEY,
                title               TEXT NOT NULL,
                body                TEXT NOT NULL,
                creator             TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
                token_count         INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL DEFAULT (datetime('now')),
                stake_period_end    TEXT NOT NULL,
                is_active           INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX idx_ideas_creator ON ideas(creator, created_at);
            CREATE INDEX idx_ideas_stake ON ideas(is_active, stake_period_end);

            CREATE TABLE idea_supports (
                username    TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
                idea_id     TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (username, idea_id)
            );

            CREATE TABLE idea_saves (
                username    TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
                idea_id     TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (username, idea_id)
            );

            CREATE TABLE idea_questions (
                username    TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
                idea_id     TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (username, idea_id)
            );

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                idea_id     TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                commentor   TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
                body        TEXT NOT NULL,
                hashtag     TEXT NOT NULL,
                replying_to TEXT REFERENCES comments(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_comments_idea ON comments(idea_id, created_at);

            CREATE TABLE categories (
                name    TEXT PRIMARY KEY
            );

            CREATE TABLE idea_categories (
                category_name   TEXT NOT NULL REFERENCES categories(name) ON DELETE CASCADE,
                idea_id         TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                PRIMARY KEY (category_name, idea_id)
            );

            CREATE INDEX idx_idea_categories_idea ON idea_categories(idea_id);

            CREATE TABLE images (
                id          TEXT PRIMARY KEY,
                idea_id     TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                url         TEXT NOT NULL
            );

            CREATE INDEX idx_images_idea ON images(idea_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
