//! Database row types. These map directly to SQLite rows and are kept
//! separate from the lobby-types wire models.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Format SQLite's `datetime('now')` produces. Every timestamp column uses it
/// so text comparison orders correctly.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a stored timestamp, accepting RFC 3339 as well for rows written by hand.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .ok()
            .map(|ndt| ndt.and_utc())
    })
}

pub struct UserRow {
    pub username: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub wallet_id: Option<String>,
    pub created_at: String,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub middle_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone_number: &'a str,
    pub address_line1: &'a str,
    pub address_line2: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub zip_code: &'a str,
    pub country: &'a str,
}

pub struct IdeaRow {
    pub id: String,
    pub title: String,
    pub body: String,
    pub creator: String,
    pub token_count: i64,
    pub created_at: String,
    pub stake_period_end: String,
    pub is_active: bool,
}

/// An idea together with everything hanging off it.
pub struct IdeaDetail {
    pub idea: IdeaRow,
    pub categories: Vec<String>,
    pub image_urls: Vec<String>,
    pub supports: i64,
    pub saves: i64,
    pub questions: i64,
}

pub struct NewIdea<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub creator: &'a str,
    pub stake_period_end: DateTime<Utc>,
    pub categories: &'a [String],
    pub image_urls: &'a [String],
}

pub struct CommentRow {
    pub id: String,
    pub idea_id: String,
    pub commentor: String,
    pub body: String,
    pub hashtag: String,
    pub replying_to: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOutcome {
    Added,
    IdeaNotFound,
    /// `replying_to` names a comment that is missing or on another idea.
    ParentNotOnIdea,
}

pub struct NotificationRow {
    pub id: String,
    pub username: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
}

/// An idea the stake sweeper just closed.
pub struct ClosedStake {
    pub id: String,
    pub creator: String,
    pub title: String,
}
