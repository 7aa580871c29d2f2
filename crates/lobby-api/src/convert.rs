//! Row to wire-type conversions. Corrupt ids or timestamps are logged and
//! replaced with defaults rather than failing the whole response.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use lobby_db::models::{CommentRow, IdeaDetail, NotificationRow, UserRow, parse_timestamp};
use lobby_types::api::{CommentResponse, IdeaResponse, NotificationResponse, UserProfile};

pub fn profile_from_row(row: &UserRow) -> UserProfile {
    UserProfile {
        username: row.username.clone(),
        first_name: row.first_name.clone(),
        middle_name: row.middle_name.clone(),
        last_name: row.last_name.clone(),
        email: row.email.clone(),
    }
}

pub fn idea_response(detail: IdeaDetail) -> IdeaResponse {
    let idea = detail.idea;
    IdeaResponse {
        id: uuid_or_default(&idea.id, "idea id", &idea.id),
        created_at: timestamp_or_default(&idea.created_at, "created_at", &idea.id),
        stake_period_end: timestamp_or_default(&idea.stake_period_end, "stake_period_end", &idea.id),
        title: idea.title,
        body: idea.body,
        creator: idea.creator,
        token_count: idea.token_count,
        is_active: idea.is_active,
        categories: detail.categories,
        image_urls: detail.image_urls,
        supports: detail.supports,
        saves: detail.saves,
        questions: detail.questions,
    }
}

pub fn comment_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: uuid_or_default(&row.id, "comment id", &row.id),
        idea_id: uuid_or_default(&row.idea_id, "idea_id", &row.id),
        created_at: timestamp_or_default(&row.created_at, "created_at", &row.id),
        replying_to: row
            .replying_to
            .as_deref()
            .map(|id| uuid_or_default(id, "replying_to", &row.id)),
        commentor: row.commentor,
        body: row.body,
        hashtag: row.hashtag,
    }
}

pub fn notification_response(row: NotificationRow) -> NotificationResponse {
    NotificationResponse {
        id: uuid_or_default(&row.id, "notification id", &row.id),
        created_at: timestamp_or_default(&row.created_at, "created_at", &row.id),
        title: row.title,
        body: row.body,
    }
}

fn uuid_or_default(raw: &str, field: &str, row_id: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", field, raw, row_id, e);
        Uuid::default()
    })
}

fn timestamp_or_default(raw: &str, field: &str, row_id: &str) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!("Corrupt {} '{}' on row '{}'", field, raw, row_id);
        DateTime::default()
    })
}
