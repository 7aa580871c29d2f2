use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use lobby_types::models::IdeaMark;

use crate::models::{
    ClosedStake, CommentOutcome, CommentRow, IdeaDetail, IdeaRow, NewIdea, format_timestamp,
};
use crate::queries::insert_notification;
use crate::{Database, Result};

fn mark_table(mark: IdeaMark) -> &'static str {
    match mark {
        IdeaMark::Support => "idea_supports",
        IdeaMark::Save => "idea_saves",
        IdeaMark::Question => "idea_questions",
    }
}

impl Database {
    // -- Ideas --

    /// Inserts the idea, its categories (creating unknown ones) and its images
    /// in a single transaction.
    pub fn create_idea(&self, idea: &NewIdea<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO ideas (id, title, body, creator, stake_period_end) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    idea.id,
                    idea.title,
                    idea.body,
                    idea.creator,
                    format_timestamp(idea.stake_period_end),
                ],
            )?;

            for name in idea.categories {
                tx.execute("INSERT OR IGNORE INTO categories (name) VALUES (?1)", [name])?;
                tx.execute(
                    "INSERT OR IGNORE INTO idea_categories (category_name, idea_id) VALUES (?1, ?2)",
                    (name, idea.id),
                )?;
            }

            for url in idea.image_urls {
                tx.execute(
                    "INSERT INTO images (id, idea_id, url) VALUES (?1, ?2, ?3)",
                    (Uuid::new_v4().to_string(), idea.id, url),
                )?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_idea(&self, id: &str) -> Result<Option<IdeaDetail>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, body, creator, token_count, created_at, stake_period_end, is_active
                 FROM ideas WHERE id = ?1",
            )?;
            match stmt.query_row([id], idea_from_row).optional()? {
                Some(idea) => Ok(Some(load_detail(conn, idea)?)),
                None => Ok(None),
            }
        })
    }

    /// The creator's username, or None if the idea does not exist.
    pub fn get_idea_creator(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| query_idea_creator(conn, id))
    }

    /// Newest first.
    pub fn get_ideas_by_creator(&self, creator: &str) -> Result<Vec<IdeaDetail>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, body, creator, token_count, created_at, stake_period_end, is_active
                 FROM ideas
                 WHERE creator = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let ideas = stmt
                .query_map([creator], idea_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            ideas
                .into_iter()
                .map(|idea| load_detail(conn, idea))
                .collect()
        })
    }

    /// Toggle a mark: removes it if present, inserts it if not. A new support
    /// from anyone but the creator leaves the creator a notification.
    /// Returns None when the idea does not exist, otherwise whether the mark
    /// was added.
    pub fn toggle_mark(&self, mark: IdeaMark, username: &str, idea_id: &str) -> Result<Option<bool>> {
        let table = mark_table(mark);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(creator) = query_idea_creator(&tx, idea_id)? else {
                return Ok(None);
            };

            let removed = tx.execute(
                &format!("DELETE FROM {table} WHERE username = ?1 AND idea_id = ?2"),
                (username, idea_id),
            )?;
            let added = removed == 0;

            if added {
                tx.execute(
                    &format!("INSERT INTO {table} (username, idea_id) VALUES (?1, ?2)"),
                    (username, idea_id),
                )?;
                if mark == IdeaMark::Support && creator != username {
                    insert_notification(
                        &tx,
                        &Uuid::new_v4().to_string(),
                        &creator,
                        "New supporter",
                        &format!("{username} supports your idea."),
                    )?;
                }
            }

            tx.commit()?;
            Ok(Some(added))
        })
    }

    /// Marks every active idea whose stake period ended at or before `now` as
    /// inactive and leaves a notification for each creator.
    pub fn close_expired_stakes(&self, now: DateTime<Utc>) -> Result<Vec<ClosedStake>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let closed = {
                let mut stmt = tx.prepare(
                    "UPDATE ideas SET is_active = 0
                     WHERE is_active = 1 AND stake_period_end <= ?1
                     RETURNING id, creator, title",
                )?;
                let rows = stmt
                    .query_map([format_timestamp(now)], |row| {
                        Ok(ClosedStake {
                            id: row.get(0)?,
                            creator: row.get(1)?,
                            title: row.get(2)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            };

            for stake in &closed {
                insert_notification(
                    &tx,
                    &Uuid::new_v4().to_string(),
                    &stake.creator,
                    "Stake period ended",
                    &format!("The stake period for \"{}\" has ended.", stake.title),
                )?;
            }

            tx.commit()?;
            Ok(closed)
        })
    }

    // -- Comments --

    /// Inserts the comment and notifies the idea's creator when someone else
    /// wrote it. The idea lookup, the reply check and both writes share one
    /// transaction.
    pub fn add_comment(&self, comment: &CommentRow) -> Result<CommentOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(creator) = query_idea_creator(&tx, &comment.idea_id)? else {
                return Ok(CommentOutcome::IdeaNotFound);
            };

            if let Some(parent_id) = &comment.replying_to {
                let parent_idea: Option<String> = tx
                    .query_row("SELECT idea_id FROM comments WHERE id = ?1", [parent_id], |row| {
                        row.get(0)
                    })
                    .optional()?;
                if parent_idea.as_deref() != Some(comment.idea_id.as_str()) {
                    return Ok(CommentOutcome::ParentNotOnIdea);
                }
            }

            tx.execute(
                "INSERT INTO comments (id, idea_id, commentor, body, hashtag, replying_to, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    comment.id,
                    comment.idea_id,
                    comment.commentor,
                    comment.body,
                    comment.hashtag,
                    comment.replying_to,
                    comment.created_at,
                ],
            )?;

            if creator != comment.commentor {
                insert_notification(
                    &tx,
                    &Uuid::new_v4().to_string(),
                    &creator,
                    "New comment",
                    &format!("{} commented on your idea.", comment.commentor),
                )?;
            }

            tx.commit()?;
            Ok(CommentOutcome::Added)
        })
    }

    /// Oldest first.
    pub fn get_comments(&self, idea_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, idea_id, commentor, body, hashtag, replying_to, created_at
                 FROM comments
                 WHERE idea_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([idea_id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Categories --

    pub fn create_category(&self, name: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
            Ok(())
        })
    }

    pub fn get_categories(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM categories ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(names)
        })
    }
}

fn query_idea_creator(conn: &Connection, id: &str) -> Result<Option<String>> {
    let creator = conn
        .query_row("SELECT creator FROM ideas WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(creator)
}

fn idea_from_row(row: &Row<'_>) -> rusqlite::Result<IdeaRow> {
    Ok(IdeaRow {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        creator: row.get(3)?,
        token_count: row.get(4)?,
        created_at: row.get(5)?,
        stake_period_end: row.get(6)?,
        is_active: row.get(7)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        idea_id: row.get(1)?,
        commentor: row.get(2)?,
        body: row.get(3)?,
        hashtag: row.get(4)?,
        replying_to: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn load_detail(conn: &Connection, idea: IdeaRow) -> Result<IdeaDetail> {
    let mut stmt = conn.prepare(
        "SELECT category_name FROM idea_categories WHERE idea_id = ?1 ORDER BY category_name",
    )?;
    let categories = stmt
        .query_map([&idea.id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;

    let mut stmt = conn.prepare("SELECT url FROM images WHERE idea_id = ?1 ORDER BY rowid")?;
    let image_urls = stmt
        .query_map([&idea.id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;

    let (supports, saves, questions): (i64, i64, i64) = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM idea_supports WHERE idea_id = ?1),
                (SELECT COUNT(*) FROM idea_saves WHERE idea_id = ?1),
                (SELECT COUNT(*) FROM idea_questions WHERE idea_id = ?1)",
        [&idea.id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(IdeaDetail {
        idea,
        categories,
        image_urls,
        supports,
        saves,
        questions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;
    use crate::queries::tests::new_user;
    use chrono::Duration;

    fn seed(db: &Database) {
        db.create_user(&new_user("aklevans", "alex@email.com")).unwrap();
        db.create_user(&new_user("vsiyer", "varun@email.com")).unwrap();
    }

    fn create_idea(db: &Database, id: &str, ends: DateTime<Utc>) {
        let categories = vec!["energy".to_string(), "civic".to_string(), "energy".to_string()];
        let images = vec!["https://img.example/1.png".to_string()];
        db.create_idea(&NewIdea {
            id,
            title: "Solar benches",
            body: "Benches that charge phones",
            creator: "aklevans",
            stake_period_end: ends,
            categories: &categories,
            image_urls: &images,
        })
        .unwrap();
    }

    #[test]
    fn idea_round_trips_with_categories_and_images() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        create_idea(&db, "idea-1", Utc::now() + Duration::days(7));

        let detail = db.get_idea("idea-1").unwrap().unwrap();
        assert_eq!(detail.idea.creator, "aklevans");
        assert_eq!(detail.idea.token_count, 0);
        assert!(detail.idea.is_active);
        assert_eq!(detail.categories, vec!["civic", "energy"]);
        assert_eq!(detail.image_urls, vec!["https://img.example/1.png"]);
        assert_eq!(db.get_categories().unwrap(), vec!["civic", "energy"]);

        assert!(db.get_idea("missing").unwrap().is_none());
    }

    #[test]
    fn idea_for_unknown_creator_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let categories = vec!["energy".to_string()];

        let err = db
            .create_idea(&NewIdea {
                id: "idea-1",
                title: "Orphan",
                body: "No creator",
                creator: "ghost",
                stake_period_end: Utc::now(),
                categories: &categories,
                image_urls: &[],
            })
            .unwrap_err();

        assert!(matches!(err, DbError::Constraint(_)), "got {err:?}");
        assert!(db.get_categories().unwrap().is_empty());
    }

    #[test]
    fn toggling_a_mark_twice_removes_it() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        create_idea(&db, "idea-1", Utc::now() + Duration::days(7));

        assert_eq!(db.toggle_mark(IdeaMark::Support, "vsiyer", "idea-1").unwrap(), Some(true));
        assert_eq!(db.toggle_mark(IdeaMark::Save, "vsiyer", "idea-1").unwrap(), Some(true));
        let detail = db.get_idea("idea-1").unwrap().unwrap();
        assert_eq!((detail.supports, detail.saves, detail.questions), (1, 1, 0));

        assert_eq!(db.toggle_mark(IdeaMark::Support, "vsiyer", "idea-1").unwrap(), Some(false));
        let detail = db.get_idea("idea-1").unwrap().unwrap();
        assert_eq!((detail.supports, detail.saves, detail.questions), (0, 1, 0));

        assert_eq!(db.toggle_mark(IdeaMark::Question, "vsiyer", "missing").unwrap(), None);
    }

    #[test]
    fn only_new_supports_from_others_notify_the_creator() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        create_idea(&db, "idea-1", Utc::now() + Duration::days(7));

        db.toggle_mark(IdeaMark::Support, "aklevans", "idea-1").unwrap();
        db.toggle_mark(IdeaMark::Save, "vsiyer", "idea-1").unwrap();
        db.toggle_mark(IdeaMark::Support, "vsiyer", "idea-1").unwrap();
        db.toggle_mark(IdeaMark::Support, "vsiyer", "idea-1").unwrap();

        let notes = db.get_notifications("aklevans", 10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "New supporter");
    }

    fn comment(id: &str, commentor: &str, replying_to: Option<&str>) -> CommentRow {
        CommentRow {
            id: id.into(),
            idea_id: "idea-1".into(),
            commentor: commentor.into(),
            body: "Love it".into(),
            hashtag: "#solar".into(),
            replying_to: replying_to.map(Into::into),
            created_at: format_timestamp(Utc::now()),
        }
    }

    #[test]
    fn comments_keep_reply_links() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        create_idea(&db, "idea-1", Utc::now() + Duration::days(7));

        assert_eq!(db.add_comment(&comment("c1", "vsiyer", None)).unwrap(), CommentOutcome::Added);
        assert_eq!(
            db.add_comment(&comment("c2", "aklevans", Some("c1"))).unwrap(),
            CommentOutcome::Added
        );

        let comments = db.get_comments("idea-1").unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, "c1");
        assert_eq!(comments[1].replying_to.as_deref(), Some("c1"));
        assert_eq!(comments[1].commentor, "aklevans");

        // Only the comment from someone other than the creator notifies
        let notes = db.get_notifications("aklevans", 10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "New comment");
    }

    #[test]
    fn comment_outcomes_for_bad_targets() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        create_idea(&db, "idea-1", Utc::now() + Duration::days(7));
        create_idea(&db, "idea-2", Utc::now() + Duration::days(7));

        let mut elsewhere = comment("c1", "vsiyer", None);
        elsewhere.idea_id = "idea-2".into();
        db.add_comment(&elsewhere).unwrap();

        assert_eq!(
            db.add_comment(&comment("c2", "vsiyer", Some("c1"))).unwrap(),
            CommentOutcome::ParentNotOnIdea
        );
        assert_eq!(
            db.add_comment(&comment("c3", "vsiyer", Some("nope"))).unwrap(),
            CommentOutcome::ParentNotOnIdea
        );

        let mut orphan = comment("c4", "vsiyer", None);
        orphan.idea_id = "missing".into();
        assert_eq!(db.add_comment(&orphan).unwrap(), CommentOutcome::IdeaNotFound);

        assert!(db.get_comments("idea-1").unwrap().is_empty());
    }

    #[test]
    fn duplicate_category_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_category("energy").unwrap();

        let err = db.create_category("energy").unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)), "got {err:?}");
    }

    #[test]
    fn sweeper_closes_only_ended_stakes() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let now = Utc::now();
        create_idea(&db, "ended", now - Duration::hours(1));
        create_idea(&db, "running", now + Duration::hours(1));

        let closed = db.close_expired_stakes(now).unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, "ended");

        assert!(!db.get_idea("ended").unwrap().unwrap().idea.is_active);
        assert!(db.get_idea("running").unwrap().unwrap().idea.is_active);

        let notes = db.get_notifications("aklevans", 10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Stake period ended");

        // Already closed ideas are not closed again
        assert!(db.close_expired_stakes(now).unwrap().is_empty());
    }

    #[test]
    fn deleting_creator_removes_ideas() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        create_idea(&db, "idea-1", Utc::now() + Duration::days(1));
        db.toggle_mark(IdeaMark::Support, "vsiyer", "idea-1").unwrap();

        db.delete_user("aklevans").unwrap();

        assert!(db.get_idea("idea-1").unwrap().is_none());
        assert!(db.get_ideas_by_creator("aklevans").unwrap().is_empty());
    }
}
