use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::{NewUser, NotificationRow, UserRow};
use crate::{Database, Result};

const USER_COLUMNS: &str = "username, first_name, middle_name, last_name, email, password_hash, \
     phone_number, address_line1, address_line2, city, state, zip_code, country, wallet_id, created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, first_name, middle_name, last_name, email, password_hash,
                                    phone_number, address_line1, address_line2, city, state, zip_code, country)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                rusqlite::params![
                    user.username,
                    user.first_name,
                    user.middle_name,
                    user.last_name,
                    user.email,
                    user.password_hash,
                    user.phone_number,
                    user.address_line1,
                    user.address_line2,
                    user.city,
                    user.state,
                    user.zip_code,
                    user.country,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// Returns false when no such user exists.
    pub fn set_wallet_id(&self, username: &str, wallet_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE users SET wallet_id = ?2 WHERE username = ?1",
                (username, wallet_id),
            )?;
            Ok(updated > 0)
        })
    }

    /// Deletes the user and, through ON DELETE CASCADE, everything they own.
    /// Returns false when no such user exists.
    pub fn delete_user(&self, username: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
            Ok(deleted > 0)
        })
    }

    // -- Friends --

    /// Records a friendship and notifies `friend`. Returns false when `friend`
    /// does not exist. Adding the same pair twice, in either order, fails with
    /// `DbError::Duplicate`.
    pub fn add_friend(&self, username: &str, friend: &str) -> Result<bool> {
        let (user1, user2) = if username <= friend {
            (username, friend)
        } else {
            (friend, username)
        };

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if query_user_by_username(&tx, friend)?.is_none() {
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO user_friends (user1, user2) VALUES (?1, ?2)",
                (user1, user2),
            )?;
            insert_notification(
                &tx,
                &Uuid::new_v4().to_string(),
                friend,
                "New friend",
                &format!("{username} added you as a friend."),
            )?;

            tx.commit()?;
            Ok(true)
        })
    }

    pub fn get_friends(&self, username: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user2 FROM user_friends WHERE user1 = ?1
                 UNION
                 SELECT user1 FROM user_friends WHERE user2 = ?1
                 ORDER BY 1",
            )?;
            let friends = stmt
                .query_map([username], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(friends)
        })
    }

    // -- Notifications --

    /// Newest first.
    pub fn get_notifications(&self, username: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, title, body, created_at
                 FROM notifications
                 WHERE username = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![username, limit], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        title: row.get(2)?,
                        body: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn insert_notification(
    conn: &Connection,
    id: &str,
    username: &str,
    title: &str,
    body: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, username, title, body) VALUES (?1, ?2, ?3, ?4)",
        (id, username, title, body),
    )?;
    Ok(())
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))?;
    let row = stmt.query_row([username], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        username: row.get(0)?,
        first_name: row.get(1)?,
        middle_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        password_hash: row.get(5)?,
        phone_number: row.get(6)?,
        address_line1: row.get(7)?,
        address_line2: row.get(8)?,
        city: row.get(9)?,
        state: row.get(10)?,
        zip_code: row.get(11)?,
        country: row.get(12)?,
        wallet_id: row.get(13)?,
        created_at: row.get(14)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::DbError;

    pub(crate) fn new_user<'a>(username: &'a str, email: &'a str) -> NewUser<'a> {
        NewUser {
            username,
            first_name: "New",
            middle_name: "N",
            last_name: "User",
            email,
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA",
            phone_number: "1234567890",
            address_line1: "123 User Street",
            address_line2: "Apartment 5B",
            city: "Raleigh",
            state: "NC",
            zip_code: "27519",
            country: "USA",
        }
    }

    fn notify(db: &Database, id: &str, title: &str) {
        db.with_conn_mut(|conn| insert_notification(conn, id, "aklevans", title, "body"))
            .unwrap();
    }

    #[test]
    fn create_and_fetch_user() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("newuser", "new@example.com")).unwrap();

        let user = db.get_user_by_username("newuser").unwrap().unwrap();
        assert_eq!(user.username, "newuser");
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.city, "Raleigh");
        assert!(user.wallet_id.is_none());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("newuser", "new@example.com")).unwrap();

        let err = db
            .create_user(&new_user("newuser", "duplicate@example.com"))
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)), "got {err:?}");

        // Original row untouched
        let user = db.get_user_by_username("newuser").unwrap().unwrap();
        assert_eq!(user.email, "new@example.com");
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("newuser1", "new@example.com")).unwrap();

        let err = db
            .create_user(&new_user("newuser2", "new@example.com"))
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)), "got {err:?}");
        assert!(db.get_user_by_username("newuser2").unwrap().is_none());
    }

    #[test]
    fn null_phone_number_fails_the_write() {
        let db = Database::open_in_memory().unwrap();

        let err = db
            .with_conn_mut(|conn| {
                conn.execute(
                    "INSERT INTO users (username, first_name, middle_name, last_name, email, password_hash,
                                        phone_number, address_line1, address_line2, city, state, zip_code, country)
                     VALUES ('newUser2', 'New', 'N', 'User', 'new2@example.com', 'hash',
                             NULL, '123 User Street', 'Apartment 5B', 'Raleigh', 'NC', '27519', 'USA')",
                    [],
                )?;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, DbError::Constraint(_)), "got {err:?}");
    }

    #[test]
    fn deleted_user_is_gone() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("newUser3", "new3@example.com")).unwrap();

        assert!(db.delete_user("newUser3").unwrap());
        assert!(db.get_user_by_username("newUser3").unwrap().is_none());
        assert!(!db.delete_user("newUser3").unwrap());
    }

    #[test]
    fn set_wallet_id_reports_missing_user() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("aklevans", "alex@email.com")).unwrap();

        assert!(db.set_wallet_id("aklevans", "0xabc").unwrap());
        assert!(!db.set_wallet_id("nobody", "0xabc").unwrap());

        let user = db.get_user_by_username("aklevans").unwrap().unwrap();
        assert_eq!(user.wallet_id.as_deref(), Some("0xabc"));
    }

    #[test]
    fn friendships_are_symmetric_and_unique() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("aklevans", "alex@email.com")).unwrap();
        db.create_user(&new_user("vsiyer", "varun@email.com")).unwrap();
        db.create_user(&new_user("zed", "zed@email.com")).unwrap();

        assert!(db.add_friend("vsiyer", "aklevans").unwrap());
        assert!(db.add_friend("aklevans", "zed").unwrap());

        let err = db.add_friend("aklevans", "vsiyer").unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)), "got {err:?}");

        assert_eq!(db.get_friends("aklevans").unwrap(), vec!["vsiyer", "zed"]);
        assert_eq!(db.get_friends("vsiyer").unwrap(), vec!["aklevans"]);

        // The rejected duplicate left no second notification behind
        assert_eq!(db.get_notifications("vsiyer", 10).unwrap().len(), 0);
        assert_eq!(db.get_notifications("aklevans", 10).unwrap().len(), 1);
    }

    #[test]
    fn friend_must_exist() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("aklevans", "alex@email.com")).unwrap();

        assert!(!db.add_friend("aklevans", "ghost").unwrap());
        assert!(db.get_friends("aklevans").unwrap().is_empty());
    }

    #[test]
    fn notifications_are_listed_newest_first() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("aklevans", "alex@email.com")).unwrap();

        notify(&db, "n1", "first");
        notify(&db, "n2", "second");
        notify(&db, "n3", "third");

        let rows = db.get_notifications("aklevans", 2).unwrap();
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second"]);
    }

    #[test]
    fn deleting_user_cascades_to_notifications_and_friends() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("aklevans", "alex@email.com")).unwrap();
        db.create_user(&new_user("vsiyer", "varun@email.com")).unwrap();
        db.add_friend("aklevans", "vsiyer").unwrap();
        notify(&db, "n1", "hi");

        db.delete_user("aklevans").unwrap();

        assert!(db.get_friends("vsiyer").unwrap().is_empty());
        let orphaned: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM notifications WHERE username = 'aklevans'",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(orphaned, 0);
    }
}
