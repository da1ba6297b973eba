//! The user table and the queries for registering, looking up, editing and removing users.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// Keeps user IDs from being mixed up with account, transaction or budget IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The email the user logs in with. Unique across all users.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

impl User {
    /// The name to greet the user with, e.g. "Jane Doe".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The details needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The email the user logs in with.
    pub email: String,
    /// The hashed password.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Emails are compared without case or surrounding whitespace.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_names(first_name: &str, last_name: &str) -> Result<(), Error> {
    if first_name.trim().is_empty() {
        return Err(Error::Validation("First name is required".to_owned()));
    }

    if last_name.trim().is_empty() {
        return Err(Error::Validation("Last name is required".to_owned()));
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), Error> {
    let is_plausible = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));

    if is_plausible {
        Ok(())
    } else {
        Err(Error::Validation(
            "Please enter a valid email address".to_owned(),
        ))
    }
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::Validation] if a name is blank or the email is malformed,
/// - [Error::Conflict] if the email is already registered,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let email = normalize_email(&new_user.email);
    validate_names(&new_user.first_name, &new_user.last_name)?;
    validate_email(&email)?;

    if !is_email_available(&email, connection)? {
        return Err(Error::Conflict(
            "A user with this email already exists.".to_owned(),
        ));
    }

    let first_name = new_user.first_name.trim().to_owned();
    let last_name = new_user.last_name.trim().to_owned();

    connection.execute(
        "INSERT INTO user (first_name, last_name, email, password) VALUES (?1, ?2, ?3, ?4)",
        params![
            first_name,
            last_name,
            email,
            new_user.password_hash.as_ref()
        ],
    )?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        first_name,
        last_name,
        email,
        password_hash: new_user.password_hash,
    })
}

pub(crate) fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(4)?;

    Ok(User {
        id: UserId::new(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, first_name, last_name, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row_to_user)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that email.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, first_name, last_name, email, password FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", &normalize_email(email))], map_row_to_user)
        .map_err(|error| error.into())
}

/// Whether no user has registered with `email` yet.
pub fn is_email_available(email: &str, connection: &Connection) -> Result<bool, Error> {
    let existing: Option<i64> = connection
        .query_row(
            "SELECT id FROM user WHERE email = ?1",
            params![normalize_email(email)],
            |row| row.get(0),
        )
        .optional()?;

    Ok(existing.is_none())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))?;

    // COUNT is never negative.
    Ok(count.max(0) as usize)
}

/// Change a user's name and email.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if the user does not exist,
/// - [Error::Conflict] if `email` belongs to a different user,
/// - [Error::Validation] if a name is blank or the email is malformed.
pub fn update_user(
    user_id: UserId,
    first_name: &str,
    last_name: &str,
    email: &str,
    connection: &Connection,
) -> Result<User, Error> {
    let email = normalize_email(email);
    validate_names(first_name, last_name)?;
    validate_email(&email)?;

    let existing = get_user_by_id(user_id, connection)?;

    if existing.email != email && !is_email_available(&email, connection)? {
        return Err(Error::Conflict(
            "A user with this email already exists.".to_owned(),
        ));
    }

    let first_name = first_name.trim().to_owned();
    let last_name = last_name.trim().to_owned();

    connection.execute(
        "UPDATE user SET first_name = ?1, last_name = ?2, email = ?3 WHERE id = ?4",
        params![first_name, last_name, email, user_id.as_i64()],
    )?;

    Ok(User {
        first_name,
        last_name,
        email,
        ..existing
    })
}

/// Remove a user along with their accounts, transactions and budgets.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn delete_user(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM user WHERE id = ?1",
        params![user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::PasswordHash,
        db::initialize,
        user::{
            NewUser, UserId, count_users, create_user, delete_user, get_user_by_email,
            get_user_by_id, is_email_available, update_user,
        },
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&conn).expect("Could not initialize database");

        conn
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            email: email.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("jane@example.com"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "jane@example.com");
        assert_eq!(inserted_user.full_name(), "Jane Doe");
    }

    #[test]
    fn insert_user_normalizes_email() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("  Jane@Example.COM "), &db_connection).unwrap();

        assert_eq!(inserted_user.email, "jane@example.com");
    }

    #[test]
    fn insert_user_rejects_duplicate_email() {
        let db_connection = get_db_connection();
        create_user(new_user("jane@example.com"), &db_connection).unwrap();

        let result = create_user(new_user("JANE@example.com"), &db_connection);

        assert!(matches!(result, Err(Error::Conflict(_))), "got {result:?}");
        assert_eq!(count_users(&db_connection), Ok(1));
    }

    #[test]
    fn insert_user_rejects_blank_name() {
        let db_connection = get_db_connection();
        let user = NewUser {
            first_name: "   ".to_owned(),
            ..new_user("jane@example.com")
        };

        let result = create_user(user, &db_connection);

        assert_eq!(
            result,
            Err(Error::Validation("First name is required".to_owned()))
        );
    }

    #[test]
    fn insert_user_rejects_malformed_email() {
        let db_connection = get_db_connection();

        let result = create_user(new_user("not-an-email"), &db_connection);

        assert!(matches!(result, Err(Error::Validation(_))), "got {result:?}");
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        assert_eq!(
            get_user_by_id(UserId::new(42), &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("jane@example.com"), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_email_ignores_case() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("jane@example.com"), &db_connection).unwrap();

        let retrieved_user = get_user_by_email("Jane@Example.com", &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
        assert_eq!(
            get_user_by_email("john@example.com", &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn email_availability() {
        let db_connection = get_db_connection();
        create_user(new_user("jane@example.com"), &db_connection).unwrap();

        assert_eq!(is_email_available("jane@example.com", &db_connection), Ok(false));
        assert_eq!(is_email_available("john@example.com", &db_connection), Ok(true));
    }

    #[test]
    fn returns_correct_count() {
        let db_connection = get_db_connection();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(0, count, "Want zero users before insertion, got {count}");

        create_user(new_user("jane@example.com"), &db_connection).unwrap();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(1, count, "Want one user after insertion, got {count}");
    }

    #[test]
    fn update_user_changes_name_and_email() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("jane@example.com"), &db_connection).unwrap();

        let updated = update_user(user.id, "Janet", "Smith", "janet@example.com", &db_connection)
            .unwrap();

        assert_eq!(updated.full_name(), "Janet Smith");
        assert_eq!(updated.email, "janet@example.com");
        assert_eq!(get_user_by_id(user.id, &db_connection), Ok(updated));
    }

    #[test]
    fn update_user_keeps_own_email() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("jane@example.com"), &db_connection).unwrap();

        let result = update_user(user.id, "Janet", "Doe", "jane@example.com", &db_connection);

        assert!(result.is_ok(), "got {result:?}");
    }

    #[test]
    fn update_user_rejects_colliding_email() {
        let db_connection = get_db_connection();
        create_user(new_user("john@example.com"), &db_connection).unwrap();
        let user = create_user(new_user("jane@example.com"), &db_connection).unwrap();

        let result = update_user(user.id, "Jane", "Doe", "john@example.com", &db_connection);

        assert!(matches!(result, Err(Error::Conflict(_))), "got {result:?}");
    }

    #[test]
    fn update_missing_user_is_not_found() {
        let db_connection = get_db_connection();

        let result = update_user(
            UserId::new(7),
            "Jane",
            "Doe",
            "jane@example.com",
            &db_connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_user_removes_user() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("jane@example.com"), &db_connection).unwrap();

        delete_user(user.id, &db_connection).unwrap();

        assert_eq!(get_user_by_id(user.id, &db_connection), Err(Error::NotFound));
        assert_eq!(delete_user(user.id, &db_connection), Err(Error::NotFound));
    }
}
