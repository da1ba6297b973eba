use rusqlite::Connection;

use crate::{
    auth::PasswordHash,
    db::initialize,
    user::{NewUser, User, create_user},
};

/// An in-memory database with every table created.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");
    initialize(&connection).expect("could not initialize test database");

    connection
}

/// Insert a user named Jane Doe with `email` and a placeholder password hash.
#[track_caller]
pub(crate) fn seed_user(connection: &Connection, email: &str) -> User {
    create_user(
        NewUser {
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            email: email.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        },
        connection,
    )
    .expect("could not create test user")
}
