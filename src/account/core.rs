use rusqlite::{
    Connection, OptionalExtension, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    Error,
    database_id::DatabaseId,
    money::{from_cents, to_cents},
    transaction::count_transactions_for_account,
    user::UserId,
};

pub type AccountId = DatabaseId;

/// The kind of an account, which decides whether its balance counts towards
/// or against net worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
}

impl AccountType {
    /// Every account type in the order they are shown in forms.
    pub const ALL: [AccountType; 3] = [
        AccountType::Checking,
        AccountType::Savings,
        AccountType::CreditCard,
    ];

    /// The code stored in the database and sent by forms.
    pub fn code(&self) -> &'static str {
        match self {
            AccountType::Checking => "CHECKING",
            AccountType::Savings => "SAVINGS",
            AccountType::CreditCard => "CREDIT_CARD",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
            AccountType::CreditCard => "Credit Card",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|account_type| account_type.code() == code)
    }

    /// Credit card balances are owed, everything else is owned.
    pub fn is_liability(&self) -> bool {
        matches!(self, AccountType::CreditCard)
    }
}

impl ToSql for AccountType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for AccountType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;

        AccountType::from_code(code)
            .ok_or_else(|| FromSqlError::Other(format!("unknown account type {code}").into()))
    }
}

/// A bank account or credit card owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub name: String,
    pub account_type: AccountType,
    /// The balance when the account was created. Never changes.
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
}

/// The data needed to create an [Account].
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub user_id: UserId,
    pub name: String,
    pub account_type: AccountType,
    pub initial_balance: Decimal,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            initial_balance INTEGER NOT NULL,
            current_balance INTEGER NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_user ON account(user_id)",
        (),
    )?;

    Ok(())
}

const SELECT_ACCOUNT: &str =
    "SELECT id, user_id, name, account_type, initial_balance, current_balance FROM account";

fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
        account_type: row.get(3)?,
        initial_balance: from_cents(row.get(4)?),
        current_balance: from_cents(row.get(5)?),
    })
}

fn validate_account_name(name: &str) -> Result<&str, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::Validation("Account name is required.".to_owned()));
    }

    Ok(name)
}

/// Create a new account whose current balance starts at its initial balance.
///
/// # Errors
/// Returns [Error::Validation] if the owning user does not exist, the name is
/// blank or the initial balance is negative.
pub fn create_account(account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    let name = validate_account_name(&account.name)?;

    if account.initial_balance < Decimal::ZERO {
        return Err(Error::Validation(
            "Initial balance cannot be negative.".to_owned(),
        ));
    }

    let user_exists: bool = connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM user WHERE id = ?1)",
        [account.user_id.as_i64()],
        |row| row.get(0),
    )?;

    if !user_exists {
        return Err(Error::Validation(
            "An account must belong to an existing user.".to_owned(),
        ));
    }

    let balance_cents = to_cents(account.initial_balance)?;

    connection.execute(
        "INSERT INTO account (user_id, name, account_type, initial_balance, current_balance)
        VALUES (?1, ?2, ?3, ?4, ?4)",
        params![
            account.user_id.as_i64(),
            name,
            account.account_type,
            balance_cents
        ],
    )?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        user_id: account.user_id,
        name: name.to_owned(),
        account_type: account.account_type,
        initial_balance: account.initial_balance,
        current_balance: account.initial_balance,
    })
}

/// Get an account by its ID, or `None` if it does not exist or belongs to another user.
pub fn find_account(
    id: AccountId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Option<Account>, Error> {
    connection
        .prepare(&format!("{SELECT_ACCOUNT} WHERE id = ?1 AND user_id = ?2"))?
        .query_row(params![id, user_id.as_i64()], map_row_to_account)
        .optional()
        .map_err(Error::from)
}

/// Get an account by its ID.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn get_account(id: AccountId, user_id: UserId, connection: &Connection) -> Result<Account, Error> {
    find_account(id, user_id, connection)?.ok_or(Error::NotFound)
}

/// Get the user's accounts ordered by name.
pub fn get_accounts_by_user(user_id: UserId, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_ACCOUNT} WHERE user_id = ?1 ORDER BY name ASC, id ASC"
        ))?
        .query_map([user_id.as_i64()], map_row_to_account)?
        .map(|account_result| account_result.map_err(Error::from))
        .collect()
}

/// Get the user's accounts of one type ordered by name.
pub fn get_accounts_by_user_and_type(
    user_id: UserId,
    account_type: AccountType,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_ACCOUNT} WHERE user_id = ?1 AND account_type = ?2 ORDER BY name ASC, id ASC"
        ))?
        .query_map(params![user_id.as_i64(), account_type], map_row_to_account)?
        .map(|account_result| account_result.map_err(Error::from))
        .collect()
}

/// The sum of the user's asset balances minus the sum of their credit card balances.
pub fn calculate_net_worth(user_id: UserId, connection: &Connection) -> Result<Decimal, Error> {
    let cents: i64 = connection.query_row(
        "SELECT COALESCE(SUM(
            CASE WHEN account_type = ?2 THEN -current_balance ELSE current_balance END
        ), 0)
        FROM account WHERE user_id = ?1",
        params![user_id.as_i64(), AccountType::CreditCard],
        |row| row.get(0),
    )?;

    Ok(from_cents(cents))
}

/// Overwrite the current balance of an account.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn update_balance(
    id: AccountId,
    user_id: UserId,
    new_balance: Decimal,
    connection: &Connection,
) -> Result<Account, Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET current_balance = ?1 WHERE id = ?2 AND user_id = ?3",
        params![to_cents(new_balance)?, id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_account(id, user_id, connection)
}

/// Change the name and type of an account. The balances are left untouched.
///
/// # Errors
/// Returns [Error::Validation] for a blank name, or [Error::NotFound] if the
/// account does not exist or belongs to another user.
pub fn update_account_details(
    id: AccountId,
    user_id: UserId,
    name: &str,
    account_type: AccountType,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = validate_account_name(name)?;

    let rows_affected = connection.execute(
        "UPDATE account SET name = ?1, account_type = ?2 WHERE id = ?3 AND user_id = ?4",
        params![name, account_type, id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_account(id, user_id, connection)
}

/// Delete an account that has no transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to
/// another user, or [Error::Conflict] if any transaction references it.
pub fn delete_account(id: AccountId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let account = get_account(id, user_id, connection)?;

    let transaction_count = count_transactions_for_account(id, connection)?;

    if transaction_count > 0 {
        return Err(Error::Conflict(format!(
            "The account '{}' has transactions. Delete its {transaction_count} transaction(s) first.",
            account.name
        )));
    }

    connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    Ok(())
}
