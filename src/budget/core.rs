//! Monthly spending ceilings per expense category.

use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use rust_decimal::Decimal;
use time::Month;

use crate::{
    Error,
    database_id::DatabaseId,
    money::{from_cents, to_cents},
    month::YearMonth,
    transaction::{Category, TransactionType},
    user::UserId,
};

pub type BudgetId = DatabaseId;

/// How much a user plans to spend on one category in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserId,
    /// Always an expense category.
    pub category: Category,
    pub month: YearMonth,
    /// The planned amount, never negative.
    pub amount: Decimal,
}

/// The data needed to create a [Budget].
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    /// The user that owns the budget.
    pub user_id: UserId,
    /// The expense category the budget applies to.
    pub category: Category,
    /// The calendar month the budget applies to.
    pub month: YearMonth,
    /// The planned amount, must not be negative.
    pub amount: Decimal,
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category TEXT NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            amount INTEGER NOT NULL CHECK (amount >= 0),
            UNIQUE(user_id, category, year, month)
        )",
        (),
    )?;

    Ok(())
}

const SELECT_BUDGET: &str = "SELECT id, user_id, category, year, month, amount FROM budget";

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    let month_number: u8 = row.get(4)?;
    let month = Month::try_from(month_number).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, Type::Integer, Box::new(error))
    })?;

    Ok(Budget {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        category: row.get(2)?,
        month: YearMonth::new(row.get(3)?, month),
        amount: from_cents(row.get(5)?),
    })
}

/// Plan a budget for an expense category in a month.
///
/// # Errors
/// Returns [Error::Validation] if the category is an income category or the
/// amount is negative, and [Error::Conflict] if the user already has a budget
/// for the category in that month.
pub fn create_budget(budget: NewBudget, connection: &Connection) -> Result<Budget, Error> {
    if budget.category.transaction_type() != TransactionType::Expense {
        return Err(Error::Validation(format!(
            "{} is an income category. Budgets can only be set for expense categories.",
            budget.category
        )));
    }

    if budget.amount < Decimal::ZERO {
        return Err(Error::Validation(
            "Budget amount cannot be negative.".to_owned(),
        ));
    }

    if budget_exists(budget.user_id, budget.category, budget.month, connection)? {
        return Err(Error::Conflict(format!(
            "There is already a budget for {} in {}.",
            budget.category, budget.month
        )));
    }

    connection.execute(
        "INSERT INTO budget (user_id, category, year, month, amount)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            budget.user_id.as_i64(),
            budget.category,
            budget.month.year,
            budget.month.month as u8,
            to_cents(budget.amount)?,
        ],
    )?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        user_id: budget.user_id,
        category: budget.category,
        month: budget.month,
        amount: budget.amount,
    })
}

/// The user's budgets for `month`, in category display order.
pub fn find_budgets_by_user_and_month(
    user_id: UserId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    let mut budgets = connection
        .prepare(&format!(
            "{SELECT_BUDGET} WHERE user_id = ?1 AND year = ?2 AND month = ?3"
        ))?
        .query_map(
            params![user_id.as_i64(), month.year, month.month as u8],
            map_budget_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    budgets.sort_by_key(|budget| budget.category as usize);

    Ok(budgets)
}

/// The user's budget for `category` in `month`, if there is one.
pub fn find_budget(
    user_id: UserId,
    category: Category,
    month: YearMonth,
    connection: &Connection,
) -> Result<Option<Budget>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_BUDGET} WHERE user_id = ?1 AND category = ?2 AND year = ?3 AND month = ?4"
        ))?
        .query_row(
            params![user_id.as_i64(), category, month.year, month.month as u8],
            map_budget_row,
        )
        .optional()
        .map_err(Error::from)
}

/// All of the user's budgets, newest month first.
pub fn find_budgets_by_user(user_id: UserId, connection: &Connection) -> Result<Vec<Budget>, Error> {
    let mut budgets = connection
        .prepare(&format!("{SELECT_BUDGET} WHERE user_id = ?1"))?
        .query_map([user_id.as_i64()], map_budget_row)?
        .collect::<Result<Vec<_>, _>>()?;

    budgets.sort_by(|a, b| {
        b.month
            .year
            .cmp(&a.month.year)
            .then((b.month.month as u8).cmp(&(a.month.month as u8)))
            .then((a.category as usize).cmp(&(b.category as usize)))
    });

    Ok(budgets)
}

pub fn budget_exists(
    user_id: UserId,
    category: Category,
    month: YearMonth,
    connection: &Connection,
) -> Result<bool, Error> {
    find_budget(user_id, category, month, connection).map(|budget| budget.is_some())
}

/// Delete one of the user's budgets.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not exist or belongs to another user.
pub fn delete_budget(id: BudgetId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}
