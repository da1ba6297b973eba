//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{AccountId, find_account},
    database_id::DatabaseId,
    money::{from_cents, to_cents},
    user::UserId,
};

pub type TransactionId = DatabaseId;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money came in or went out. The amount of a transaction is always
/// positive, the sign is carried by the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub const ALL: [TransactionType; 2] = [TransactionType::Income, TransactionType::Expense];

    pub fn code(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What a transaction was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Salary,
    Freelance,
    InvestmentIncome,
    OtherIncome,
    Housing,
    Utilities,
    Groceries,
    DiningOut,
    Transportation,
    Healthcare,
    Entertainment,
    Shopping,
    Education,
    Insurance,
    DebtPayment,
    OtherExpense,
}

struct CategoryInfo {
    category: Category,
    code: &'static str,
    display_name: &'static str,
    transaction_type: TransactionType,
}

/// Every category with its storage code, label and the only transaction type it may be used with.
static CATEGORY_TABLE: [CategoryInfo; 16] = [
    CategoryInfo {
        category: Category::Salary,
        code: "SALARY",
        display_name: "Salary",
        transaction_type: TransactionType::Income,
    },
    CategoryInfo {
        category: Category::Freelance,
        code: "FREELANCE",
        display_name: "Freelance",
        transaction_type: TransactionType::Income,
    },
    CategoryInfo {
        category: Category::InvestmentIncome,
        code: "INVESTMENT_INCOME",
        display_name: "Investment Income",
        transaction_type: TransactionType::Income,
    },
    CategoryInfo {
        category: Category::OtherIncome,
        code: "OTHER_INCOME",
        display_name: "Other Income",
        transaction_type: TransactionType::Income,
    },
    CategoryInfo {
        category: Category::Housing,
        code: "HOUSING",
        display_name: "Housing",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::Utilities,
        code: "UTILITIES",
        display_name: "Utilities",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::Groceries,
        code: "GROCERIES",
        display_name: "Groceries",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::DiningOut,
        code: "DINING_OUT",
        display_name: "Dining Out",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::Transportation,
        code: "TRANSPORTATION",
        display_name: "Transportation",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::Healthcare,
        code: "HEALTHCARE",
        display_name: "Healthcare",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::Entertainment,
        code: "ENTERTAINMENT",
        display_name: "Entertainment",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::Shopping,
        code: "SHOPPING",
        display_name: "Shopping",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::Education,
        code: "EDUCATION",
        display_name: "Education",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::Insurance,
        code: "INSURANCE",
        display_name: "Insurance",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::DebtPayment,
        code: "DEBT_PAYMENT",
        display_name: "Debt Payment",
        transaction_type: TransactionType::Expense,
    },
    CategoryInfo {
        category: Category::OtherExpense,
        code: "OTHER_EXPENSE",
        display_name: "Other Expense",
        transaction_type: TransactionType::Expense,
    },
];

impl Category {
    fn info(&self) -> &'static CategoryInfo {
        // The table lists the variants in declaration order.
        &CATEGORY_TABLE[*self as usize]
    }

    pub fn code(&self) -> &'static str {
        self.info().code
    }

    pub fn display_name(&self) -> &'static str {
        self.info().display_name
    }

    /// The transaction type this category is classified under.
    pub fn transaction_type(&self) -> TransactionType {
        self.info().transaction_type
    }

    pub fn from_code(code: &str) -> Option<Self> {
        CATEGORY_TABLE
            .iter()
            .find(|info| info.code == code)
            .map(|info| info.category)
    }

    /// The categories classified under `transaction_type`, in display order.
    pub fn for_type(transaction_type: TransactionType) -> impl Iterator<Item = Category> {
        CATEGORY_TABLE
            .iter()
            .filter(move |info| info.transaction_type == transaction_type)
            .map(|info| info.category)
    }

    pub fn expense_categories() -> impl Iterator<Item = Category> {
        Self::for_type(TransactionType::Expense)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

macro_rules! impl_text_code_sql {
    ($type:ty, $label:literal) => {
        impl ToSql for $type {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.code()))
            }
        }

        impl FromSql for $type {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let code = value.as_str()?;

                <$type>::from_code(code).ok_or_else(|| {
                    FromSqlError::Other(format!(concat!("unknown ", $label, " {}"), code).into())
                })
            }
        }
    };
}

impl_text_code_sql!(TransactionType, "transaction type");
impl_text_code_sql!(Category, "category");

/// An expense or income recorded against one of the user's accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub description: String,
    /// Always greater than zero.
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub category: Category,
    pub date: Date,
}

/// The data needed to create or update a [Transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub category: Category,
    pub date: Date,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            transaction_type TEXT NOT NULL,
            category TEXT NOT NULL,
            date TEXT NOT NULL
        )",
        (),
    )?;

    // Speed up the per-account counts and the date range sums.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_account_date
        ON \"transaction\"(account_id, date)",
        (),
    )?;

    Ok(())
}

const SELECT_TRANSACTION: &str = "SELECT t.id, t.account_id, t.description, t.amount, \
    t.transaction_type, t.category, t.date \
    FROM \"transaction\" t INNER JOIN account a ON t.account_id = a.id";

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        description: row.get(2)?,
        amount: from_cents(row.get(3)?),
        transaction_type: row.get(4)?,
        category: row.get(5)?,
        date: row.get(6)?,
    })
}

/// Check the business rules for a transaction and return the trimmed description.
fn validate(transaction: &NewTransaction, user_id: UserId, connection: &Connection) -> Result<String, Error> {
    let description = transaction.description.trim();

    if description.is_empty() {
        return Err(Error::Validation("Description is required.".to_owned()));
    }

    if transaction.amount <= Decimal::ZERO {
        return Err(Error::Validation(
            "Amount must be greater than 0.".to_owned(),
        ));
    }

    if transaction.category.transaction_type() != transaction.transaction_type {
        return Err(Error::Validation(format!(
            "{} is not an {} category.",
            transaction.category,
            transaction.transaction_type.display_name().to_lowercase()
        )));
    }

    if find_account(transaction.account_id, user_id, connection)?.is_none() {
        return Err(Error::Validation(
            "Please select one of your accounts.".to_owned(),
        ));
    }

    Ok(description.to_owned())
}

/// Record a new transaction against one of the user's accounts.
///
/// The account balance is not changed.
///
/// # Errors
/// Returns [Error::Validation] if the description is blank, the amount is not
/// positive, the category does not match the type or the account does not
/// belong to `user_id`.
pub fn create_transaction(
    transaction: NewTransaction,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let description = validate(&transaction, user_id, connection)?;

    connection.execute(
        "INSERT INTO \"transaction\" (account_id, description, amount, transaction_type, category, date)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            transaction.account_id,
            description,
            to_cents(transaction.amount)?,
            transaction.transaction_type,
            transaction.category,
            transaction.date,
        ],
    )?;

    Ok(Transaction {
        id: connection.last_insert_rowid(),
        account_id: transaction.account_id,
        description,
        amount: transaction.amount,
        transaction_type: transaction.transaction_type,
        category: transaction.category,
        date: transaction.date,
    })
}

/// Get one of the user's transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!("{SELECT_TRANSACTION} WHERE t.id = ?1 AND a.user_id = ?2"))?
        .query_row(params![id, user_id.as_i64()], map_transaction_row)
        .map_err(Error::from)
}

/// Get all of the user's transactions, newest first.
pub fn get_transactions_by_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    // Sort by date, and then ID to keep transaction order stable after updates
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE a.user_id = ?1 ORDER BY t.date DESC, t.id DESC"
        ))?
        .query_map([user_id.as_i64()], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Replace every field of one of the user's transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user, and the same validation errors as [create_transaction].
pub fn update_transaction(
    id: TransactionId,
    transaction: NewTransaction,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let description = validate(&transaction, user_id, connection)?;

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
        SET account_id = ?1, description = ?2, amount = ?3, transaction_type = ?4,
            category = ?5, date = ?6
        WHERE id = ?7
            AND account_id IN (SELECT id FROM account WHERE user_id = ?8)",
        params![
            transaction.account_id,
            description,
            to_cents(transaction.amount)?,
            transaction.transaction_type,
            transaction.category,
            transaction.date,
            id,
            user_id.as_i64(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(Transaction {
        id,
        account_id: transaction.account_id,
        description,
        amount: transaction.amount,
        transaction_type: transaction.transaction_type,
        category: transaction.category,
        date: transaction.date,
    })
}

/// Delete one of the user's transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\"
        WHERE id = ?1 AND account_id IN (SELECT id FROM account WHERE user_id = ?2)",
        params![id, user_id.as_i64()],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// The number of transactions recorded against an account.
pub fn count_transactions_for_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(*) FROM \"transaction\" WHERE account_id = ?1",
            [account_id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}
