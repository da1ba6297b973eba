//! Income and expense transactions recorded against a user's accounts.
//!
//! This module contains:
//! - The [Transaction] model and the closed set of [Category] values
//! - Database functions for storing, querying and summing transactions
//! - View handlers for the transaction pages and HTMX endpoints

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod query;
mod transactions_page;

pub use core::{
    Category, NewTransaction, Transaction, TransactionId, TransactionType,
    count_transactions_for_account, create_transaction, create_transaction_table,
    delete_transaction, get_transaction, get_transactions_by_user, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use query::{
    spending_by_category_and_month, total_expenses_for_user_in_period,
    total_income_for_user_in_period,
};
pub use transactions_page::get_transactions_page;
