//! Defines the route handler for the page that lists a user's transactions.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Date;

use crate::{
    AppState, Error,
    account::get_accounts_by_user,
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    transaction::{Transaction, TransactionType, get_transactions_by_user},
    user::UserId,
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, PartialEq)]
struct TransactionTableRow {
    date: Date,
    description: String,
    account_name: String,
    category: &'static str,
    /// Negative for expenses.
    signed_amount: Decimal,
    edit_url: String,
    delete_url: String,
}

impl TransactionTableRow {
    fn new(transaction: Transaction, account_names: &HashMap<i64, String>) -> Self {
        let signed_amount = match transaction.transaction_type {
            TransactionType::Income => transaction.amount,
            TransactionType::Expense => -transaction.amount,
        };

        Self {
            date: transaction.date,
            account_name: account_names
                .get(&transaction.account_id)
                .cloned()
                .unwrap_or_default(),
            category: transaction.category.display_name(),
            signed_amount,
            edit_url: format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id),
            delete_url: format_endpoint(endpoints::TRANSACTION, transaction.id),
            description: transaction.description,
        }
    }
}

fn transactions_view(transactions: &[TransactionTableRow]) -> Markup {
    let new_transaction_url = endpoints::NEW_TRANSACTION_VIEW;

    let table_row = |transaction: &TransactionTableRow| {
        let amount_colour = if transaction.signed_amount < Decimal::ZERO {
            "text-red-600 dark:text-red-400"
        } else {
            "text-green-600 dark:text-green-400"
        };

        html!(
            tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
            {
                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                td class=(TABLE_CELL_STYLE) { (transaction.account_name) }
                td class=(TABLE_CELL_STYLE) { (transaction.category) }
                td class={ "px-6 py-4 text-right tabular-nums " (amount_colour) }
                {
                    (format_currency(transaction.signed_amount))
                }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &transaction.edit_url,
                            &transaction.delete_url,
                            &format!(
                                "Are you sure you want to delete '{}'? This cannot be undone.",
                                transaction.description
                            ),
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(new_transaction_url) class=(LINK_STYLE) { "Add Transaction" }
                }

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (table_row(transaction))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions found. Record one "
                                        a href=(new_transaction_url) class=(LINK_STYLE) { "here" }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Transactions", &[], &content)
}

/// Renders the user's transactions, newest first.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account_names: HashMap<i64, String> = get_accounts_by_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get accounts for user {user_id}: {error}"))?
        .into_iter()
        .map(|account| (account.id, account.name))
        .collect();

    let rows: Vec<TransactionTableRow> = get_transactions_by_user(user_id, &connection)
        .inspect_err(|error| {
            tracing::error!("could not get transactions for user {user_id}: {error}")
        })?
        .into_iter()
        .map(|transaction| TransactionTableRow::new(transaction, &account_names))
        .collect();

    Ok(transactions_view(&rows).into_response())
}
