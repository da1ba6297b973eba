use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, get_accounts_by_user},
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, base, dollar_input_styles, submit_button},
    navigation::NavBar,
    timezone::local_today,
    transaction::{
        Transaction, TransactionId,
        form::{TransactionFormValues, transaction_form_fields},
        get_transaction,
    },
    user::UserId,
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn edit_transaction_view(transaction: &Transaction, accounts: &[Account], today: Date) -> Markup {
    let update_url = format_endpoint(endpoints::TRANSACTION, transaction.id);
    // Keep the existing date selectable even if it is after the local date.
    let max_date = today.max(transaction.date);

    let content = html!(
        (NavBar::new(endpoints::EDIT_TRANSACTION_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class=(FORM_CONTAINER_STYLE)
            {
                h1 class="text-xl font-bold mb-4" { "Edit Transaction" }

                form
                    hx-put=(update_url)
                    hx-indicator="#indicator"
                    hx-disabled-elt="#submit-button"
                    hx-target-error="#alert-container"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (transaction_form_fields(accounts, &TransactionFormValues {
                        account_id: Some(transaction.account_id),
                        description: &transaction.description,
                        amount: format!("{:.2}", transaction.amount),
                        transaction_type: transaction.transaction_type,
                        category: Some(transaction.category),
                        date: transaction.date,
                        max_date,
                    }))

                    (submit_button("Save Changes"))
                }
            }
        }
    );

    base("Edit Transaction", &[dollar_input_styles()], &content)
}

/// Renders the page for editing one of the user's transactions.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve transaction {transaction_id}: {error}");
        }
    })?;

    let accounts = get_accounts_by_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get accounts for user {user_id}: {error}"))?;

    Ok(edit_transaction_view(&transaction, &accounts, today).into_response())
}
