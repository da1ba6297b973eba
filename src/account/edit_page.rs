use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{
        Account, AccountId, get_account,
        create_page::{account_type_select, balance_input},
    },
    endpoints::{self, format_endpoint},
    html::{
        CARD_STYLE, FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, TextInput, base,
        dollar_input_styles, format_currency, submit_button,
    },
    navigation::NavBar,
    user::UserId,
};

/// The state needed for the edit account page.
#[derive(Debug, Clone)]
pub struct EditAccountPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn edit_account_view(account: &Account) -> Markup {
    let details_url = format_endpoint(endpoints::ACCOUNT, account.id);
    let balance_url = format_endpoint(endpoints::ACCOUNT_BALANCE, account.id);
    let current_balance = format!("{:.2}", account.current_balance);

    let content = html!(
        (NavBar::new(endpoints::EDIT_ACCOUNT_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class={ (FORM_CONTAINER_STYLE) " space-y-8" }
            {
                h1 class="text-xl font-bold" { "Edit Account" }

                form
                    id="account-details-form"
                    hx-put=(details_url)
                    hx-target-error="#alert-container"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (TextInput {
                        name: "name",
                        label: "Name",
                        input_type: "text",
                        value: &account.name,
                        placeholder: "Everyday Account",
                        error_message: None,
                    }.into_html())

                    (account_type_select(account.account_type))

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Initial balance: " (format_currency(account.initial_balance))
                    }

                    (submit_button("Save Details"))
                }

                section class=(CARD_STYLE)
                {
                    h2 class="text-lg font-semibold mb-4" { "Update Balance" }

                    form
                        id="account-balance-form"
                        hx-put=(balance_url)
                        hx-target-error="#alert-container"
                        class="w-full space-y-4"
                    {
                        (balance_input("current_balance", "Current Balance", &current_balance))

                        button type="submit" class="w-full px-4 py-2 rounded border border-blue-500 text-blue-600 dark:text-blue-400"
                        {
                            "Update Balance"
                        }
                    }
                }
            }
        }
    );

    base("Edit Account", &[dollar_input_styles()], &content)
}

/// Renders the page for editing an account's details and balance.
pub async fn get_edit_account_page(
    State(state): State<EditAccountPageState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(account_id, user_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve account {account_id}: {error}");
        }
    })?;

    Ok(edit_account_view(&account).into_response())
}
