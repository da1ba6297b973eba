//! Defines the route handler for the page for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, get_accounts_by_user},
    endpoints,
    html::{FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, base, dollar_input_styles, submit_button},
    navigation::NavBar,
    timezone::local_today,
    transaction::{
        TransactionType,
        form::{TransactionFormValues, no_accounts_message, transaction_form_fields},
    },
    user::UserId,
};

/// The state needed for create new transaction page.
#[derive(Debug, Clone)]
pub struct CreateTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn create_transaction_view(accounts: &[Account], today: Date) -> Markup {
    let content = html!(
        (NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class=(FORM_CONTAINER_STYLE)
            {
                h1 class="text-xl font-bold mb-4" { "New Transaction" }

                @if accounts.is_empty() {
                    (no_accounts_message())
                } @else {
                    form
                        hx-post=(endpoints::TRANSACTIONS_API)
                        hx-indicator="#indicator"
                        hx-disabled-elt="#submit-button"
                        hx-target-error="#alert-container"
                        class="w-full space-y-4 md:space-y-6"
                    {
                        (transaction_form_fields(accounts, &TransactionFormValues {
                            account_id: None,
                            description: "",
                            amount: String::new(),
                            transaction_type: TransactionType::Expense,
                            category: None,
                            date: today,
                            max_date: today,
                        }))

                        (submit_button("Create Transaction"))
                    }
                }
            }
        }
    );

    base("Create Transaction", &[dollar_input_styles()], &content)
}

/// Renders the page for recording a transaction against one of the user's accounts.
pub async fn get_create_transaction_page(
    State(state): State<CreateTransactionPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_accounts_by_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get accounts for user {user_id}: {error}"))?;

    Ok(create_transaction_view(&accounts, today).into_response())
}

#[cfg(test)]
mod create_transaction_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rust_decimal::Decimal;
    use scraper::Selector;

    use crate::{
        account::{AccountType, NewAccount, create_account},
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button_with_text, assert_hx_endpoint,
            assert_valid_html, get_test_connection, must_get_form, parse_html_document, seed_user,
        },
    };

    use super::{CreateTransactionPageState, get_create_transaction_page};

    #[tokio::test]
    async fn renders_transaction_form() {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let account = create_account(
            NewAccount {
                user_id: user.id,
                name: "Everyday".to_owned(),
                account_type: AccountType::Checking,
                initial_balance: Decimal::ZERO,
            },
            &connection,
        )
        .unwrap();
        let state = CreateTransactionPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_create_transaction_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "description", "text");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "date", "date");
        assert_form_submit_button_with_text(&form, "Create Transaction");

        let account_options: Vec<_> = form
            .select(&Selector::parse("select[name='account_id'] option").unwrap())
            .filter_map(|option| option.attr("value"))
            .collect();
        assert_eq!(account_options, vec![account.id.to_string()]);

        let category_groups = form
            .select(&Selector::parse("select[name='category'] optgroup").unwrap())
            .count();
        assert_eq!(category_groups, 2);
        let category_options = form
            .select(&Selector::parse("select[name='category'] option").unwrap())
            .count();
        assert_eq!(category_options, 16);
    }

    #[tokio::test]
    async fn without_accounts_links_to_create_account() {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let state = CreateTransactionPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_create_transaction_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert!(
            document
                .select(&Selector::parse("form").unwrap())
                .next()
                .is_none()
        );
        let link = document
            .select(&Selector::parse("main a").unwrap())
            .next()
            .expect("expected a link to the create account page");
        assert_eq!(link.attr("href"), Some(endpoints::NEW_ACCOUNT_VIEW));
    }
}
