//! Defines the route handler for the page for creating an account.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    account::AccountType,
    endpoints,
    html::{
        FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TextInput, base, dollar_input_styles, submit_button,
    },
    navigation::NavBar,
};

/// A drop down for picking the account type, with `selected` chosen.
pub(super) fn account_type_select(selected: AccountType) -> Markup {
    html!(
        div
        {
            label for="account_type" class=(FORM_LABEL_STYLE) { "Type" }

            select
                name="account_type"
                id="account_type"
                class=(FORM_TEXT_INPUT_STYLE)
                required
            {
                @for account_type in AccountType::ALL {
                    option
                        value=(account_type.code())
                        selected[account_type == selected]
                    {
                        (account_type.display_name())
                    }
                }
            }
        }
    )
}

/// A dollar amount input that accepts cents.
pub(super) fn balance_input(name: &str, label: &str, value: &str) -> Markup {
    html!(
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            div class="input-wrapper w-full"
            {
                input
                    type="number"
                    name=(name)
                    id=(name)
                    step="0.01"
                    placeholder="0.00"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(value);
            }
        }
    )
}

fn create_account_view() -> Markup {
    let content = html!(
        (NavBar::new(endpoints::NEW_ACCOUNT_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class=(FORM_CONTAINER_STYLE)
            {
                h1 class="text-xl font-bold mb-4" { "Add Account" }

                form
                    hx-post=(endpoints::ACCOUNTS_API)
                    hx-indicator="#indicator"
                    hx-disabled-elt="#submit-button"
                    hx-target-error="#alert-container"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (TextInput {
                        name: "name",
                        label: "Name",
                        input_type: "text",
                        value: "",
                        placeholder: "Everyday Account",
                        error_message: None,
                    }.into_html())

                    (account_type_select(AccountType::Checking))

                    (balance_input("initial_balance", "Initial Balance", ""))

                    (submit_button("Create Account"))
                }
            }
        }
    );

    base("Add Account", &[dollar_input_styles()], &content)
}

/// Renders the page for creating an account.
pub async fn get_create_account_page() -> Response {
    create_account_view().into_response()
}
