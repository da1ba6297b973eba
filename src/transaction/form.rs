//! The form fields shared by the create and edit transaction pages.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{Account, AccountId},
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, TextInput},
    endpoints,
    money::parse_amount,
    transaction::{Category, NewTransaction, TransactionType},
};

time::serde::format_description!(form_date, Date, "[year]-[month]-[day]");

/// The form data for creating or editing a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    pub account_id: AccountId,
    pub description: String,
    /// The amount in dollars, e.g. "12.50".
    pub amount: String,
    pub transaction_type: TransactionType,
    pub category: Category,
    #[serde(with = "form_date")]
    pub date: Date,
}

impl TransactionForm {
    /// Parse the amount and convert the form into a transaction to save.
    ///
    /// # Errors
    /// Returns [Error::InvalidMoney] if the amount is not a valid dollar amount.
    pub fn into_new_transaction(self) -> Result<NewTransaction, Error> {
        Ok(NewTransaction {
            amount: parse_amount(&self.amount)?,
            account_id: self.account_id,
            description: self.description,
            transaction_type: self.transaction_type,
            category: self.category,
            date: self.date,
        })
    }
}

/// The values to pre-fill the form with.
pub(super) struct TransactionFormValues<'a> {
    pub account_id: Option<AccountId>,
    pub description: &'a str,
    pub amount: String,
    pub transaction_type: TransactionType,
    pub category: Option<Category>,
    pub date: Date,
    pub max_date: Date,
}

pub(super) fn transaction_form_fields(
    accounts: &[Account],
    values: &TransactionFormValues,
) -> Markup {
    html!(
        div
        {
            label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

            select name="account_id" id="account_id" class=(FORM_TEXT_INPUT_STYLE) required
            {
                @for account in accounts {
                    option
                        value=(account.id)
                        selected[values.account_id == Some(account.id)]
                    {
                        (account.name) " (" (account.account_type.display_name()) ")"
                    }
                }
            }
        }

        (TextInput {
            name: "description",
            label: "Description",
            input_type: "text",
            value: values.description,
            placeholder: "Weekly groceries",
            error_message: None,
        }.into_html())

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper w-full"
            {
                input
                    type="number"
                    name="amount"
                    id="amount"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(values.amount);
            }
        }

        div
        {
            label for="transaction_type" class=(FORM_LABEL_STYLE) { "Type" }

            select name="transaction_type" id="transaction_type" class=(FORM_TEXT_INPUT_STYLE) required
            {
                @for transaction_type in TransactionType::ALL {
                    option
                        value=(transaction_type.code())
                        selected[transaction_type == values.transaction_type]
                    {
                        (transaction_type.display_name())
                    }
                }
            }
        }

        div
        {
            label for="category" class=(FORM_LABEL_STYLE) { "Category" }

            select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE) required
            {
                @for transaction_type in TransactionType::ALL {
                    optgroup label=(transaction_type.display_name())
                    {
                        @for category in Category::for_type(transaction_type) {
                            option
                                value=(category.code())
                                selected[values.category == Some(category)]
                            {
                                (category.display_name())
                            }
                        }
                    }
                }
            }
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                type="date"
                name="date"
                id="date"
                max=(values.max_date)
                class=(FORM_TEXT_INPUT_STYLE)
                required
                value=(values.date);
        }
    )
}

/// Shown instead of the form when the user has nowhere to record a transaction.
pub(super) fn no_accounts_message() -> Markup {
    html!(
        p class="text-gray-500 dark:text-gray-400"
        {
            "You need an account before you can record transactions. Create one "
            a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE) { "here" }
            "."
        }
    )
}

#[cfg(test)]
mod transaction_form_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        transaction::{Category, TransactionType},
    };

    use super::TransactionForm;

    #[test]
    fn deserializes_url_encoded_form() {
        let form: TransactionForm = serde_urlencoded::from_str(
            "account_id=3&description=Rent&amount=1200.00&transaction_type=EXPENSE\
            &category=HOUSING&date=2025-03-01",
        )
        .unwrap();

        let transaction = form.into_new_transaction().unwrap();

        assert_eq!(transaction.account_id, 3);
        assert_eq!(transaction.amount, dec!(1200.00));
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        assert_eq!(transaction.category, Category::Housing);
        assert_eq!(transaction.date, date!(2025 - 03 - 01));
    }

    #[test]
    fn invalid_amount_is_rejected() {
        let form: TransactionForm = serde_urlencoded::from_str(
            "account_id=3&description=Rent&amount=abc&transaction_type=EXPENSE\
            &category=HOUSING&date=2025-03-01",
        )
        .unwrap();

        assert_eq!(
            form.into_new_transaction(),
            Err(Error::InvalidMoney("abc".to_owned()))
        );
    }
}
