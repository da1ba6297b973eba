//! The page showing a month of budgets next to what was actually spent.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState, Error,
    budget::{Budget, find_budgets_by_user, find_budgets_by_user_and_month},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        dollar_input_styles, format_currency, submit_button,
    },
    month::YearMonth,
    navigation::NavBar,
    timezone::local_today,
    transaction::{Category, spending_by_category_and_month},
    user::UserId,
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string for the budgets page.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetsQuery {
    /// The month to show as "YYYY-MM", defaults to the current month.
    pub month: Option<String>,
}

#[derive(Debug, PartialEq)]
struct BudgetRow {
    category: &'static str,
    planned: Decimal,
    spent: Decimal,
    delete_url: String,
}

impl BudgetRow {
    fn remaining(&self) -> Decimal {
        self.planned - self.spent
    }
}

fn remaining_colour(remaining: Decimal) -> &'static str {
    if remaining < Decimal::ZERO {
        "text-red-600 dark:text-red-400"
    } else {
        "text-gray-900 dark:text-white"
    }
}

fn budgets_month_url(month: YearMonth) -> String {
    format!("{}?month={month}", endpoints::BUDGETS_VIEW)
}

fn budget_table(rows: &[BudgetRow]) -> Markup {
    let total_planned: Decimal = rows.iter().map(|row| row.planned).sum();
    let total_spent: Decimal = rows.iter().map(|row| row.spent).sum();

    html!(
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class="px-6 py-3 text-right" { "Planned" }
                    th scope="col" class="px-6 py-3 text-right" { "Spent" }
                    th scope="col" class="px-6 py-3 text-right" { "Remaining" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                }
            }

            tbody
            {
                @for row in rows {
                    @let remaining = row.remaining();

                    tr class=(TABLE_ROW_STYLE) data-budget-row="true"
                    {
                        th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                        {
                            (row.category)
                        }
                        td class="px-6 py-4 text-right tabular-nums" { (format_currency(row.planned)) }
                        td class="px-6 py-4 text-right tabular-nums" { (format_currency(row.spent)) }
                        td class={ "px-6 py-4 text-right tabular-nums " (remaining_colour(remaining)) }
                        {
                            (format_currency(remaining))
                        }
                        td class=(TABLE_CELL_STYLE)
                        {
                            button
                                type="button"
                                hx-delete=(row.delete_url)
                                hx-confirm={ "Are you sure you want to delete the budget for " (row.category) "?" }
                                hx-target="closest tr"
                                hx-target-error="#alert-container"
                                hx-swap="delete"
                                class=(BUTTON_DELETE_STYLE)
                            {
                                "Delete"
                            }
                        }
                    }
                }

                @if rows.is_empty() {
                    tr
                    {
                        td colspan="5" class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            "No budgets for this month yet. Add one below."
                        }
                    }
                }
            }

            @if !rows.is_empty() {
                tfoot
                {
                    tr class="font-semibold text-gray-900 dark:text-white" data-budget-total="true"
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                        td class="px-6 py-4 text-right tabular-nums" { (format_currency(total_planned)) }
                        td class="px-6 py-4 text-right tabular-nums" { (format_currency(total_spent)) }
                        td class="px-6 py-4 text-right tabular-nums"
                        {
                            (format_currency(total_planned - total_spent))
                        }
                        td {}
                    }
                }
            }
        }
    )
}

fn create_budget_form(month: YearMonth) -> Markup {
    html!(
        section class=(CARD_STYLE)
        {
            h2 class="text-lg font-semibold mb-4" { "Add Budget" }

            form
                hx-post=(endpoints::BUDGETS_API)
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                input type="hidden" name="month" value=(month);

                div
                {
                    label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                    select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE) required
                    {
                        @for category in Category::expense_categories() {
                            option value=(category.code()) { (category.display_name()) }
                        }
                    }
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Planned Amount" }

                    div class="input-wrapper w-full"
                    {
                        input
                            type="number"
                            name="amount"
                            id="amount"
                            step="0.01"
                            min="0"
                            placeholder="0.00"
                            class=(FORM_TEXT_INPUT_STYLE)
                            required;
                    }
                }

                (submit_button("Add Budget"))
            }
        }
    )
}

fn budgets_view(month: YearMonth, rows: &[BudgetRow], other_months: &[YearMonth]) -> Markup {
    let content = html!(
        (NavBar::new(endpoints::BUDGETS_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Budgets for " (month) }

                    nav class="flex gap-4" aria-label="Budget months"
                    {
                        a href=(budgets_month_url(month.previous())) class=(LINK_STYLE) rel="prev"
                        {
                            "Previous month"
                        }
                        a href=(budgets_month_url(month.next())) class=(LINK_STYLE) rel="next"
                        {
                            "Next month"
                        }
                    }
                }

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    (budget_table(rows))
                }

                (create_budget_form(month))

                @if !other_months.is_empty() {
                    section class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        h2 class="font-semibold mb-2" { "Other months with budgets" }

                        ul class="flex flex-wrap gap-3" data-other-months="true"
                        {
                            @for other_month in other_months {
                                li
                                {
                                    a href=(budgets_month_url(*other_month)) class=(LINK_STYLE)
                                    {
                                        (other_month)
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Budgets", &[dollar_input_styles()], &content)
}

fn to_rows(
    budgets: Vec<Budget>,
    user_id: UserId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<BudgetRow>, Error> {
    budgets
        .into_iter()
        .map(|budget| {
            let spent = spending_by_category_and_month(user_id, budget.category, month, connection)?;

            Ok(BudgetRow {
                category: budget.category.display_name(),
                planned: budget.amount,
                spent,
                delete_url: format_endpoint(endpoints::BUDGET, budget.id),
            })
        })
        .collect()
}

/// Renders the budgets for the requested month with the actual spending per category.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<BudgetsQuery>,
) -> Result<Response, Error> {
    let month = match query.month.as_deref().and_then(YearMonth::parse) {
        Some(month) => month,
        None => YearMonth::containing(local_today(&state.local_timezone)?),
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budgets = find_budgets_by_user_and_month(user_id, month, &connection)
        .inspect_err(|error| tracing::error!("could not get budgets for {month}: {error}"))?;
    let rows = to_rows(budgets, user_id, month, &connection)
        .inspect_err(|error| tracing::error!("could not get spending for {month}: {error}"))?;

    let mut other_months: Vec<YearMonth> = find_budgets_by_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get budgets for user {user_id}: {error}"))?
        .into_iter()
        .map(|budget| budget.month)
        .filter(|budget_month| *budget_month != month)
        .collect();
    other_months.dedup();

    Ok(budgets_view(month, &rows, &other_months).into_response())
}

#[cfg(test)]
mod budgets_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use scraper::{Html, Selector};
    use time::{Month, macros::date};

    use crate::{
        account::{AccountType, NewAccount, create_account},
        budget::{NewBudget, create_budget},
        endpoints,
        month::YearMonth,
        test_utils::{
            assert_hx_endpoint, assert_select_options, assert_valid_html, get_test_connection,
            must_get_form, parse_html_document, seed_user,
        },
        transaction::{Category, NewTransaction, TransactionType, create_transaction},
    };

    use super::{BudgetsPageState, BudgetsQuery, get_budgets_page};

    #[tokio::test]
    async fn shows_planned_spent_and_remaining() {
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
        let march = YearMonth::new(2025, Month::March);
        for (category, amount) in [(Category::Groceries, dec!(400)), (Category::DiningOut, dec!(50))] {
            create_budget(
                NewBudget {
                    user_id: user.id,
                    category,
                    month: march,
                    amount,
                },
                &connection,
            )
            .unwrap();
        }
        create_budget(
            NewBudget {
                user_id: user.id,
                category: Category::Housing,
                month: march.previous(),
                amount: dec!(1200),
            },
            &connection,
        )
        .unwrap();
        for (category, amount) in [(Category::Groceries, dec!(150.25)), (Category::DiningOut, dec!(80))] {
            create_transaction(
                NewTransaction {
                    account_id: account.id,
                    description: "Spending".to_owned(),
                    amount,
                    transaction_type: TransactionType::Expense,
                    category,
                    date: date!(2025 - 03 - 10),
                },
                user.id,
                &connection,
            )
            .unwrap();
        }
        let state = BudgetsPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_budgets_page(
            State(state),
            Extension(user.id),
            Query(BudgetsQuery {
                month: Some("2025-03".to_owned()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            row_texts(&html, "tr[data-budget-row]"),
            vec![
                vec!["Groceries", "$400.00", "$150.25", "$249.75"],
                vec!["Dining Out", "$50.00", "$80.00", "-$30.00"],
            ]
        );
        assert_eq!(
            row_texts(&html, "tr[data-budget-total]"),
            vec![vec!["Total", "$450.00", "$230.25", "$219.75"]]
        );
        let other_months: Vec<String> = html
            .select(&Selector::parse("[data-other-months] a").unwrap())
            .map(|link| link.text().collect())
            .collect();
        assert_eq!(other_months, vec!["2025-02"]);
    }

    #[tokio::test]
    async fn create_form_posts_to_budgets_api_with_month() {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let state = BudgetsPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_budgets_page(
            State(state),
            Extension(user.id),
            Query(BudgetsQuery {
                month: Some("2024-12".to_owned()),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::BUDGETS_API, "hx-post");
        let month_input = form
            .select(&Selector::parse("input[name='month']").unwrap())
            .next()
            .expect("expected a hidden month input");
        assert_eq!(month_input.attr("value"), Some("2024-12"));
        let expense_codes: Vec<&str> = Category::expense_categories()
            .map(|category| category.code())
            .collect();
        assert_select_options(&form, "category", &expense_codes);
        let next = html
            .select(&Selector::parse("a[rel='next']").unwrap())
            .next()
            .unwrap();
        assert_eq!(next.attr("href"), Some("/budgets?month=2025-01"));
    }

    #[tokio::test]
    async fn invalid_month_defaults_to_current_month() {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let state = BudgetsPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let want_month = YearMonth::containing(time::OffsetDateTime::now_utc().date());

        let response = get_budgets_page(
            State(state),
            Extension(user.id),
            Query(BudgetsQuery {
                month: Some("not-a-month".to_owned()),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let heading: String = html
            .select(&Selector::parse("h1").unwrap())
            .next()
            .unwrap()
            .text()
            .collect();
        assert_eq!(heading, format!("Budgets for {want_month}"));
    }

    #[tokio::test]
    async fn out_of_range_month_defaults_to_current_month_and_keeps_database_usable() {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let state = BudgetsPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let want_month = YearMonth::containing(time::OffsetDateTime::now_utc().date());

        let response = get_budgets_page(
            State(state.clone()),
            Extension(user.id),
            Query(BudgetsQuery {
                month: Some("2147483647-12".to_owned()),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let heading: String = html
            .select(&Selector::parse("h1").unwrap())
            .next()
            .unwrap()
            .text()
            .collect();
        assert_eq!(heading, format!("Budgets for {want_month}"));
        assert!(!state.db_connection.is_poisoned());

        let response = get_budgets_page(
            State(state),
            Extension(user.id),
            Query(BudgetsQuery {
                month: Some("2025-03".to_owned()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    fn row_texts(html: &Html, row_selector: &str) -> Vec<Vec<String>> {
        let row_selector = Selector::parse(row_selector).unwrap();
        let cell_selector = Selector::parse("th, td").unwrap();

        html.select(&row_selector)
            .map(|row| {
                row.select(&cell_selector)
                    .take(4)
                    .map(|cell| cell.text().collect::<String>().trim().to_owned())
                    .collect()
            })
            .collect()
    }
}
