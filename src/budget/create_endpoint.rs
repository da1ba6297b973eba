//! Defines the endpoint for planning a new budget.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    budget::{NewBudget, create_budget},
    endpoints,
    money::parse_amount,
    month::YearMonth,
    transaction::Category,
    user::UserId,
};

/// The state needed to create a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a budget.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    pub category: Category,
    /// The month as "YYYY-MM".
    pub month: String,
    /// The planned amount in dollars.
    pub amount: String,
}

/// A route handler for creating a budget, redirects to the budgets page for
/// the budget's month on success.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let Some(month) = YearMonth::parse(&form.month) else {
        return Error::Validation(format!("\"{}\" is not a valid month.", form.month))
            .into_alert_response();
    };

    let amount = match parse_amount(&form.amount) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_budget = NewBudget {
        user_id,
        category: form.category,
        month,
        amount,
    };

    match create_budget(new_budget, &connection) {
        Ok(budget) => {
            tracing::info!("User {user_id} created budget {} for {month}", budget.id);
            (
                HxRedirect(format!("{}?month={month}", endpoints::BUDGETS_VIEW)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::warn!("Could not create budget for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod create_budget_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use time::Month;

    use crate::{
        budget::find_budget,
        month::YearMonth,
        test_utils::{assert_hx_redirect, get_test_connection, seed_user},
        transaction::Category,
    };

    use super::{BudgetForm, CreateBudgetState, create_budget_endpoint};

    fn groceries_form() -> BudgetForm {
        BudgetForm {
            category: Category::Groceries,
            month: "2025-03".to_owned(),
            amount: "400.00".to_owned(),
        }
    }

    #[tokio::test]
    async fn can_create_budget() {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let state = CreateBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            create_budget_endpoint(State(state.clone()), Extension(user.id), Form(groceries_form()))
                .await;

        assert_hx_redirect(&response, "/budgets?month=2025-03");
        let budget = find_budget(
            user.id,
            Category::Groceries,
            YearMonth::new(2025, Month::March),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
        .expect("budget should have been created");
        assert_eq!(budget.amount, dec!(400));
    }

    #[tokio::test]
    async fn duplicate_budget_is_a_conflict() {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let state = CreateBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        create_budget_endpoint(State(state.clone()), Extension(user.id), Form(groceries_form()))
            .await;

        let response =
            create_budget_endpoint(State(state), Extension(user.id), Form(groceries_form())).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn income_category_is_rejected() {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let state = CreateBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = BudgetForm {
            category: Category::Freelance,
            ..groceries_form()
        };

        let response = create_budget_endpoint(State(state), Extension(user.id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_month_is_rejected() {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let state = CreateBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = BudgetForm {
            month: "March".to_owned(),
            ..groceries_form()
        };

        let response = create_budget_endpoint(State(state), Extension(user.id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn month_beyond_supported_dates_is_rejected() {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let state = CreateBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = BudgetForm {
            month: "10000-01".to_owned(),
            ..groceries_form()
        };

        let response = create_budget_endpoint(State(state), Extension(user.id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
