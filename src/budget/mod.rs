//! Monthly budgets per expense category and the page comparing them with actual spending.

mod budgets_page;
mod core;
mod create_endpoint;
mod delete_endpoint;

pub use budgets_page::get_budgets_page;
pub use core::{
    Budget, BudgetId, NewBudget, create_budget, create_budget_table, delete_budget,
    find_budgets_by_user, find_budgets_by_user_and_month,
};
#[cfg(test)]
pub use core::{budget_exists, find_budget};
pub use create_endpoint::create_budget_endpoint;
pub use delete_endpoint::delete_budget_endpoint;
