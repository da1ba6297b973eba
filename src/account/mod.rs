//! Bank accounts and credit cards, their balances and the user's net worth.

mod accounts_page;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;

pub use accounts_page::get_accounts_page;
pub use core::{
    Account, AccountId, AccountType, NewAccount, calculate_net_worth, create_account,
    create_account_table, delete_account, find_account, get_account, get_accounts_by_user,
    get_accounts_by_user_and_type, update_account_details, update_balance,
};
pub use create_endpoint::create_account_endpoint;
pub use create_page::get_create_account_page;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::{edit_account_endpoint, update_balance_endpoint};
pub use edit_page::get_edit_account_page;
