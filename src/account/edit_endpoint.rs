//! Defines the endpoints for updating an account's details and its balance.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::{AccountId, AccountType, update_account_details, update_balance},
    endpoints,
    money::parse_amount,
    user::UserId,
};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EditAccountForm {
    pub name: String,
    pub account_type: AccountType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBalanceForm {
    pub current_balance: String,
}

fn redirect_to_accounts() -> Response {
    (
        HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Saves a new name and type for an account. The balances are not touched.
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<EditAccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_account_details(
        account_id,
        user_id,
        &form.name,
        form.account_type,
        &connection,
    ) {
        Ok(_) => redirect_to_accounts(),
        Err(error) => {
            tracing::warn!("Could not update account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Overwrites the current balance of an account.
pub async fn update_balance_endpoint(
    State(state): State<EditAccountState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<UpdateBalanceForm>,
) -> Response {
    let new_balance = match parse_amount(&form.current_balance) {
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

    match update_balance(account_id, user_id, new_balance, &connection) {
        Ok(account) => {
            tracing::info!(
                "Set balance of account {account_id} to {}",
                account.current_balance
            );
            redirect_to_accounts()
        }
        Err(error) => {
            tracing::warn!("Could not update balance of account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}
