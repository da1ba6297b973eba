//! FinInsights is a web app for keeping track of your accounts, transactions and
//! budgets, with narrative insights about your spending written by a language model.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod auth;
mod budget;
mod database_id;
mod db;
mod endpoints;
mod error;
mod html;
mod insights;
mod internal_server_error;
mod logging;
mod money;
mod month;
mod navigation;
mod not_found;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use account::{AccountType, NewAccount, create_account};
pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use budget::{NewBudget, create_budget};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use insights::{
    ChatCompletionClient, CompletionConfig, DEFAULT_COMPLETION_MODEL, DEFAULT_COMPLETION_TIMEOUT,
    DEFAULT_COMPLETION_URL, NarrativeGenerator,
};
pub use logging::logging_middleware;
pub use month::YearMonth;
pub use routing::build_router;
pub use transaction::{Category, NewTransaction, TransactionType, create_transaction};
pub use user::{NewUser, User, UserId, create_user};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
