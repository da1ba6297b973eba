//! The profile page where a user edits their name and email or removes their account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::invalidate_auth_cookie,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, TextInput,
        base, submit_button,
    },
    navigation::NavBar,
    user::{User, UserId, delete_user, get_user_by_id, update_user},
};

/// The state needed for the profile page and endpoints.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<ProfileState> for Key {
    fn from_ref(state: &ProfileState) -> Self {
        state.cookie_key.clone()
    }
}

fn profile_view(user: &User) -> Markup {
    let content = html! {
        (NavBar::new(endpoints::PROFILE_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class=(FORM_CONTAINER_STYLE)
            {
                h1 class="text-xl font-bold mb-4" { "Profile" }

                form
                    hx-put=(endpoints::PROFILE_API)
                    hx-indicator="#indicator"
                    hx-disabled-elt="#submit-button"
                    hx-target-error="#alert-container"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (TextInput {
                        name: "first_name",
                        label: "First Name",
                        input_type: "text",
                        value: &user.first_name,
                        placeholder: "Jane",
                        error_message: None,
                    }.into_html())

                    (TextInput {
                        name: "last_name",
                        label: "Last Name",
                        input_type: "text",
                        value: &user.last_name,
                        placeholder: "Doe",
                        error_message: None,
                    }.into_html())

                    (TextInput {
                        name: "email",
                        label: "Email",
                        input_type: "email",
                        value: &user.email,
                        placeholder: "name@example.com",
                        error_message: None,
                    }.into_html())

                    (submit_button("Save Profile"))
                }

                section class={ (CARD_STYLE) " mt-8 space-y-2" }
                {
                    h2 class="text-lg font-semibold" { "Delete account" }
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Removes your login along with every account, transaction and budget you have recorded."
                    }

                    button
                        type="button"
                        hx-delete=(endpoints::PROFILE_API)
                        hx-confirm="Are you sure you want to delete your account? This cannot be undone."
                        hx-target-error="#alert-container"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete my account"
                    }
                }
            }
        }
    };

    base("Profile", &[], &content)
}

/// Renders the profile form pre-filled with the user's details.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get user {user_id}: {error}"))?;

    Ok(profile_view(&user).into_response())
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Saves the profile form, responding with an alert on failure.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_user(
        user_id,
        &form.first_name,
        &form.last_name,
        &form.email,
        &connection,
    ) {
        Ok(_) => Alert::Success {
            message: "Profile saved".to_owned(),
            details: String::new(),
        }
        .into_response(),
        Err(error) => {
            tracing::warn!("Could not update profile for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Deletes the logged-in user and everything they own, then ends the session.
pub async fn delete_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserId>,
    jar: PrivateCookieJar,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_user(user_id, &connection) {
        Ok(()) => {
            tracing::info!("Deleted user {user_id}");
            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::REGISTER_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not delete user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}
