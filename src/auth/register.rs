//! The registration page and the endpoint that creates a user and logs them in.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{MIN_PASSWORD_LENGTH, PasswordHash, ValidatedPassword, set_auth_cookie},
    endpoints,
    html::{LINK_STYLE, TextInput, base, log_in_register, password_input, submit_button},
    timezone::get_local_offset,
    user::{NewUser, create_user, is_email_available},
};

/// The values typed into the registration form and the problems found with them.
#[derive(Default)]
struct RegistrationFormView<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    name_error: Option<&'a str>,
    email_error: Option<&'a str>,
    password_error: Option<&'a str>,
    confirm_password_error: Option<&'a str>,
}

impl RegistrationFormView<'_> {
    fn into_html(self) -> Markup {
        html! {
            form
                hx-post=(endpoints::USERS)
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="space-y-4 md:space-y-6"
            {
                (TextInput {
                    name: "first_name",
                    label: "First Name",
                    input_type: "text",
                    value: self.first_name,
                    placeholder: "Jane",
                    error_message: None,
                }.into_html())

                (TextInput {
                    name: "last_name",
                    label: "Last Name",
                    input_type: "text",
                    value: self.last_name,
                    placeholder: "Doe",
                    error_message: self.name_error,
                }.into_html())

                (TextInput {
                    name: "email",
                    label: "Email",
                    input_type: "email",
                    value: self.email,
                    placeholder: "name@example.com",
                    error_message: self.email_error,
                }.into_html())

                (password_input("password", "Password", "", MIN_PASSWORD_LENGTH, self.password_error))
                (password_input(
                    "confirm_password",
                    "Confirm Password",
                    "",
                    MIN_PASSWORD_LENGTH,
                    self.confirm_password_error,
                ))

                (submit_button("Create Account"))

                p class="text-sm font-light text-gray-500 dark:text-gray-400"
                {
                    "Already have an account? "
                    a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                    {
                      "Log in here"
                    }
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = RegistrationFormView::default().into_html();
    let content = log_in_register("Create an account", &form);

    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create a user from the registration form and log them in.
///
/// Field problems are reported by re-rendering the form; the email check
/// happens before the password is hashed so a taken email fails fast.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let form_view = RegistrationFormView {
        first_name: &user_data.first_name,
        last_name: &user_data.last_name,
        email: &user_data.email,
        ..Default::default()
    };

    if user_data.first_name.trim().is_empty() || user_data.last_name.trim().is_empty() {
        return RegistrationFormView {
            name_error: Some("First and last name are required"),
            ..form_view
        }
        .into_html()
        .into_response();
    }

    let email_available = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| is_email_available(&user_data.email, &connection));

    match email_available {
        Ok(true) => {}
        Ok(false) => {
            return RegistrationFormView {
                email_error: Some("A user with this email already exists."),
                ..form_view
            }
            .into_html()
            .into_response();
        }
        Err(error) => return error.into_response(),
    }

    let validated_password = match ValidatedPassword::new(
        &user_data.password,
        &[
            user_data.first_name.as_str(),
            user_data.last_name.as_str(),
            user_data.email.as_str(),
        ],
    ) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            return RegistrationFormView {
                password_error: Some(&message),
                ..form_view
            }
            .into_html()
            .into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        return RegistrationFormView {
            confirm_password_error: Some("Passwords do not match"),
            ..form_view
        }
        .into_html()
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return error.into_response();
        }
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let new_user = NewUser {
        first_name: user_data.first_name.clone(),
        last_name: user_data.last_name.clone(),
        email: user_data.email.clone(),
        password_hash,
    };

    let user = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| create_user(new_user, &connection));

    let user = match user {
        Ok(user) => user,
        Err(Error::Validation(message)) | Err(Error::Conflict(message)) => {
            return RegistrationFormView {
                email_error: Some(&message),
                ..form_view
            }
            .into_html()
            .into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            return error.into_response();
        }
    };

    tracing::info!("Registered user {}", user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            internal_error_redirect()
        }
    }
}

/// Send the browser to the error page after an HTMX request failed.
fn internal_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}
