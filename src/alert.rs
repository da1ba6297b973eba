//! Alerts for displaying success and error messages to users.
//!
//! Alerts are swapped into the `#alert-container` element of the base page,
//! either directly via `hx-target-error` or out-of-band.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// An alert message to show in the alert container.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with some extra details.
    Success { message: String, details: String },
    /// A success message without details.
    SuccessSimple { message: String },
    /// An error message with some details on how to fix the problem.
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, message, Some(details)),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, None),
            Alert::Error { message, details } => (ERROR_STYLE, message, Some(details)),
        };

        html!(
            div
                role="alert"
                class=(container_style)
                onclick="this.remove()"
            {
                p class="font-semibold" { (message) }

                @if let Some(details) = details.filter(|details| !details.is_empty()) {
                    p class="text-sm" { (details) }
                }
            }
        )
    }

    /// Render the alert so that HTMX swaps it into the alert container
    /// regardless of the request's target.
    pub fn into_oob_html(self) -> Markup {
        html!(
            div id="alert-container" hx-swap-oob="true" class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                (self.into_html())
            }
        )
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_oob_html().into_response()
    }
}

const SUCCESS_STYLE: &str = "p-4 mb-4 rounded border border-green-300 \
    bg-green-50 text-green-800 dark:bg-gray-800 dark:text-green-400 \
    dark:border-green-800 cursor-pointer";

const ERROR_STYLE: &str = "p-4 mb-4 rounded border border-red-300 bg-red-50 \
    text-red-800 dark:bg-gray-800 dark:text-red-400 dark:border-red-800 \
    cursor-pointer";

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_shows_message_and_details() {
        let alert = Alert::Error {
            message: "Could not save".to_owned(),
            details: "Try again".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().into_string());
        let paragraphs = html
            .select(&Selector::parse("div[role=alert] p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();

        assert_eq!(paragraphs, vec!["Could not save", "Try again"]);
    }

    #[test]
    fn simple_success_alert_omits_details() {
        let alert = Alert::SuccessSimple {
            message: "Deleted".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().into_string());
        let paragraph_count = html.select(&Selector::parse("p").unwrap()).count();

        assert_eq!(paragraph_count, 1);
    }
}
