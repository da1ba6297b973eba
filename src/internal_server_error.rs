//! The 500 page, shown when the server could not finish handling a request.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

const GENERIC_DESCRIPTION: &str = "Sorry, something went wrong.";
const GENERIC_FIX: &str = "Try again later or check the server logs";

/// Renders the 500 page with a description of the problem and how to fix it.
pub struct InternalServerError<'a> {
    description: &'a str,
    fix: &'a str,
}

impl<'a> InternalServerError<'a> {
    pub fn new(description: &'a str, fix: &'a str) -> Self {
        Self { description, fix }
    }
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self::new(GENERIC_DESCRIPTION, GENERIC_FIX)
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        let page = error_view("Internal Server Error", "500", self.description, self.fix);

        (StatusCode::INTERNAL_SERVER_ERROR, Html(page.into_string())).into_response()
    }
}

pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}
