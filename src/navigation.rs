//! The navigation bar shown at the top of every page for a logged in user.

use maud::{Markup, html};

use crate::endpoints;

/// The pages linked from the navigation bar as (url, title), in display order.
const PAGES: [(&str, &str); 5] = [
    (endpoints::ACCOUNTS_VIEW, "Accounts"),
    (endpoints::TRANSACTIONS_VIEW, "Transactions"),
    (endpoints::BUDGETS_VIEW, "Budgets"),
    (endpoints::INSIGHTS_VIEW, "Insights"),
    (endpoints::PROFILE_VIEW, "Profile"),
];

const CURRENT_LINK_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm \
    lg:bg-transparent lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500";

const LINK_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100 \
    lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0 \
    dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700 \
    dark:hover:text-white lg:dark:hover:bg-transparent";

/// The navigation bar with the link for the current page highlighted.
pub struct NavBar<'a> {
    active_endpoint: &'a str,
}

impl<'a> NavBar<'a> {
    /// Highlight the link to `active_endpoint`, if there is one.
    ///
    /// Pages that are not linked directly, such as the edit pages, get no highlight.
    pub fn new(active_endpoint: &'a str) -> Self {
        Self { active_endpoint }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "FinInsights"
                        }
                    }

                    div class="w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for (url, title) in PAGES {
                                li { (nav_link(url, title, url == self.active_endpoint)) }
                            }

                            li { (nav_link(endpoints::LOG_OUT, "Log out", false)) }
                        }
                    }
                }
            }
        )
    }
}

fn nav_link(url: &str, title: &str, is_current: bool) -> Markup {
    html!(
        a
            href=(url)
            class=(if is_current { CURRENT_LINK_STYLE } else { LINK_STYLE })
            aria-current=[is_current.then_some("page")]
        {
            (title)
        }
    )
}
