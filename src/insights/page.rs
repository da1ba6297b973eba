//! The page showing the financial health score and the three narratives.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    endpoints,
    html::{CARD_STYLE, PAGE_CONTAINER_STYLE, base},
    insights::{
        aggregator::InsightInputs,
        narrative::{Narrative, NarrativeGenerator},
    },
    navigation::NavBar,
    timezone::local_today,
    user::UserId,
};

/// The state needed for the insights page.
#[derive(Debug, Clone)]
pub struct InsightsPageState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
    pub narrator: NarrativeGenerator,
}

impl FromRef<AppState> for InsightsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
            narrator: state.narrator.clone(),
        }
    }
}

fn score_description(score: u8) -> &'static str {
    match score {
        80.. => "Excellent",
        60..80 => "Good",
        40..60 => "Fair",
        _ => "Needs attention",
    }
}

fn score_colour(score: u8) -> &'static str {
    match score {
        60.. => "text-green-600 dark:text-green-400",
        40..60 => "text-yellow-600 dark:text-yellow-400",
        _ => "text-red-600 dark:text-red-400",
    }
}

fn health_score_card(score: u8) -> Markup {
    html!(
        section class=(CARD_STYLE) data-health-score=(score)
        {
            h2 class="text-lg font-semibold mb-2" { "Financial Health Score" }

            p class="flex items-baseline gap-3"
            {
                span class={ "text-4xl font-bold " (score_colour(score)) } { (score) }
                span class="text-gray-500 dark:text-gray-400" { "/ 100" }
                span class="font-medium" { (score_description(score)) }
            }
        }
    )
}

fn narrative_card(title: &str, kind: &str, narrative: &Narrative) -> Markup {
    html!(
        section class=(CARD_STYLE) data-narrative=(kind)
        {
            h2 class="text-lg font-semibold mb-2" { (title) }

            @if narrative.is_fallback() {
                p
                    class="text-xs uppercase text-gray-500 dark:text-gray-400 mb-2"
                    data-fallback="true"
                {
                    "AI insights are unavailable right now"
                }
            }

            p class="whitespace-pre-line" { (narrative.text()) }
        }
    )
}

fn insights_view(
    health_score: u8,
    advice: &Narrative,
    spending: &Narrative,
    budget: &Narrative,
) -> Markup {
    let content = html!(
        (NavBar::new(endpoints::INSIGHTS_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="space-y-4 w-full lg:max-w-4xl"
            {
                h1 class="text-xl font-bold" { "Insights" }

                (health_score_card(health_score))
                (narrative_card("Financial Advice", "advice", advice))
                (narrative_card("Spending Analysis", "spending", spending))
                (narrative_card("Budget Recommendations", "budget", budget))
            }
        }
    );

    base("Insights", &[], &content)
}

/// Renders the health score and asks for the three narratives at the same time.
///
/// The database lock is released before any narrative is requested.
pub async fn get_insights_page(
    State(state): State<InsightsPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let inputs = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        InsightInputs::gather(user_id, today, &connection)
    };

    let (advice, spending, budget) = tokio::join!(
        inputs.generate_financial_insights(&state.narrator),
        inputs.analyze_monthly_spending(&state.narrator),
        inputs.generate_budget_recommendations(&state.narrator),
    );

    Ok(insights_view(inputs.health_score, &advice, &spending, &budget).into_response())
}
