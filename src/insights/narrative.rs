//! Turns financial facts into prompts and asks a language model to write about them.
//!
//! Every entry point returns a [Narrative]. When the completion fails the
//! failure is logged and a canned fallback is returned instead.

use std::{fmt::Write, sync::Arc};

use rust_decimal::Decimal;

use crate::{
    insights::client::{CompletionClient, CompletionError},
    money::format_dollars,
};

const ADVICE_FALLBACK: &str = "Here are some general financial tips while our AI advisor is unavailable:\n\n\
    • Track your spending regularly to understand where your money goes\n\
    • Build an emergency fund covering 3-6 months of expenses\n\
    • Pay off high-interest debt first\n\
    • Automate your savings to make it consistent\n\
    • Review and adjust your budget monthly\n\
    • Consider increasing your income through side hustles or skill development";

const SPENDING_FALLBACK: &str = "Unable to analyze spending patterns at this time. \
    Please check your budget categories and try again.";

const BUDGET_FALLBACK: &str = "Consider following the 50/30/20 rule: 50% for needs, \
    30% for wants, and 20% for savings and debt repayment.";

/// A labelled value describing the user's finances, e.g. ("Net Worth", "$1200.00").
pub type Fact = (String, String);

/// Text written by the language model, or the canned text used in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrative {
    /// The completion returned by the language model.
    Generated(String),
    /// The canned text used because the completion failed.
    Fallback(String),
}

impl Narrative {
    /// The text to show, whichever kind it is.
    pub fn text(&self) -> &str {
        match self {
            Narrative::Generated(text) | Narrative::Fallback(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Narrative::Fallback(_))
    }
}

/// Writes narratives about a user's finances with a [CompletionClient].
#[derive(Clone)]
pub struct NarrativeGenerator {
    client: Arc<dyn CompletionClient>,
}

impl std::fmt::Debug for NarrativeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeGenerator").finish_non_exhaustive()
    }
}

impl NarrativeGenerator {
    /// Create a generator that sends its prompts to `client`.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// General advice about the situation described by `facts`.
    pub async fn generate_financial_advice(&self, facts: &[Fact]) -> Narrative {
        self.complete_or(&advice_prompt(facts), ADVICE_FALLBACK, "financial advice")
            .await
    }

    /// Comments on this month's spending per category against `total_budget`.
    pub async fn analyze_spending_patterns(
        &self,
        category_spending: &[(String, Decimal)],
        total_budget: Decimal,
    ) -> Narrative {
        self.complete_or(
            &spending_prompt(category_spending, total_budget),
            SPENDING_FALLBACK,
            "spending analysis",
        )
        .await
    }

    /// A suggested budget allocation for `monthly_income` given the current spending.
    pub async fn generate_budget_recommendations(
        &self,
        monthly_income: Decimal,
        current_spending: &[(String, Decimal)],
    ) -> Narrative {
        self.complete_or(
            &budget_prompt(monthly_income, current_spending),
            BUDGET_FALLBACK,
            "budget recommendations",
        )
        .await
    }

    async fn complete_or(&self, prompt: &str, fallback: &str, purpose: &str) -> Narrative {
        match self.client.complete(prompt).await {
            Ok(text) => Narrative::Generated(text),
            Err(CompletionError::MissingApiKey) => {
                tracing::debug!("Using fallback {purpose}: no API key configured");
                Narrative::Fallback(fallback.to_owned())
            }
            Err(error) => {
                tracing::error!("Could not generate {purpose}: {error}");
                Narrative::Fallback(fallback.to_owned())
            }
        }
    }
}

fn advice_prompt(facts: &[Fact]) -> String {
    let mut prompt = String::from(
        "As a professional financial advisor, please analyze this financial situation \
        and provide personalized advice:\n\n",
    );

    for (label, value) in facts {
        let _ = writeln!(prompt, "{label}: {value}");
    }

    prompt.push_str(
        "\nPlease provide:\n\
        1. Assessment of current financial health\n\
        2. Specific actionable recommendations\n\
        3. Areas for improvement\n\
        4. Positive reinforcement for good habits\n\
        \nKeep the advice practical, encouraging, and under 300 words.",
    );

    prompt
}

/// Append one "- category: $amount" line per entry and return the total.
fn write_category_lines(prompt: &mut String, spending: &[(String, Decimal)]) -> Decimal {
    let mut total = Decimal::ZERO;

    for (category, amount) in spending {
        let _ = writeln!(prompt, "- {category}: {}", format_dollars(*amount));
        total += amount;
    }

    total
}

fn spending_prompt(category_spending: &[(String, Decimal)], total_budget: Decimal) -> String {
    let mut prompt = format!(
        "Analyze this monthly spending breakdown and provide insights:\n\n\
        Total Budget: {}\n\n\
        Spending by Category:\n",
        format_dollars(total_budget)
    );

    let total_spent = write_category_lines(&mut prompt, category_spending);

    let _ = write!(
        prompt,
        "\nTotal Spent: {}\n\
        Remaining Budget: {}\n\n\
        Please identify spending patterns, highlight any concerning areas, and suggest \
        optimizations. Keep response under 200 words.",
        format_dollars(total_spent),
        format_dollars(total_budget - total_spent)
    );

    prompt
}

fn budget_prompt(monthly_income: Decimal, current_spending: &[(String, Decimal)]) -> String {
    let mut prompt = format!(
        "Create a budget recommendation for someone with:\n\n\
        Monthly Income: {}\n\n\
        Current Spending:\n",
        format_dollars(monthly_income)
    );

    let total_spending = write_category_lines(&mut prompt, current_spending);

    let _ = write!(
        prompt,
        "\nTotal Current Spending: {}\n\n\
        Please suggest an optimized budget allocation with specific dollar amounts for each \
        category. Include emergency fund and savings recommendations. Keep response under 250 words.",
        format_dollars(total_spending)
    );

    prompt
}
