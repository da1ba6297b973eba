//! Gathers a user's financial facts and scores their financial health.
//!
//! Everything is read up front by [InsightInputs::gather] so the database lock
//! can be released before any narrative is requested.

use rusqlite::Connection;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rust_decimal_macros::dec;
use time::Date;

use crate::{
    Error,
    account::{
        AccountType, calculate_net_worth, get_accounts_by_user, get_accounts_by_user_and_type,
    },
    html::format_currency,
    insights::narrative::{Fact, Narrative, NarrativeGenerator},
    money::format_dollars,
    month::{YearMonth, subtract_months},
    transaction::{
        Category, spending_by_category_and_month, total_expenses_for_user_in_period,
        total_income_for_user_in_period,
    },
    user::UserId,
};

/// Shown in place of a narrative when the facts it needs could not be read.
pub const INSIGHTS_UNAVAILABLE: &str =
    "Unable to generate insights at this time. Please check your API configuration.";

const BASE_HEALTH_SCORE: i64 = 50;
const MAX_SAVINGS_RATE_POINTS: i64 = 25;
const CHECKING_ACCOUNT_POINTS: i64 = 5;
const SAVINGS_ACCOUNT_POINTS: i64 = 10;
const POSITIVE_NET_WORTH_POINTS: i64 = 10;

/// The share of income assumed to be available for spending.
const SPENDING_SHARE_OF_INCOME: Decimal = dec!(0.8);

/// This month's spending per category next to the user's usual income.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingSummary {
    /// Expense categories with spending this month, keyed by display name.
    pub category_spending: Vec<(String, Decimal)>,
    /// Average monthly income over the last three months.
    pub trailing_income: Decimal,
}

impl SpendingSummary {
    /// How much the user could spend in a month while still saving a fifth of their income.
    pub fn estimated_budget(&self) -> Decimal {
        self.trailing_income * SPENDING_SHARE_OF_INCOME
    }
}

/// The data behind the insights page.
#[derive(Debug)]
pub struct InsightInputs {
    /// The facts for the general advice narrative.
    pub facts: Result<Vec<Fact>, Error>,
    /// The spending figures for the spending analysis and budget recommendation narratives.
    pub spending: Result<SpendingSummary, Error>,
    /// The financial health score between 0 and 100.
    pub health_score: u8,
}

impl InsightInputs {
    /// Read everything the insights page needs for the month containing `today`.
    ///
    /// Failures are logged and kept so each narrative can fall back on its own.
    pub fn gather(user_id: UserId, today: Date, connection: &Connection) -> Self {
        let month = YearMonth::containing(today);

        let facts = gather_financial_facts(user_id, month, connection).inspect_err(|error| {
            tracing::error!("Could not gather financial facts for user {user_id}: {error}")
        });

        let spending = category_spending_for_month(user_id, month, connection)
            .and_then(|category_spending| {
                Ok(SpendingSummary {
                    category_spending,
                    trailing_income: trailing_average_monthly_income(user_id, today, connection)?,
                })
            })
            .inspect_err(|error| {
                tracing::error!("Could not gather spending for user {user_id}: {error}")
            });

        Self {
            facts,
            spending,
            health_score: calculate_financial_health_score(user_id, today, connection),
        }
    }

    /// General advice based on the user's facts.
    pub async fn generate_financial_insights(&self, generator: &NarrativeGenerator) -> Narrative {
        match &self.facts {
            Ok(facts) => generator.generate_financial_advice(facts).await,
            Err(_) => Narrative::Fallback(INSIGHTS_UNAVAILABLE.to_owned()),
        }
    }

    /// An analysis of this month's spending against the estimated budget.
    pub async fn analyze_monthly_spending(&self, generator: &NarrativeGenerator) -> Narrative {
        match &self.spending {
            Ok(summary) => {
                generator
                    .analyze_spending_patterns(
                        &summary.category_spending,
                        summary.estimated_budget(),
                    )
                    .await
            }
            Err(_) => Narrative::Fallback(INSIGHTS_UNAVAILABLE.to_owned()),
        }
    }

    /// A recommended budget based on the user's usual income and this month's spending.
    pub async fn generate_budget_recommendations(
        &self,
        generator: &NarrativeGenerator,
    ) -> Narrative {
        match &self.spending {
            Ok(summary) => {
                generator
                    .generate_budget_recommendations(
                        summary.trailing_income,
                        &summary.category_spending,
                    )
                    .await
            }
            Err(_) => Narrative::Fallback(INSIGHTS_UNAVAILABLE.to_owned()),
        }
    }
}

/// The labelled facts about the user's accounts and this month's cash flow, in display order.
pub fn gather_financial_facts(
    user_id: UserId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<Fact>, Error> {
    let accounts = get_accounts_by_user(user_id, connection)?;
    let net_worth = calculate_net_worth(user_id, connection)?;
    let income =
        total_income_for_user_in_period(user_id, month.first_day(), month.last_day(), connection)?;
    let expenses = total_expenses_for_user_in_period(
        user_id,
        month.first_day(),
        month.last_day(),
        connection,
    )?;

    let mut facts = vec![
        ("Total Accounts".to_owned(), accounts.len().to_string()),
        ("Net Worth".to_owned(), format_dollars(net_worth)),
        ("Monthly Income".to_owned(), format_dollars(income)),
        ("Monthly Expenses".to_owned(), format_dollars(expenses)),
        ("Monthly Savings".to_owned(), format_dollars(income - expenses)),
    ];

    for (category, amount) in category_spending_for_month(user_id, month, connection)? {
        facts.push((format!("Spending on {category}"), format_dollars(amount)));
    }

    for account in accounts {
        facts.push((
            format!("{} ({})", account.account_type.display_name(), account.name),
            format_currency(account.current_balance),
        ));
    }

    Ok(facts)
}

/// Spending per expense category in `month`, leaving out categories with no spending.
pub fn category_spending_for_month(
    user_id: UserId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<(String, Decimal)>, Error> {
    let mut spending = Vec::new();

    for category in Category::expense_categories() {
        let amount = spending_by_category_and_month(user_id, category, month, connection)?;

        if amount > Decimal::ZERO {
            spending.push((category.display_name().to_owned(), amount));
        }
    }

    Ok(spending)
}

/// The user's income over the three months up to and including `today`, divided by three.
pub fn trailing_average_monthly_income(
    user_id: UserId,
    today: Date,
    connection: &Connection,
) -> Result<Decimal, Error> {
    let start = subtract_months(today, 3);
    let total = total_income_for_user_in_period(user_id, start, today, connection)?;

    Ok((total / Decimal::from(3)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// A score between 0 and 100 rewarding saving, having checking and savings
/// accounts and a positive net worth.
///
/// If a query fails the error is logged and the points earned so far are kept.
pub fn calculate_financial_health_score(
    user_id: UserId,
    today: Date,
    connection: &Connection,
) -> u8 {
    let mut score = BASE_HEALTH_SCORE;

    if let Err(error) = add_health_points(&mut score, user_id, today, connection) {
        tracing::error!("Could not finish calculating the health score for user {user_id}: {error}");
    }

    score.clamp(0, 100) as u8
}

fn add_health_points(
    score: &mut i64,
    user_id: UserId,
    today: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let income = trailing_average_monthly_income(user_id, today, connection)?;
    let month = YearMonth::containing(today);
    let expenses = total_expenses_for_user_in_period(
        user_id,
        month.first_day(),
        month.last_day(),
        connection,
    )?;

    if income > Decimal::ZERO {
        *score = score.saturating_add(savings_rate_points(income, expenses));
    }

    if !get_accounts_by_user_and_type(user_id, AccountType::Checking, connection)?.is_empty() {
        *score += CHECKING_ACCOUNT_POINTS;
    }

    if !get_accounts_by_user_and_type(user_id, AccountType::Savings, connection)?.is_empty() {
        *score += SAVINGS_ACCOUNT_POINTS;
    }

    if calculate_net_worth(user_id, connection)? > Decimal::ZERO {
        *score += POSITIVE_NET_WORTH_POINTS;
    }

    Ok(())
}

/// Whole percentage points saved, capped at 25 and negative when spending exceeds income.
///
/// `income` must be positive.
fn savings_rate_points(income: Decimal, expenses: Decimal) -> i64 {
    let rate = ((income - expenses) / income)
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);

    (rate * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .unwrap_or(i64::MIN)
        .min(MAX_SAVINGS_RATE_POINTS)
}
