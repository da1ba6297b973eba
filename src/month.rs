//! Calendar month arithmetic shared by budgets and insights.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{Date, Month};

/// A calendar month in a particular year, e.g. March 2025.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    /// The calendar year.
    pub year: i32,
    /// The month within `year`.
    pub month: Month,
}

impl YearMonth {
    /// Create a new year-month.
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The month that `date` falls in.
    pub fn containing(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The first day of the month.
    ///
    /// Months outside the years supported by `time` clamp to [Date::MIN].
    /// [YearMonth::parse] never produces such a month.
    pub fn first_day(&self) -> Date {
        Date::from_calendar_date(self.year, self.month, 1).unwrap_or(Date::MIN)
    }

    /// The last day of the month.
    pub fn last_day(&self) -> Date {
        self.next().first_day().previous_day().unwrap_or(Date::MAX)
    }

    /// The month after this one, saturating at the largest representable year.
    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self::new(self.year.saturating_add(1), Month::January),
            month => Self::new(self.year, month.next()),
        }
    }

    /// The month before this one, saturating at the smallest representable year.
    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self::new(self.year.saturating_sub(1), Month::December),
            month => Self::new(self.year, month.previous()),
        }
    }

    /// Parse a month in the "YYYY-MM" format used by `<input type="month">`.
    ///
    /// Returns `None` unless the month and its neighbours are all dates that
    /// `time` can represent, so the month's date range is always exact.
    pub fn parse(text: &str) -> Option<Self> {
        let (year, month) = text.trim().split_once('-')?;
        let year = year.parse().ok()?;
        let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;

        let parsed = Self::new(year, month);
        let representable = [parsed.previous(), parsed, parsed.next()]
            .iter()
            .all(|candidate| Date::from_calendar_date(candidate.year, candidate.month, 1).is_ok());

        representable.then_some(parsed)
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

/// Subtract `months` calendar months from `date`.
///
/// The day is clamped to the length of the target month, so 31 May minus
/// three months is 28 (or 29) February.
pub fn subtract_months(date: Date, months: u32) -> Date {
    let mut target = YearMonth::containing(date);
    for _ in 0..months {
        target = target.previous();
    }

    let day = date.day().min(target.last_day().day());

    Date::from_calendar_date(target.year, target.month, day).unwrap_or(Date::MIN)
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::date};

    use super::{YearMonth, subtract_months};

    #[test]
    fn last_day_handles_leap_years() {
        assert_eq!(
            YearMonth::new(2024, Month::February).last_day(),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            YearMonth::new(2025, Month::February).last_day(),
            date!(2025 - 02 - 28)
        );
        assert_eq!(
            YearMonth::new(2025, Month::December).last_day(),
            date!(2025 - 12 - 31)
        );
    }

    #[test]
    fn subtract_months_clamps_day() {
        assert_eq!(subtract_months(date!(2025 - 05 - 31), 3), date!(2025 - 02 - 28));
        assert_eq!(subtract_months(date!(2025 - 01 - 15), 3), date!(2024 - 10 - 15));
    }

    #[test]
    fn parses_and_displays_month_input_format() {
        let month = YearMonth::parse("2025-03").unwrap();

        assert_eq!(month, YearMonth::new(2025, Month::March));
        assert_eq!(month.to_string(), "2025-03");
        assert_eq!(YearMonth::parse("2025-13"), None);
        assert_eq!(YearMonth::parse("March"), None);
    }

    #[test]
    fn rejects_months_outside_supported_dates() {
        assert_eq!(YearMonth::parse("10000-01"), None);
        assert_eq!(YearMonth::parse("9999-12"), None);
        assert_eq!(YearMonth::parse("2147483647-12"), None);
        assert_eq!(
            YearMonth::parse("9999-11"),
            Some(YearMonth::new(9999, Month::November))
        );
    }

    #[test]
    fn next_and_previous_saturate_at_year_limits() {
        let last = YearMonth::new(i32::MAX, Month::December);
        let first = YearMonth::new(i32::MIN, Month::January);

        assert_eq!(last.next(), YearMonth::new(i32::MAX, Month::January));
        assert_eq!(first.previous(), YearMonth::new(i32::MIN, Month::December));
    }
}
