//! Exact monetary amounts.
//!
//! Amounts are handled as [Decimal] in code and stored as integer cents in the
//! database so that sums computed by SQLite stay exact.

use std::str::FromStr;

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::Error;

/// Parse a user supplied amount such as "12.30" or "$1,234.5".
///
/// # Errors
/// Returns [Error::InvalidMoney] if `raw_amount` is not a number or has more
/// than two decimal places.
pub fn parse_amount(raw_amount: &str) -> Result<Decimal, Error> {
    let cleaned: String = raw_amount
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let amount =
        Decimal::from_str(&cleaned).map_err(|_| Error::InvalidMoney(raw_amount.to_owned()))?;

    if amount.normalize().scale() > 2 {
        return Err(Error::InvalidMoney(raw_amount.to_owned()));
    }

    Ok(amount)
}

/// Convert `amount` to a whole number of cents.
///
/// # Errors
/// Returns [Error::InvalidMoney] if `amount` has fractional cents or is too
/// large to store.
pub fn to_cents(amount: Decimal) -> Result<i64, Error> {
    if amount.normalize().scale() > 2 {
        return Err(Error::InvalidMoney(amount.to_string()));
    }

    (amount * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| Error::InvalidMoney(amount.to_string()))
}

/// Convert a whole number of cents to a decimal amount with two decimal places.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Format `amount` as a plain dollar string, e.g. "$12000.00" or "$-500.00".
///
/// This is the format used for the facts given to the narrative generator.
/// Use [crate::html::format_currency] for amounts shown on a page.
pub fn format_dollars(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::Error;

    use super::{format_dollars, from_cents, parse_amount, to_cents};

    #[test]
    fn parses_plain_and_formatted_amounts() {
        assert_eq!(parse_amount("12.3"), Ok(dec!(12.3)));
        assert_eq!(parse_amount(" $1,234.50 "), Ok(dec!(1234.50)));
        assert_eq!(parse_amount("0"), Ok(Decimal::ZERO));
    }

    #[test]
    fn rejects_fractional_cents() {
        assert_eq!(
            parse_amount("1.234"),
            Err(Error::InvalidMoney("1.234".to_owned()))
        );
    }

    #[test]
    fn rejects_non_numbers() {
        assert!(matches!(parse_amount("abc"), Err(Error::InvalidMoney(_))));
        assert!(matches!(parse_amount(""), Err(Error::InvalidMoney(_))));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_fractional_cents() {
        assert_eq!(to_cents(dec!(1.2300)), Ok(123));
    }

    #[test]
    fn cents_convert_exactly() {
        assert_eq!(to_cents(dec!(2500.00)), Ok(250_000));
        assert_eq!(to_cents(dec!(-0.01)), Ok(-1));
        assert_eq!(from_cents(1_000_000), dec!(10000.00));
    }

    #[test]
    fn formats_with_two_decimal_places() {
        assert_eq!(format_dollars(dec!(12000)), "$12000.00");
        assert_eq!(format_dollars(dec!(-500.5)), "$-500.50");
        assert_eq!(format_dollars(Decimal::ZERO), "$0.00");
    }
}
