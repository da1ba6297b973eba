//! Sums over a user's transactions used by the budgets and insights pages.
//!
//! Every sum is joined through account ownership and is zero when nothing matches.

use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    money::from_cents,
    month::YearMonth,
    transaction::{Category, TransactionType},
    user::UserId,
};

fn total_for_user_in_period(
    user_id: UserId,
    transaction_type: TransactionType,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Decimal, Error> {
    let cents: i64 = connection.query_row(
        "SELECT COALESCE(SUM(t.amount), 0)
        FROM \"transaction\" t
        INNER JOIN account a ON t.account_id = a.id
        WHERE a.user_id = ?1
            AND t.transaction_type = ?2
            AND t.date BETWEEN ?3 AND ?4",
        params![user_id.as_i64(), transaction_type, start, end],
        |row| row.get(0),
    )?;

    Ok(from_cents(cents))
}

/// Total income for the user between `start` and `end`, both inclusive.
pub fn total_income_for_user_in_period(
    user_id: UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Decimal, Error> {
    total_for_user_in_period(user_id, TransactionType::Income, start, end, connection)
}

/// Total expenses for the user between `start` and `end`, both inclusive.
pub fn total_expenses_for_user_in_period(
    user_id: UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Decimal, Error> {
    total_for_user_in_period(user_id, TransactionType::Expense, start, end, connection)
}

/// How much the user spent on `category` during `month`.
pub fn spending_by_category_and_month(
    user_id: UserId,
    category: Category,
    month: YearMonth,
    connection: &Connection,
) -> Result<Decimal, Error> {
    let cents: i64 = connection.query_row(
        "SELECT COALESCE(SUM(t.amount), 0)
        FROM \"transaction\" t
        INNER JOIN account a ON t.account_id = a.id
        WHERE a.user_id = ?1
            AND t.category = ?2
            AND t.date BETWEEN ?3 AND ?4",
        params![
            user_id.as_i64(),
            category,
            month.first_day(),
            month.last_day()
        ],
        |row| row.get(0),
    )?;

    Ok(from_cents(cents))
}

#[cfg(test)]
mod aggregate_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Date, Month, macros::date};

    use crate::{
        account::{AccountType, NewAccount, create_account},
        month::YearMonth,
        test_utils::{get_test_connection, seed_user},
        transaction::{Category, NewTransaction, TransactionType, create_transaction},
        user::User,
    };

    use super::{
        spending_by_category_and_month, total_expenses_for_user_in_period,
        total_income_for_user_in_period,
    };

    fn setup() -> (Connection, User, i64) {
        let connection = get_test_connection();
        let user = seed_user(&connection, "test@example.com");
        let account = create_account(
            NewAccount {
                user_id: user.id,
                name: "Everyday".to_owned(),
                account_type: AccountType::Checking,
                initial_balance: Decimal::ZERO,
            },
            &connection,
        )
        .unwrap();

        (connection, user, account.id)
    }

    fn record(
        connection: &Connection,
        user: &User,
        account_id: i64,
        amount: Decimal,
        category: Category,
        date: Date,
    ) {
        create_transaction(
            NewTransaction {
                account_id,
                description: category.display_name().to_owned(),
                amount,
                transaction_type: category.transaction_type(),
                category,
                date,
            },
            user.id,
            connection,
        )
        .unwrap();
    }

    #[test]
    fn sums_are_zero_without_transactions() {
        let (connection, user, _) = setup();
        let start = date!(2025 - 01 - 01);
        let end = date!(2025 - 12 - 31);

        assert_eq!(
            total_income_for_user_in_period(user.id, start, end, &connection),
            Ok(Decimal::ZERO)
        );
        assert_eq!(
            total_expenses_for_user_in_period(user.id, start, end, &connection),
            Ok(Decimal::ZERO)
        );
        assert_eq!(
            spending_by_category_and_month(
                user.id,
                Category::Groceries,
                YearMonth::new(2025, Month::March),
                &connection
            ),
            Ok(Decimal::ZERO)
        );
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let (connection, user, account_id) = setup();
        record(&connection, &user, account_id, dec!(100), Category::Salary, date!(2025 - 03 - 01));
        record(&connection, &user, account_id, dec!(50.50), Category::Freelance, date!(2025 - 03 - 31));
        record(&connection, &user, account_id, dec!(999), Category::Salary, date!(2025 - 04 - 01));
        record(&connection, &user, account_id, dec!(20), Category::Groceries, date!(2025 - 03 - 15));

        let income = total_income_for_user_in_period(
            user.id,
            date!(2025 - 03 - 01),
            date!(2025 - 03 - 31),
            &connection,
        );
        let expenses = total_expenses_for_user_in_period(
            user.id,
            date!(2025 - 03 - 01),
            date!(2025 - 03 - 31),
            &connection,
        );

        assert_eq!(income, Ok(dec!(150.50)));
        assert_eq!(expenses, Ok(dec!(20)));
    }

    #[test]
    fn category_spending_is_limited_to_month_and_category() {
        let (connection, user, account_id) = setup();
        record(&connection, &user, account_id, dec!(12.30), Category::DiningOut, date!(2025 - 02 - 28));
        record(&connection, &user, account_id, dec!(7.70), Category::DiningOut, date!(2025 - 02 - 01));
        record(&connection, &user, account_id, dec!(40), Category::DiningOut, date!(2025 - 03 - 01));
        record(&connection, &user, account_id, dec!(60), Category::Groceries, date!(2025 - 02 - 10));

        let got = spending_by_category_and_month(
            user.id,
            Category::DiningOut,
            YearMonth::new(2025, Month::February),
            &connection,
        );

        assert_eq!(got, Ok(dec!(20.00)));
    }

    #[test]
    fn sums_exclude_other_users() {
        let (connection, user, account_id) = setup();
        let other = seed_user(&connection, "other@example.com");
        record(&connection, &user, account_id, dec!(100), Category::Salary, date!(2025 - 03 - 01));

        let got = total_income_for_user_in_period(
            other.id,
            date!(2025 - 01 - 01),
            date!(2025 - 12 - 31),
            &connection,
        );

        assert_eq!(got, Ok(Decimal::ZERO));
    }
}
