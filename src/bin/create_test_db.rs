use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::OffsetDateTime;

use fin_insights::{
    AccountType, Category, NewAccount, NewBudget, NewTransaction, NewUser, PasswordHash,
    ValidatedPassword, YearMonth, create_account, create_budget, create_transaction, create_user,
    initialize_db,
};

/// A utility for creating a demo database for the FinInsights server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// (day of month, description, amount, category) for each month of demo transactions.
const MONTHLY_TRANSACTIONS: [(u8, &str, Decimal, Category); 7] = [
    (1, "Monthly salary", dec!(4000), Category::Salary),
    (2, "Rent", dec!(1200), Category::Housing),
    (5, "Power and internet", dec!(180.40), Category::Utilities),
    (8, "Supermarket", dec!(142.35), Category::Groceries),
    (12, "Dinner with friends", dec!(68.00), Category::DiningOut),
    (15, "Bus pass", dec!(60), Category::Transportation),
    (20, "Design contract", dec!(650), Category::Freelance),
];

const BUDGETS: [(Category, Decimal); 4] = [
    (Category::Housing, dec!(1200)),
    (Category::Groceries, dec!(400)),
    (Category::DiningOut, dec!(50)),
    (Category::Entertainment, dec!(100)),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating demo user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        NewUser {
            first_name: "Demo".to_owned(),
            last_name: "User".to_owned(),
            email: "demo@example.com".to_owned(),
            password_hash,
        },
        &conn,
    )?;

    println!("Creating accounts...");

    let checking = create_account(
        NewAccount {
            user_id: user.id,
            name: "Everyday".to_owned(),
            account_type: AccountType::Checking,
            initial_balance: dec!(2500),
        },
        &conn,
    )?;

    create_account(
        NewAccount {
            user_id: user.id,
            name: "Rainy Day".to_owned(),
            account_type: AccountType::Savings,
            initial_balance: dec!(10000),
        },
        &conn,
    )?;

    println!("Creating transactions for the last three months...");

    let today = OffsetDateTime::now_utc().date();
    let this_month = YearMonth::containing(today);
    let months = [this_month.previous().previous(), this_month.previous(), this_month];

    for month in months {
        for (day, description, amount, category) in MONTHLY_TRANSACTIONS {
            let date = month.first_day().replace_day(day)?;

            // Skip transactions that have not happened yet this month.
            if date > today {
                continue;
            }

            create_transaction(
                NewTransaction {
                    account_id: checking.id,
                    description: description.to_owned(),
                    amount,
                    transaction_type: category.transaction_type(),
                    category,
                    date,
                },
                user.id,
                &conn,
            )?;
        }
    }

    println!("Creating budgets for {this_month}...");

    for (category, amount) in BUDGETS {
        create_budget(
            NewBudget {
                user_id: user.id,
                category,
                month: this_month,
                amount,
            },
            &conn,
        )?;
    }

    println!("Success! Log in as demo@example.com with the password 'test'.");

    Ok(())
}
