use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;

use fraud_ledger::{
    ADMIN_ROLE, Money, NewAccount, PasswordHash, Transaction, TransactionType, create_account,
    create_transaction, get_or_create_role, initialize_db, register_account,
};

/// A utility for creating a test database for the REST API server of fraud_ledger.
///
/// Every account gets the password "test". The admin logs in with the phone
/// number 0000000000 and the demo accounts with 0200000001 and 0200000002.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const TEST_PASSWORD: &str = "test";

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

    println!("Creating admin account...");
    let admin_role = get_or_create_role(ADMIN_ROLE, &conn)?;
    create_account(
        NewAccount {
            name: "Admin".to_owned(),
            phone: "0000000000".to_owned(),
            password_hash: PasswordHash::from_raw_password(
                TEST_PASSWORD,
                PasswordHash::DEFAULT_COST,
            )?,
            role_id: Some(admin_role.id),
            is_staff: true,
        },
        &conn,
    )?;

    println!("Creating demo accounts...");
    for (name, phone, deposit) in [
        ("Alice Demo", "0200000001", Decimal::new(100_00, 2)),
        ("Bob Demo", "0200000002", Decimal::new(50_00, 2)),
    ] {
        let account = register_account(
            name,
            phone,
            TEST_PASSWORD,
            None,
            PasswordHash::DEFAULT_COST,
            &conn,
        )?;
        create_transaction(
            Transaction::build(TransactionType::CashIn, account.id, Money::new(deposit), 0),
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
