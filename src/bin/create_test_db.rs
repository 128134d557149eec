use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use spendlog::{
    initialize_db,
    transaction::{Transaction, count_transactions, create_transaction},
};

/// A utility for creating a test database for spendlog.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many sample transactions to insert.
    #[arg(long, short, default_value_t = 5)]
    count: u32,
}

const SAMPLES: [(&str, &str, f64); 4] = [
    ("Mi Ayam", "Pembelian", 15000.0),
    ("Bakso", "Pembelian", 12000.0),
    ("Ojek", "Transportasi", 8500.0),
    ("Pulsa", "Tagihan", 25000.0),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'transaction.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating {} test transactions...", args.count);

    for (i, (title, category, amount)) in SAMPLES.iter().cycle().take(args.count as usize).enumerate()
    {
        let tanggal = format!("2023-02-{:02} 12:00:00", i % 28 + 1);
        create_transaction(
            Transaction::build(title, category, *amount, &tanggal),
            &conn,
        )?;
    }

    println!(
        "Success! The database holds {} transactions.",
        count_transactions(&conn)?
    );

    Ok(())
}
