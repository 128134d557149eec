//! Defines the core data model and database queries for transactions.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::TransactionId, location::NO_LOCATION};

// ============================================================================
// MODELS
// ============================================================================

/// An expense, i.e. an event where money was spent.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction, assigned by the database.
    pub id: TransactionId,
    /// A short description of what the money was spent on.
    pub title: String,
    /// The kind of expense, e.g. "Pembelian".
    pub category: String,
    /// The amount of money spent. The sign is not checked.
    pub amount: f64,
    /// Where the transaction was recorded, either "latitude,longitude" or
    /// [NO_LOCATION].
    pub location: String,
    /// When the transaction happened, stored exactly as given.
    pub tanggal: String,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(title: &str, category: &str, amount: f64, tanggal: &str) -> TransactionBuilder {
        TransactionBuilder {
            title: title.to_owned(),
            category: category.to_owned(),
            amount,
            location: NO_LOCATION.to_owned(),
            tanggal: tanggal.to_owned(),
        }
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Transaction ID: {}, Title: {}, Category: {}, Amount: {}, Location: {}, Date: {}",
            self.id, self.title, self.category, self.amount, self.location, self.tanggal
        )
    }
}

/// A transaction that has not been saved yet and so has no ID.
///
/// The location defaults to [NO_LOCATION].
///
/// # Examples
///
/// ```
/// use spendlog::transaction::Transaction;
///
/// let builder = Transaction::build("Mi Ayam", "Pembelian", 15000.0, "2023-02-01 12:00:00")
///     .location("-6.914744,107.609810");
///
/// assert_eq!(builder.location, "-6.914744,107.609810");
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// A short description of what the money was spent on.
    pub title: String,
    /// The kind of expense.
    pub category: String,
    /// The amount of money spent.
    pub amount: f64,
    /// Where the transaction was recorded.
    pub location: String,
    /// When the transaction happened.
    pub tanggal: String,
}

impl TransactionBuilder {
    /// Set the location for the transaction.
    pub fn location(mut self, location: &str) -> Self {
        self.location = location.to_owned();
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (title, category, amount, location, tanggal)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, title, category, amount, location, tanggal",
        )?
        .query_row(
            (
                builder.title,
                builder.category,
                builder.amount,
                builder.location,
                builder.tanggal,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve every transaction, oldest first.
///
/// IDs are never reused, so ordering by ID gives insertion order and the last
/// element is the most recently created transaction.
///
/// # Errors
/// This function will return a [Error::SqlError] there is an SQL error.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, title, category, amount, location, tanggal FROM \"transaction\" ORDER BY id ASC",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Replace every field of the stored transaction with the same ID as
/// `transaction`, except for the ID itself.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if no transaction has that ID,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(transaction: &Transaction, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET title = ?1, category = ?2, amount = ?3, location = ?4, tanggal = ?5
         WHERE id = ?6",
        (
            &transaction.title,
            &transaction.category,
            transaction.amount,
            &transaction.location,
            &transaction.tanggal,
            transaction.id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction(transaction.id));
    }

    Ok(())
}

/// Delete a transaction by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if no transaction has that ID,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction(id));
    }

    Ok(())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                location TEXT NOT NULL,
                tanggal TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let category = row.get(2)?;
    let amount = row.get(3)?;
    let location = row.get(4)?;
    let tanggal = row.get(5)?;

    Ok(Transaction {
        id,
        title,
        category,
        amount,
        location,
        tanggal,
    })
}

// ============================================================================
// TESTS
// ============================================================================
