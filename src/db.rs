//! Opens the application database and keeps its schema current.
//!
//! The schema version is stored in SQLite's `user_version` pragma. A database
//! with a different version is migrated destructively: the transaction table
//! is dropped and recreated, losing its rows.

use std::path::Path;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{Error, transaction::create_transaction_table};

/// The file name used for the database when no path is configured.
pub const DEFAULT_DB_FILE: &str = "transaction.db";

/// The version of the schema created by [initialize].
pub const SCHEMA_VERSION: i64 = 1;

/// Open the database at `path`, creating the file if needed, and initialize
/// its schema.
///
/// # Errors
/// Returns an [Error::SqlError] if the file cannot be opened or the schema
/// cannot be created.
pub fn open(path: &Path) -> Result<Connection, Error> {
    tracing::debug!("Opening database at {path:?}");
    let connection = Connection::open(path)?;
    initialize(&connection)?;

    Ok(connection)
}

/// Create the tables for the domain models, dropping tables written by a
/// different schema version first.
///
/// Safe to call on an already initialized database.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    let version = get_schema_version(&transaction)?;

    if version != SCHEMA_VERSION {
        if version != 0 {
            tracing::warn!(
                "Database schema version {version} does not match {SCHEMA_VERSION}, \
                recreating the transaction table. Existing transactions will be lost."
            );
        }

        transaction.execute_batch("DROP TABLE IF EXISTS \"transaction\";")?;
        create_transaction_table(&transaction)?;
        transaction.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    } else {
        create_transaction_table(&transaction)?;
    }

    transaction.commit()?;

    Ok(())
}

/// Read the schema version stored in the database header.
pub fn get_schema_version(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::transaction::{Transaction, create_transaction, get_all_transactions};

    use super::{SCHEMA_VERSION, get_schema_version, initialize};

    #[test]
    fn initialize_sets_schema_version() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).expect("Could not initialize database");

        assert_eq!(get_schema_version(&conn), Ok(SCHEMA_VERSION));
    }

    #[test]
    fn initialize_twice_keeps_rows() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_transaction(
            Transaction::build("Mi Ayam", "Pembelian", 15000.0, "2023-02-01 12:00:00"),
            &conn,
        )
        .unwrap();

        initialize(&conn).expect("Could not initialize database a second time");

        assert_eq!(get_all_transactions(&conn).unwrap().len(), 1);
    }

    #[test]
    fn version_mismatch_recreates_table() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_transaction(
            Transaction::build("Mi Ayam", "Pembelian", 15000.0, "2023-02-01 12:00:00"),
            &conn,
        )
        .unwrap();
        conn.execute_batch(&format!("PRAGMA user_version = {};", SCHEMA_VERSION + 1))
            .unwrap();

        initialize(&conn).expect("Could not migrate database");

        assert_eq!(get_all_transactions(&conn), Ok(vec![]));
        assert_eq!(get_schema_version(&conn), Ok(SCHEMA_VERSION));
    }

    #[test]
    fn unversioned_table_is_replaced() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE \"transaction\" (id INTEGER PRIMARY KEY, amount REAL NOT NULL)",
            (),
        )
        .unwrap();

        initialize(&conn).expect("Could not migrate database");

        let inserted = create_transaction(
            Transaction::build("Mi Ayam", "Pembelian", 15000.0, "2023-02-01 12:00:00"),
            &conn,
        );
        assert!(inserted.is_ok());
    }
}
