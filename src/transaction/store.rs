//! Defines the transaction store trait and its SQLite implementation.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{
        Transaction, TransactionBuilder, create_transaction, delete_transaction,
        get_all_transactions, update_transaction,
    },
};

/// Handles the creation, retrieval, update and removal of transactions.
pub trait TransactionStore {
    /// Save a new transaction and return the ID the store assigned to it.
    fn insert(&mut self, builder: TransactionBuilder) -> Result<TransactionId, Error>;

    /// Retrieve every transaction in ascending ID order, which is the order
    /// they were inserted in.
    fn list_all(&self) -> Result<Vec<Transaction>, Error>;

    /// Overwrite the stored transaction with the same ID as `transaction`.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error>;

    /// Remove the transaction with the ID `id`.
    fn delete(&mut self, id: TransactionId) -> Result<(), Error>;
}

/// Stores transactions in a SQLite database.
///
/// The database must have been set up with [crate::db::initialize].
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire the database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn insert(&mut self, builder: TransactionBuilder) -> Result<TransactionId, Error> {
        let connection = self.lock()?;

        create_transaction(builder, &connection).map(|transaction| transaction.id)
    }

    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn list_all(&self) -> Result<Vec<Transaction>, Error> {
        let connection = self.lock()?;

        get_all_transactions(&connection)
    }

    /// # Errors
    /// This function will return a:
    /// - [Error::UpdateMissingTransaction] if no transaction has the ID,
    /// - or [Error::SqlError] there is some other SQL error.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error> {
        let connection = self.lock()?;

        update_transaction(transaction, &connection)
    }

    /// # Errors
    /// This function will return a:
    /// - [Error::DeleteMissingTransaction] if no transaction has the ID,
    /// - or [Error::SqlError] there is some other SQL error.
    fn delete(&mut self, id: TransactionId) -> Result<(), Error> {
        let connection = self.lock()?;

        delete_transaction(id, &connection)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        location::NO_LOCATION,
        transaction::{SQLiteTransactionStore, Transaction, TransactionStore},
    };

    fn get_store() -> SQLiteTransactionStore {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        SQLiteTransactionStore::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn insert_returns_id_of_listed_row() {
        let mut store = get_store();

        let id = store
            .insert(Transaction::build(
                "Mi Ayam",
                "Pembelian",
                15000.0,
                "2023-02-01 12:00:00",
            ))
            .expect("Could not insert transaction");

        let transactions = store.list_all().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].id, id);
    }

    #[test]
    fn clones_share_the_same_database() {
        let mut store = get_store();
        let other = store.clone();

        let id = store
            .insert(Transaction::build("Bakso", "Pembelian", 12000.0, ""))
            .unwrap();

        let listed = other.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].title, "Bakso");
    }

    // The end-to-end scenario run without location permission.
    #[test]
    fn insert_update_delete_scenario() {
        let mut store = get_store();

        let id = store
            .insert(Transaction::build(
                "Mi Ayam",
                "Pembelian",
                15000.0,
                "2023-02-01 12:00:00",
            ))
            .unwrap();
        let listed = store.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].location, NO_LOCATION);

        let updated = Transaction {
            title: "Nasi Goreng".to_owned(),
            ..listed[0].clone()
        };
        store.update(&updated).unwrap();
        let listed = store.list_all().unwrap();
        assert_eq!(listed, vec![updated]);
        assert_eq!(listed[0].id, id);

        store.delete(id).unwrap();
        assert_eq!(store.list_all(), Ok(vec![]));
        assert_eq!(store.delete(id), Err(Error::DeleteMissingTransaction(id)));
    }

    #[test]
    fn poisoned_lock_is_a_storage_error() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let connection = Arc::new(Mutex::new(conn));
        let poisoner = connection.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        let store = SQLiteTransactionStore::new(connection);

        let result = store.list_all();

        assert_eq!(result, Err(Error::DatabaseLockError));
        assert!(result.unwrap_err().is_storage());
    }
}
