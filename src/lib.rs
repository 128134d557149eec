//! Spendlog records expense transactions in a local SQLite database and tags
//! new records with the device location when location permission is granted.
//!
//! The library is split into:
//! - [transaction]: the transaction model and the store that persists it,
//! - [location]: the permission-gated location lookup,
//! - [host]: permissions and the events the host environment delivers,
//! - [workflow]: the state machine that waits for permission and then runs
//!   the insert, list, update, list, delete sequence.

#![warn(missing_docs)]

mod database_id;

pub mod config;
pub mod db;
pub mod host;
pub mod location;
pub mod logging;
pub mod transaction;
pub mod workflow;

pub use database_id::{DatabaseId, TransactionId};
pub use db::initialize as initialize_db;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update transaction {0}, which is not in the database")]
    UpdateMissingTransaction(TransactionId),

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete transaction {0}, which is not in the database")]
    DeleteMissingTransaction(TransactionId),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The transaction list was empty when a step needed its last entry.
    #[error("there are no transactions in the database")]
    NoTransactions,

    /// A position string was not of the form "latitude,longitude".
    #[error("invalid position \"{0}\", expected \"latitude,longitude\"")]
    InvalidPosition(String),

    /// A task on the blocking thread pool panicked or was cancelled.
    #[error("background task failed: {0}")]
    TaskFailed(String),
}

impl Error {
    /// Whether the error means the referenced transaction does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound
                | Error::UpdateMissingTransaction(_)
                | Error::DeleteMissingTransaction(_)
        )
    }

    /// Whether the error came from the storage layer itself.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::SqlError(_) | Error::DatabaseLockError)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
