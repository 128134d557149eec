//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - The `TransactionStore` trait and its SQLite implementation

mod core;
mod store;

pub use self::core::{
    Transaction, TransactionBuilder, count_transactions, create_transaction,
    create_transaction_table, delete_transaction, get_all_transactions, map_transaction_row,
    update_transaction,
};
pub use store::{SQLiteTransactionStore, TransactionStore};
