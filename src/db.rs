//! Database schema setup.

use rusqlite::Connection;

use crate::transaction::create_transaction_table;

/// Set up the tables for the application's models.
///
/// Safe to call on a database that already has the tables.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    create_transaction_table(connection)
}
