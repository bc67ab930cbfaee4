//! Sales-transaction management.
//!
//! This module contains everything related to the transaction records
//! themselves:
//! - The `Transaction` and `NewTransaction` models
//! - Database functions for querying and bulk-replacing transactions
//! - The route handler for the paginated, searchable listing endpoint

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row, params_from_iter};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    Error,
    app_state::AppState,
    filter::TransactionFilter,
    month,
    pagination::{PageSlice, PaginationConfig},
};

/// The database ID for a transaction.
pub type DatabaseID = i64;

// ============================================================================
// MODELS
// ============================================================================

/// A sales-transaction record: one product and whether it has been sold.
///
/// Field names on the wire are the contract the dashboard client depends on,
/// including the camel-cased `dateOfSale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID assigned by the store on insert. Immutable and unique.
    pub id: DatabaseID,
    /// The product title.
    pub title: String,
    /// The product description.
    pub description: String,
    /// The sale price. Non-negative.
    pub price: f64,
    /// Free-form product category label. Not a closed set.
    pub category: String,
    /// Whether the product has been sold.
    pub sold: bool,
    /// When the sale happened. Only the month component is used for
    /// filtering.
    #[serde(rename = "dateOfSale", with = "time::serde::rfc3339")]
    pub date_of_sale: OffsetDateTime,
    /// URL of the product image.
    pub image: String,
}

/// A transaction that has not been stored yet, i.e. has no ID.
///
/// This is the shape of a document in the remote seed dataset. The dataset
/// carries its own numeric `id` field, which is ignored on import: the store
/// assigns IDs on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// The product title.
    pub title: String,
    /// The product description.
    pub description: String,
    /// The sale price.
    pub price: f64,
    /// Free-form product category label.
    pub category: String,
    /// Whether the product has been sold.
    pub sold: bool,
    /// When the sale happened.
    #[serde(rename = "dateOfSale", with = "time::serde::rfc3339")]
    pub date_of_sale: OffsetDateTime,
    /// URL of the product image.
    pub image: String,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// The request body for the transaction listing endpoint.
#[derive(Debug, Deserialize)]
pub struct TransactionsRequest {
    /// English month name, e.g. "March". Case-sensitive.
    pub month: String,
    /// 1-indexed page number. Defaults to the configured page.
    pub page: Option<i64>,
    /// Page size. Defaults to the configured page size.
    #[serde(rename = "perPage")]
    pub per_page: Option<i64>,
    /// Optional term matched against title, description and exact price.
    pub search: Option<String>,
}

/// The response body for the transaction listing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsResponse {
    /// Whether the request succeeded. Failures short-circuit into plain-text
    /// error responses instead, so this is always true.
    pub success: bool,
    /// One page of matching transactions, in store order.
    pub data: Vec<Transaction>,
    /// How many pages match the filter at the requested page size.
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

/// The state needed by the transaction listing endpoint.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Defaults for page and page size.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler for one page of a month's transactions, optionally
/// narrowed by a search term.
///
/// The match count and the page slice are two separate queries sharing one
/// filter; under a concurrent reseed they can briefly disagree. That window
/// is accepted, the listing does not lock the store across both reads.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn post_transactions_endpoint(
    State(state): State<TransactionsState>,
    Json(request): Json<TransactionsRequest>,
) -> Response {
    let month = match month::resolve(&request.month) {
        Ok(month) => month,
        Err(error) => return error.into_response(),
    };

    let slice = match PageSlice::new(
        request.page.unwrap_or(state.pagination_config.default_page),
        request
            .per_page
            .unwrap_or(state.pagination_config.default_page_size),
    ) {
        Ok(slice) => slice,
        Err(error) => return error.into_response(),
    };

    let filter = TransactionFilter::with_search(month, request.search);

    let connection = state.db_connection.lock().unwrap();

    let total = match count_transactions(&filter, &connection) {
        Ok(total) => total,
        Err(error) => return error.into_response(),
    };

    let transactions = match query_transactions_page(&filter, slice, &connection) {
        Ok(transactions) => transactions,
        Err(error) => return error.into_response(),
    };

    Json(TransactionsResponse {
        success: true,
        data: transactions,
        total_pages: slice.total_pages(total),
    })
    .into_response()
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Count the transactions matching `filter`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn count_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, parameters) = filter.where_clause();

    connection
        .query_row(
            &format!("SELECT COUNT(id) FROM \"transaction\" {where_clause}"),
            params_from_iter(parameters.iter()),
            |row| row.get::<_, i64>(0).map(|count| count as u64),
        )
        .map_err(|error| error.into())
}

/// Fetch one page of the transactions matching `filter`.
///
/// Rows are ordered by ID so the page boundaries are stable across the
/// count and fetch queries of one request.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn query_transactions_page(
    filter: &TransactionFilter,
    slice: PageSlice,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, parameters) = filter.where_clause();
    let query = format!(
        "SELECT id, title, description, price, category, sold, date_of_sale, image \
         FROM \"transaction\" {where_clause} ORDER BY id ASC LIMIT {} OFFSET {}",
        slice.limit(),
        slice.offset(),
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(parameters.iter()), map_transaction_row)?
        .map(|row_result| row_result.map_err(Error::SqlError))
        .collect()
}

/// Replace the entire contents of the store with `records`.
///
/// Destructive and not atomic: the delete and the inserts are separate
/// statements, so a failure partway through can leave the store empty or
/// partially loaded. Intended for administrative seeding, not the normal
/// request path.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDate] if a record's timestamp cannot be formatted,
/// - [Error::SqlError] if there is some other SQL error.
pub fn replace_all_transactions(
    records: &[NewTransaction],
    connection: &Connection,
) -> Result<usize, Error> {
    connection.execute("DELETE FROM \"transaction\"", ())?;

    let mut statement = connection.prepare(
        "INSERT INTO \"transaction\" \
         (title, description, price, category, sold, date_of_sale, image)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for record in records {
        statement.execute((
            &record.title,
            &record.description,
            record.price,
            &record.category,
            record.sold,
            format_sale_date(record.date_of_sale)?,
            &record.image,
        ))?;
    }

    Ok(records.len())
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
                description TEXT NOT NULL,
                price REAL NOT NULL,
                category TEXT NOT NULL,
                sold INTEGER NOT NULL,
                date_of_sale TEXT NOT NULL,
                image TEXT NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    Ok(())
}

// Timestamps are stored as RFC 3339 text so SQLite's date functions can read
// the month component back out of them.
fn format_sale_date(date_of_sale: OffsetDateTime) -> Result<String, Error> {
    date_of_sale
        .format(&Rfc3339)
        .map_err(|error| Error::InvalidDate(error.to_string()))
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let date_text: String = row.get(6)?;
    let date_of_sale = OffsetDateTime::parse(&date_text, &Rfc3339).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category: row.get(4)?,
        sold: row.get(5)?,
        date_of_sale,
        image: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod transaction_store_tests {
    use crate::{
        filter::TransactionFilter,
        pagination::PageSlice,
        test_utils::{open_test_connection, sample_record},
        transaction::NewTransaction,
    };

    use super::{count_transactions, query_transactions_page, replace_all_transactions};

    #[test]
    fn count_is_scoped_to_the_month() {
        let connection = open_test_connection();
        replace_all_transactions(
            &[
                sample_record("Wireless Mouse", 50.0, 3, true, "electronics"),
                sample_record("Desk Lamp", 80.0, 3, false, "lighting"),
                sample_record("Monitor", 300.0, 4, true, "electronics"),
            ],
            &connection,
        )
        .unwrap();

        let march = count_transactions(&TransactionFilter::month_only(3), &connection).unwrap();
        let april = count_transactions(&TransactionFilter::month_only(4), &connection).unwrap();
        let may = count_transactions(&TransactionFilter::month_only(5), &connection).unwrap();

        assert_eq!(march, 2);
        assert_eq!(april, 1);
        assert_eq!(may, 0);
    }

    #[test]
    fn search_matches_substrings_case_insensitively() {
        let connection = open_test_connection();
        replace_all_transactions(
            &[
                sample_record("Smartphone", 400.0, 3, true, "electronics"),
                NewTransaction {
                    description: "a PHONE stand".to_owned(),
                    ..sample_record("Desk Accessory", 20.0, 3, false, "office")
                },
                sample_record("Desk Lamp", 80.0, 3, false, "lighting"),
            ],
            &connection,
        )
        .unwrap();

        let filter = TransactionFilter::with_search(3, Some("phone".to_owned()));

        let count = count_transactions(&filter, &connection).unwrap();

        assert_eq!(count, 2, "should match title and description hits");
    }

    #[test]
    fn numeric_search_matches_price_exactly_and_text_hits() {
        let connection = open_test_connection();
        replace_all_transactions(
            &[
                sample_record("Mechanical Keyboard", 150.0, 3, true, "electronics"),
                NewTransaction {
                    description: "fits a 150cm desk".to_owned(),
                    ..sample_record("Desk Mat", 25.0, 3, false, "office")
                },
                sample_record("Mouse Pad", 15.0, 3, false, "office"),
                sample_record("Monitor Arm", 150.5, 3, true, "office"),
            ],
            &connection,
        )
        .unwrap();

        let filter = TransactionFilter::with_search(3, Some("150".to_owned()));

        let matches = query_transactions_page(
            &filter,
            PageSlice::new(1, 10).unwrap(),
            &connection,
        )
        .unwrap();

        let titles: Vec<&str> = matches
            .iter()
            .map(|transaction| transaction.title.as_str())
            .collect();

        assert_eq!(titles, ["Mechanical Keyboard", "Desk Mat"]);
    }

    #[test]
    fn search_treats_like_wildcards_literally() {
        let connection = open_test_connection();
        replace_all_transactions(
            &[
                sample_record("100% Cotton Shirt", 30.0, 3, true, "clothing"),
                sample_record("1000 Piece Puzzle", 25.0, 3, false, "toys"),
            ],
            &connection,
        )
        .unwrap();

        let filter = TransactionFilter::with_search(3, Some("100%".to_owned()));

        let count = count_transactions(&filter, &connection).unwrap();

        assert_eq!(count, 1, "the % must not act as a wildcard");
    }

    #[test]
    fn pages_are_sliced_in_id_order() {
        let connection = open_test_connection();
        let records: Vec<_> = (1..=25)
            .map(|i| sample_record(&format!("Item {i:02}"), i as f64, 6, true, "bulk"))
            .collect();
        replace_all_transactions(&records, &connection).unwrap();

        let filter = TransactionFilter::month_only(6);

        let page_one =
            query_transactions_page(&filter, PageSlice::new(1, 10).unwrap(), &connection).unwrap();
        let page_three =
            query_transactions_page(&filter, PageSlice::new(3, 10).unwrap(), &connection).unwrap();

        assert_eq!(page_one.len(), 10);
        assert_eq!(page_one[0].title, "Item 01");
        assert_eq!(page_three.len(), 5);
        assert_eq!(page_three[0].title, "Item 21");
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() {
        let connection = open_test_connection();
        replace_all_transactions(
            &[sample_record("Lone Item", 10.0, 3, true, "misc")],
            &connection,
        )
        .unwrap();

        let page = query_transactions_page(
            &TransactionFilter::month_only(3),
            PageSlice::new(2, 10).unwrap(),
            &connection,
        )
        .unwrap();

        assert!(page.is_empty());
    }

    #[test]
    fn replace_all_discards_the_previous_contents() {
        let connection = open_test_connection();
        replace_all_transactions(
            &[
                sample_record("Old Item A", 10.0, 1, true, "old"),
                sample_record("Old Item B", 20.0, 1, false, "old"),
            ],
            &connection,
        )
        .unwrap();

        let count = replace_all_transactions(
            &[sample_record("New Item", 30.0, 2, true, "new")],
            &connection,
        )
        .unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            count_transactions(&TransactionFilter::month_only(1), &connection).unwrap(),
            0
        );
        assert_eq!(
            count_transactions(&TransactionFilter::month_only(2), &connection).unwrap(),
            1
        );
    }

    #[test]
    fn round_trips_the_record_fields() {
        let connection = open_test_connection();
        let record = sample_record("Wireless Mouse", 49.99, 9, true, "electronics");
        replace_all_transactions(std::slice::from_ref(&record), &connection).unwrap();

        let page = query_transactions_page(
            &TransactionFilter::month_only(9),
            PageSlice::new(1, 10).unwrap(),
            &connection,
        )
        .unwrap();

        assert_eq!(page.len(), 1);
        let stored = &page[0];
        assert_eq!(stored.title, record.title);
        assert_eq!(stored.description, record.description);
        assert_eq!(stored.price, record.price);
        assert_eq!(stored.category, record.category);
        assert_eq!(stored.sold, record.sold);
        assert_eq!(stored.date_of_sale, record.date_of_sale);
        assert_eq!(stored.image, record.image);
    }
}
