//! One-shot import of the remote product dataset into the store.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    app_state::AppState,
    transaction::{NewTransaction, replace_all_transactions},
};

/// The response body for the init-db endpoint.
#[derive(Debug, Serialize)]
pub struct InitDbResponse {
    /// Whether the import succeeded.
    pub success: bool,
    /// The dataset exactly as fetched, before the store assigned IDs.
    pub data: Vec<serde_json::Value>,
}

/// The state needed by the init-db endpoint.
#[derive(Debug, Clone)]
pub struct SeedState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where the canonical product dataset lives.
    pub dataset_url: String,
}

impl FromRef<AppState> for SeedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            dataset_url: state.dataset_url.clone(),
        }
    }
}

/// A route handler that reloads the store from the remote dataset.
///
/// Destructive: the existing records are deleted before the fetched set is
/// inserted, and the two steps are not one atomic unit, so a failure while
/// inserting can leave the store empty. Fetching and parsing happen first,
/// which keeps a bad upstream payload from touching the store at all.
/// Intended for one-time/administrative use, not request-path traffic.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_init_db_endpoint(State(state): State<SeedState>) -> Response {
    let raw_records = match fetch_dataset(&state.dataset_url).await {
        Ok(raw_records) => raw_records,
        Err(error) => return error.into_response(),
    };

    let records = match parse_records(&raw_records) {
        Ok(records) => records,
        Err(error) => return error.into_response(),
    };

    {
        let connection = state.db_connection.lock().unwrap();

        if let Err(error) = replace_all_transactions(&records, &connection) {
            return error.into_response();
        }
    }

    tracing::info!("Reloaded the transaction store with {} records.", records.len());

    Json(InitDbResponse {
        success: true,
        data: raw_records,
    })
    .into_response()
}

/// Fetch the raw dataset from `url`.
///
/// # Errors
/// Returns [Error::UpstreamFetchFailed] if the request fails, the server
/// responds with an error status, or the body is not a JSON array.
pub async fn fetch_dataset(url: &str) -> Result<Vec<serde_json::Value>, Error> {
    let records = reqwest::get(url)
        .await?
        .error_for_status()?
        .json::<Vec<serde_json::Value>>()
        .await?;

    Ok(records)
}

/// Deserialize the raw dataset documents into storable records.
///
/// Runs before anything is deleted, so a malformed dataset fails the import
/// with the previous contents intact.
///
/// # Errors
/// Returns [Error::MalformedDataset] naming the first document that does
/// not match the transaction schema.
pub fn parse_records(raw_records: &[serde_json::Value]) -> Result<Vec<NewTransaction>, Error> {
    raw_records
        .iter()
        .enumerate()
        .map(|(index, document)| {
            serde_json::from_value(document.clone())
                .map_err(|error| Error::MalformedDataset(format!("record {index}: {error}")))
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
