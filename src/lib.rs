//! Salesboard is the backend for a sales-transaction dashboard.
//!
//! This library provides a JSON REST API over a single collection of sales
//! transactions: a paginated, searchable listing plus three aggregated chart
//! views (sales statistics, a fixed-bucket price histogram, and a category
//! breakdown), all scoped to a calendar month. An administrative endpoint
//! reloads the collection from a remote product dataset.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod aggregation;
mod app_state;
mod db;
mod endpoints;
mod filter;
mod logging;
mod month;
mod pagination;
mod routing;
mod seed;
#[cfg(test)]
mod test_utils;
mod transaction;

pub use app_state::AppState;
pub use pagination::PaginationConfig;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request named a month that is not one of the twelve English month
    /// names. The client should correct the month and retry; matching is
    /// case-sensitive.
    #[error("{0:?} is not a valid month name")]
    InvalidMonth(String),

    /// The request asked for a page or page size that is not positive.
    #[error("page and perPage must be positive, got page {page} and perPage {per_page}")]
    InvalidPagination {
        /// The 1-indexed page number from the request.
        page: i64,
        /// The page size from the request.
        per_page: i64,
    },

    /// An unhandled/unexpected SQL error.
    ///
    /// The error detail should only be logged for debugging on the server,
    /// never sent to the client.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// The seed dataset could not be fetched from the remote source.
    #[error("could not fetch the seed dataset: {0}")]
    UpstreamFetchFailed(String),

    /// The seed dataset was fetched but contained a record that does not
    /// match the transaction schema. Nothing is deleted or inserted when
    /// this occurs.
    #[error("malformed seed dataset: {0}")]
    MalformedDataset(String),

    /// A sale timestamp could not be formatted for storage.
    #[error("could not format the date of sale: {0}")]
    InvalidDate(String),
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        Error::SqlError(error)
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::UpstreamFetchFailed(error.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidMonth(_) => (StatusCode::BAD_REQUEST, "Invalid month").into_response(),
            Error::InvalidPagination { .. } => {
                (StatusCode::BAD_REQUEST, "Invalid pagination parameters").into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
