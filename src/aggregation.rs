//! The aggregated chart views over a month's transactions.
//!
//! Three independent views feed the dashboard's charts: scalar sales
//! statistics, a histogram over ten fixed price ranges, and a per-category
//! breakdown. A fourth endpoint returns all three in one response. Every
//! view filters by month alone; the listing endpoint's search term
//! deliberately does not apply here.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};

use crate::{Error, app_state::AppState, filter::TransactionFilter, month};

// ============================================================================
// MODELS
// ============================================================================

/// The sales statistics for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesStatistics {
    /// Sum of the sale price over all matching transactions.
    #[serde(rename = "totalSale")]
    pub total_sale: f64,
    /// How many matching transactions are sold.
    pub sold: u64,
    /// How many matching transactions are unsold.
    #[serde(rename = "notSold")]
    pub not_sold: u64,
}

/// A fixed price range and the number of matching transactions priced in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCount {
    /// The bucket label, e.g. "101-200".
    pub range: String,
    /// Transactions priced within the bucket, bounds inclusive.
    pub count: u64,
}

/// The number of a month's transactions in one product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// The category label, exactly as stored. The wire name `_id` follows
    /// the dashboard client's contract.
    #[serde(rename = "_id")]
    pub category: String,
    /// Transactions in this category.
    pub count: u64,
}

struct PriceBucket {
    label: &'static str,
    min: f64,
    /// None for the open-ended last bucket.
    max: Option<f64>,
}

/// The histogram buckets, in output order. A system constant, not
/// configurable per request; together the buckets cover every non-negative
/// price exactly once.
const PRICE_BUCKETS: [PriceBucket; 10] = [
    PriceBucket {
        label: "0-100",
        min: 0.0,
        max: Some(100.0),
    },
    PriceBucket {
        label: "101-200",
        min: 101.0,
        max: Some(200.0),
    },
    PriceBucket {
        label: "201-300",
        min: 201.0,
        max: Some(300.0),
    },
    PriceBucket {
        label: "301-400",
        min: 301.0,
        max: Some(400.0),
    },
    PriceBucket {
        label: "401-500",
        min: 401.0,
        max: Some(500.0),
    },
    PriceBucket {
        label: "501-600",
        min: 501.0,
        max: Some(600.0),
    },
    PriceBucket {
        label: "601-700",
        min: 601.0,
        max: Some(700.0),
    },
    PriceBucket {
        label: "701-800",
        min: 701.0,
        max: Some(800.0),
    },
    PriceBucket {
        label: "801-900",
        min: 801.0,
        max: Some(900.0),
    },
    PriceBucket {
        label: "901-above",
        min: 901.0,
        max: None,
    },
];

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Compute the sales statistics for a month.
///
/// A month with no matching transactions yields a zero-valued row rather
/// than no row, so chart clients never need an empty-result branch.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn sales_statistics(month: u8, connection: &Connection) -> Result<SalesStatistics, Error> {
    let (where_clause, parameters) = TransactionFilter::month_only(month).where_clause();

    connection
        .query_row(
            &format!(
                "SELECT COALESCE(SUM(price), 0.0),
                        COALESCE(SUM(CASE WHEN sold THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN sold THEN 0 ELSE 1 END), 0)
                 FROM \"transaction\" {where_clause}"
            ),
            params_from_iter(parameters.iter()),
            |row| {
                Ok(SalesStatistics {
                    total_sale: row.get(0)?,
                    sold: row.get::<_, i64>(1)? as u64,
                    not_sold: row.get::<_, i64>(2)? as u64,
                })
            },
        )
        .map_err(|error| error.into())
}

/// Count a month's transactions in each of the ten fixed price buckets.
///
/// Always returns ten rows in bucket order, including zero counts.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn price_histogram(month: u8, connection: &Connection) -> Result<Vec<RangeCount>, Error> {
    PRICE_BUCKETS
        .iter()
        .map(|bucket| {
            count_in_price_range(month, bucket, connection).map(|count| RangeCount {
                range: bucket.label.to_owned(),
                count,
            })
        })
        .collect()
}

fn count_in_price_range(
    month: u8,
    bucket: &PriceBucket,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, mut parameters) = TransactionFilter::month_only(month).where_clause();

    parameters.push(Value::Real(bucket.min));
    let mut query = format!(
        "SELECT COUNT(id) FROM \"transaction\" {where_clause} AND price >= ?{}",
        parameters.len()
    );

    if let Some(max) = bucket.max {
        parameters.push(Value::Real(max));
        query.push_str(&format!(" AND price <= ?{}", parameters.len()));
    }

    connection
        .query_row(&query, params_from_iter(parameters.iter()), |row| {
            row.get::<_, i64>(0).map(|count| count as u64)
        })
        .map_err(|error| error.into())
}

/// Count a month's transactions per product category.
///
/// Category labels are grouped exactly as stored, case-sensitively. The
/// output cardinality depends on the data; rows are ordered by category
/// name so responses are deterministic.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn category_breakdown(month: u8, connection: &Connection) -> Result<Vec<CategoryCount>, Error> {
    let (where_clause, parameters) = TransactionFilter::month_only(month).where_clause();

    connection
        .prepare(&format!(
            "SELECT category, COUNT(id) FROM \"transaction\" {where_clause} \
             GROUP BY category ORDER BY category ASC"
        ))?
        .query_map(params_from_iter(parameters.iter()), |row| {
            Ok(CategoryCount {
                category: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })?
        .map(|row_result| row_result.map_err(Error::SqlError))
        .collect()
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// The request body shared by the chart endpoints.
#[derive(Debug, Deserialize)]
pub struct ChartRequest {
    /// English month name, e.g. "March". Case-sensitive.
    pub month: String,
}

/// The response body for the statistics endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatisticsResponse {
    /// Whether the request succeeded. Always true on this path.
    pub success: bool,
    /// The statistics row, wrapped in a one-element array per the client
    /// contract.
    pub data: Vec<SalesStatistics>,
}

/// The response body for the bar-chart endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct BarChartResponse {
    /// Whether the request succeeded. Always true on this path.
    pub success: bool,
    /// Ten rows, one per fixed price bucket, in bucket order.
    pub data: Vec<RangeCount>,
}

/// The response body for the pie-chart endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct PieChartResponse {
    /// Whether the request succeeded. Always true on this path.
    pub success: bool,
    /// One row per distinct category present in the month.
    pub data: Vec<CategoryCount>,
}

/// The combined report: all three chart views for one month.
#[derive(Debug, Serialize, Deserialize)]
pub struct CombineResponse {
    /// Whether the request succeeded. Always true on this path.
    pub success: bool,
    /// The pie-chart view, wrapped like the standalone endpoint response.
    #[serde(rename = "firstData")]
    pub first_data: PieChartResponse,
    /// The bar-chart view, wrapped like the standalone endpoint response.
    #[serde(rename = "secondData")]
    pub second_data: BarChartResponse,
    /// The statistics view, wrapped like the standalone endpoint response.
    #[serde(rename = "thirdData")]
    pub third_data: StatisticsResponse,
}

/// The state needed by the chart endpoints.
#[derive(Debug, Clone)]
pub struct ChartState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ChartState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for the monthly sales statistics.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn post_statistics_endpoint(
    State(state): State<ChartState>,
    Json(request): Json<ChartRequest>,
) -> Response {
    let month = match month::resolve(&request.month) {
        Ok(month) => month,
        Err(error) => return error.into_response(),
    };

    let connection = state.db_connection.lock().unwrap();

    match sales_statistics(month, &connection) {
        Ok(statistics) => Json(StatisticsResponse {
            success: true,
            data: vec![statistics],
        })
        .into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for the price-range histogram.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn post_bar_chart_endpoint(
    State(state): State<ChartState>,
    Json(request): Json<ChartRequest>,
) -> Response {
    let month = match month::resolve(&request.month) {
        Ok(month) => month,
        Err(error) => return error.into_response(),
    };

    let connection = state.db_connection.lock().unwrap();

    match price_histogram(month, &connection) {
        Ok(histogram) => Json(BarChartResponse {
            success: true,
            data: histogram,
        })
        .into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for the category breakdown.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn post_pie_chart_endpoint(
    State(state): State<ChartState>,
    Json(request): Json<ChartRequest>,
) -> Response {
    let month = match month::resolve(&request.month) {
        Ok(month) => month,
        Err(error) => return error.into_response(),
    };

    let connection = state.db_connection.lock().unwrap();

    match category_breakdown(month, &connection) {
        Ok(categories) => Json(PieChartResponse {
            success: true,
            data: categories,
        })
        .into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for the combined report.
///
/// The three views are computed in-process against the same store rather
/// than by calling the sibling endpoints over HTTP. Any sub-view failure
/// aborts the whole call; there is no partial success.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn post_combine_endpoint(
    State(state): State<ChartState>,
    Json(request): Json<ChartRequest>,
) -> Response {
    let month = match month::resolve(&request.month) {
        Ok(month) => month,
        Err(error) => return error.into_response(),
    };

    let connection = state.db_connection.lock().unwrap();

    let report = category_breakdown(month, &connection).and_then(|categories| {
        let histogram = price_histogram(month, &connection)?;
        let statistics = sales_statistics(month, &connection)?;

        Ok(CombineResponse {
            success: true,
            first_data: PieChartResponse {
                success: true,
                data: categories,
            },
            second_data: BarChartResponse {
                success: true,
                data: histogram,
            },
            third_data: StatisticsResponse {
                success: true,
                data: vec![statistics],
            },
        })
    });

    match report {
        Ok(report) => Json(report).into_response(),
        Err(error) => error.into_response(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
