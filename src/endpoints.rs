//! The API endpoint URIs.

/// The route for one page of transactions for a month.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for the monthly sales statistics.
pub const STATISTICS: &str = "/api/statistics";
/// The route for the fixed-bucket price histogram.
pub const BAR_CHART: &str = "/api/bar-chart";
/// The route for the category breakdown.
pub const PIE_CHART: &str = "/api/pie-chart";
/// The route for the combined report of all three chart views.
pub const COMBINE: &str = "/api/combine";
/// The route that reloads the store from the remote dataset.
pub const INIT_DB: &str = "/api/init-db";

// These tests are here so that we know the routes will parse as URIs.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::STATISTICS);
        assert_endpoint_is_valid_uri(endpoints::BAR_CHART);
        assert_endpoint_is_valid_uri(endpoints::PIE_CHART);
        assert_endpoint_is_valid_uri(endpoints::COMBINE);
        assert_endpoint_is_valid_uri(endpoints::INIT_DB);
    }
}
