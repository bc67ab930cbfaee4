//! Application router configuration.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    AppState,
    aggregation::{
        post_bar_chart_endpoint, post_combine_endpoint, post_pie_chart_endpoint,
        post_statistics_endpoint,
    },
    endpoints,
    logging::logging_middleware,
    seed::get_init_db_endpoint,
    transaction::post_transactions_endpoint,
};

/// Return a router with all the app's routes.
///
/// The CORS layer is wide open: the dashboard client is served from its own
/// origin and the API carries no credentials.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(endpoints::TRANSACTIONS, post(post_transactions_endpoint))
        .route(endpoints::STATISTICS, post(post_statistics_endpoint))
        .route(endpoints::BAR_CHART, post(post_bar_chart_endpoint))
        .route(endpoints::PIE_CHART, post(post_pie_chart_endpoint))
        .route(endpoints::COMBINE, post(post_combine_endpoint))
        .route(endpoints::INIT_DB, get(get_init_db_endpoint))
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
