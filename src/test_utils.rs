//! Shared fixtures for the crate's tests.

use rusqlite::Connection;
use time::{Month, macros::datetime};

use crate::{db::initialize, transaction::NewTransaction};

/// An initialized in-memory database.
pub fn open_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// A record dated mid-month in `month` of 2021, so month filtering is
/// unaffected by timezone normalization at month boundaries.
pub fn sample_record(
    title: &str,
    price: f64,
    month: u8,
    sold: bool,
    category: &str,
) -> NewTransaction {
    let date_of_sale = datetime!(2021-01-15 12:30:00 UTC)
        .replace_month(Month::try_from(month).expect("month must be in 1..=12"))
        .expect("mid-month date is valid in every month");

    NewTransaction {
        title: title.to_owned(),
        description: format!("{title} description"),
        price,
        category: category.to_owned(),
        sold,
        date_of_sale,
        image: format!("https://example.com/images/{}.png", title.replace(' ', "-")),
    }
}

/// The reference scenario: three March sales priced 50, 150 and 950, the
/// first two sold and the last one not.
pub fn march_scenario() -> Vec<NewTransaction> {
    vec![
        sample_record("Wireless Mouse", 50.0, 3, true, "electronics"),
        sample_record("Mechanical Keyboard", 150.0, 3, true, "electronics"),
        sample_record("Standing Desk", 950.0, 3, false, "furniture"),
    ]
}
