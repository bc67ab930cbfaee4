//! Builds the SQL filter shared by the listing and aggregation queries.

use rusqlite::types::Value;

/// The filter applied to transaction queries: a sale month plus an optional
/// free-text search term.
///
/// The same filter value is reused by the match-count query and the page
/// query of a listing request, so both always see the same condition. The
/// aggregation views filter by month alone and use
/// [TransactionFilter::month_only].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    month: u8,
    search: Option<String>,
}

impl TransactionFilter {
    /// Filter by sale month alone.
    pub fn month_only(month: u8) -> Self {
        Self {
            month,
            search: None,
        }
    }

    /// Filter by sale month plus a search term matched against the title,
    /// the description, and (for numeric terms) the exact price.
    ///
    /// An empty or whitespace-only term behaves like
    /// [TransactionFilter::month_only].
    pub fn with_search(month: u8, search: Option<String>) -> Self {
        let search = search.filter(|term| !term.trim().is_empty());

        Self { month, search }
    }

    /// Render the filter as a SQL WHERE clause and its parameters.
    ///
    /// The month clause compares the month component of `date_of_sale`;
    /// rows whose timestamp SQLite cannot interpret as a date never match.
    /// Search terms match as case-insensitive literal substrings, so LIKE
    /// wildcards in user input are escaped. A term that parses as a number
    /// additionally matches rows whose price equals it exactly; the three
    /// search conditions are ORed together and ANDed with the month clause.
    pub fn where_clause(&self) -> (String, Vec<Value>) {
        let mut parameters = vec![Value::Integer(self.month as i64)];
        let mut clause = format!(
            "WHERE CAST(strftime('%m', date_of_sale) AS INTEGER) = ?{}",
            parameters.len()
        );

        if let Some(term) = &self.search {
            let pattern = Value::Text(format!("%{}%", escape_like(term)));
            let mut search_parts = vec![];

            parameters.push(pattern.clone());
            search_parts.push(format!("title LIKE ?{} ESCAPE '\\'", parameters.len()));

            parameters.push(pattern);
            search_parts.push(format!("description LIKE ?{} ESCAPE '\\'", parameters.len()));

            if let Ok(price) = term.trim().parse::<f64>() {
                parameters.push(Value::Real(price));
                search_parts.push(format!("price = ?{}", parameters.len()));
            }

            clause.push_str(&format!(" AND ({})", search_parts.join(" OR ")));
        }

        (clause, parameters)
    }
}

/// Escape LIKE wildcards so a search term matches as a literal substring.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod filter_tests {
    use rusqlite::types::Value;

    use super::TransactionFilter;

    const MONTH_CLAUSE: &str = "WHERE CAST(strftime('%m', date_of_sale) AS INTEGER) = ?1";

    #[test]
    fn month_only_has_a_single_clause() {
        let (clause, parameters) = TransactionFilter::month_only(3).where_clause();

        assert_eq!(clause, MONTH_CLAUSE);
        assert_eq!(parameters, vec![Value::Integer(3)]);
    }

    #[test]
    fn search_adds_an_or_group() {
        let (clause, parameters) =
            TransactionFilter::with_search(7, Some("Phone".to_owned())).where_clause();

        assert_eq!(
            clause,
            format!(
                "{MONTH_CLAUSE} AND (title LIKE ?2 ESCAPE '\\' OR description LIKE ?3 ESCAPE '\\')"
            )
        );
        assert_eq!(
            parameters,
            vec![
                Value::Integer(7),
                Value::Text("%Phone%".to_owned()),
                Value::Text("%Phone%".to_owned()),
            ]
        );
    }

    #[test]
    fn numeric_search_also_matches_price_exactly() {
        let (clause, parameters) =
            TransactionFilter::with_search(7, Some("150".to_owned())).where_clause();

        assert_eq!(
            clause,
            format!(
                "{MONTH_CLAUSE} AND (title LIKE ?2 ESCAPE '\\' \
                 OR description LIKE ?3 ESCAPE '\\' OR price = ?4)"
            )
        );
        assert_eq!(parameters[3], Value::Real(150.0));
    }

    #[test]
    fn blank_search_is_ignored() {
        let with_empty = TransactionFilter::with_search(2, Some("".to_owned()));
        let with_spaces = TransactionFilter::with_search(2, Some("   ".to_owned()));
        let with_none = TransactionFilter::with_search(2, None);

        assert_eq!(with_empty, TransactionFilter::month_only(2));
        assert_eq!(with_spaces, TransactionFilter::month_only(2));
        assert_eq!(with_none, TransactionFilter::month_only(2));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        let (_, parameters) =
            TransactionFilter::with_search(1, Some("50%_off".to_owned())).where_clause();

        assert_eq!(parameters[1], Value::Text("%50\\%\\_off%".to_owned()));
    }
}
