//! This module defines the common functionality for paging data.

use crate::Error;

/// The defaults used when a listing request omits page or page size.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: i64,
    /// The number of transactions per page when not specified in a request.
    pub default_page_size: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

/// A validated page request: a 1-indexed page number and a positive page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    page: u64,
    per_page: u64,
}

impl PageSlice {
    /// Validate a page request.
    ///
    /// # Errors
    /// Returns [Error::InvalidPagination] when either value is not positive.
    pub fn new(page: i64, per_page: i64) -> Result<Self, Error> {
        if page < 1 || per_page < 1 {
            return Err(Error::InvalidPagination { page, per_page });
        }

        Ok(Self {
            page: page as u64,
            per_page: per_page as u64,
        })
    }

    /// The number of rows to skip: `(page - 1) * per_page`.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }

    /// The maximum number of rows in the page.
    pub fn limit(&self) -> u64 {
        self.per_page
    }

    /// The page count for `total` matching rows, rounded up.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page)
    }
}
