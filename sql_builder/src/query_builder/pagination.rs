//! LIMIT / OFFSET and page-based paging

use crate::errors::BuildError;

/// Rows per page when `set_paging` was never called
pub const DEFAULT_PAGING: u64 = 10;

/// Pagination configuration
///
/// `page(n)` derives LIMIT and OFFSET from the rows-per-page setting;
/// an explicit `with_limit` / `with_offset` afterwards overrides it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    paging: u64,
    page: Option<u64>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new()
    }
}

impl Pagination {
    pub fn new() -> Self {
        Self {
            limit: None,
            offset: None,
            paging: DEFAULT_PAGING,
            page: None,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self.page = None;
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self.page = None;
        self
    }

    /// Set the number of rows per page. Recomputes the current page, if any.
    pub fn with_paging(mut self, paging: u64) -> Self {
        self.paging = paging.max(1);
        if let Some(page) = self.page {
            self = self.with_page(page);
        }
        self
    }

    /// Select a 1-based page. Page 0 clears LIMIT and OFFSET.
    pub fn with_page(mut self, page: u64) -> Self {
        if page == 0 {
            self.limit = None;
            self.offset = None;
            self.page = None;
        } else {
            // Saturates; to_sql rejects anything past BIGINT
            self.limit = Some(self.paging);
            self.offset = Some(self.paging.saturating_mul(page - 1));
            self.page = Some(page);
        }
        self
    }

    pub fn paging(&self) -> u64 {
        self.paging
    }

    pub fn page(&self) -> Option<u64> {
        self.page
    }

    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }

    /// LIMIT and OFFSET are BIGINT in PostgreSQL, so values past
    /// `i64::MAX` are rejected rather than sent.
    pub fn to_sql(&self) -> Result<String, BuildError> {
        let mut clauses = Vec::new();

        if let Some(limit) = self.limit {
            clauses.push(format!("LIMIT {}", bigint("limit", limit)?));
        }

        if let Some(offset) = self.offset {
            clauses.push(format!("OFFSET {}", bigint("offset", offset)?));
        }

        Ok(clauses.join(" "))
    }
}

fn bigint(field: &str, value: u64) -> Result<i64, BuildError> {
    i64::try_from(value).map_err(|_| {
        BuildError::invalid_value(field, format!("{} exceeds the largest BIGINT", value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_and_offset() {
        let pagination = Pagination::new().with_limit(5).with_offset(20);
        assert_eq!(pagination.to_sql().unwrap(), "LIMIT 5 OFFSET 20");
        assert_eq!(Pagination::new().to_sql().unwrap(), "");
    }

    #[test]
    fn test_page_uses_default_paging() {
        let pagination = Pagination::new().with_page(3);
        assert_eq!(pagination.paging(), DEFAULT_PAGING);
        assert_eq!(pagination.to_sql().unwrap(), "LIMIT 10 OFFSET 20");
    }

    #[test]
    fn test_paging_recomputes_current_page() {
        let pagination = Pagination::new().with_page(2).with_paging(25);
        assert_eq!(pagination.to_sql().unwrap(), "LIMIT 25 OFFSET 25");

        let pagination = Pagination::new().with_paging(25).with_page(1);
        assert_eq!(pagination.to_sql().unwrap(), "LIMIT 25 OFFSET 0");
    }

    #[test]
    fn test_page_zero_clears() {
        let pagination = Pagination::new().with_page(4).with_page(0);
        assert!(pagination.is_empty());
        assert_eq!(pagination.page(), None);
    }

    #[test]
    fn test_explicit_limit_overrides_page() {
        let pagination = Pagination::new().with_page(2).with_limit(3).with_paging(50);
        assert_eq!(pagination.to_sql().unwrap(), "LIMIT 3 OFFSET 10");
    }

    #[test]
    fn test_far_page_is_rejected_not_wrapped() {
        let pagination = Pagination::new().with_paging(1000).with_page(u64::MAX / 10);
        assert!(matches!(
            pagination.to_sql(),
            Err(BuildError::InvalidValue { ref field, .. }) if field == "offset"
        ));
    }

    #[test]
    fn test_limit_and_offset_fit_bigint() {
        let largest = i64::MAX as u64;
        let pagination = Pagination::new().with_limit(largest).with_offset(largest);
        assert_eq!(
            pagination.to_sql().unwrap(),
            format!("LIMIT {} OFFSET {}", largest, largest)
        );

        let too_many = Pagination::new().with_limit(largest + 1);
        assert!(matches!(
            too_many.to_sql(),
            Err(BuildError::InvalidValue { ref field, .. }) if field == "limit"
        ));
    }
}
