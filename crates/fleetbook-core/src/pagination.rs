//! Offset pagination shared by the server list and the audit log.
//!
//! Page numbers are 1-based. Query values that are absent, not numeric, or
//! below 1 fall back to the defaults instead of failing the request.

use serde::Serialize;

/// Page used when the caller does not ask for one.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 30;

/// A validated `(page, per_page)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Build a page request; zero values are replaced by the defaults.
    pub const fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            per_page: if per_page == 0 {
                DEFAULT_PER_PAGE
            } else {
                per_page
            },
        }
    }

    /// Build a page request from raw query-string values.
    ///
    /// Leading digits are honoured (`"3abc"` is page 3); anything without a
    /// leading digit, or that evaluates to 0, takes the default.
    pub fn from_query(page: Option<&str>, per_page: Option<&str>, default_per_page: u32) -> Self {
        let page = page.and_then(leading_int).unwrap_or(DEFAULT_PAGE);
        let per_page = per_page
            .and_then(leading_int)
            .unwrap_or_else(|| default_per_page.max(1));
        Self::new(page, per_page)
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Rows to skip: `(page - 1) * per_page`, saturating at `i64::MAX` so
    /// far-out pages come back empty.
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1).saturating_mul(self.per_page as i64)
    }

    /// Rows to take.
    pub const fn limit(&self) -> i64 {
        self.per_page as i64
    }

    /// `ceil(total / per_page)`; zero when there are no rows.
    pub const fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        let per_page = self.per_page as i64;
        (total + per_page - 1) / per_page
    }

    /// Wrap a page of rows with the counters the API reports.
    pub const fn envelope(&self, total: i64) -> PageInfo {
        PageInfo {
            total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages(total),
        }
    }
}

/// Page counters returned next to every paged result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: i64,
}

fn leading_int(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let digits: &str = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed, |end| &trimmed[..end]);
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}
