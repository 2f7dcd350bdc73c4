//! Shared pagination primitives for crop-connect list queries.
//!
//! A [`PageRequest`] carries a validated 1-based page number and page size;
//! adapters translate it into a skip/limit pair via [`PageRequest::skip`].
//! Query results travel back as a [`Page`], which knows the total number of
//! matching rows so inbound adapters can render a [`PageInfo`] envelope.

use serde::{Deserialize, Serialize};

/// Page size applied when a caller does not supply one.
pub const DEFAULT_LIMIT: u64 = 10;

/// Validation failures raised while building a [`PageRequest`] or parsing a
/// [`SortOrder`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// Page numbers start at one.
    #[error("page must be at least 1")]
    PageOutOfRange,
    /// A page must hold at least one row.
    #[error("limit must be at least 1")]
    LimitOutOfRange,
    /// Sort order was neither `asc` nor `desc`.
    #[error("order must be `asc` or `desc`, got `{0}`")]
    UnknownOrder(String),
}

/// Direction applied to the sort key of a list query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Smallest key first.
    #[serde(rename = "asc")]
    Ascending,
    /// Largest key first.
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    /// Parse the `asc` / `desc` wire spelling.
    ///
    /// # Examples
    /// ```
    /// use pagination::SortOrder;
    ///
    /// assert_eq!(SortOrder::parse("asc"), Ok(SortOrder::Ascending));
    /// assert!(SortOrder::parse("sideways").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, PaginationError> {
        match raw {
            "asc" => Ok(Self::Ascending),
            "desc" => Ok(Self::Descending),
            other => Err(PaginationError::UnknownOrder(other.to_owned())),
        }
    }

    /// Apply this order to an ascending comparison result.
    #[must_use]
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Validated page coordinates.
///
/// ## Invariants
/// - `page >= 1`
/// - `limit >= 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    /// Build a page request, rejecting zero page numbers and sizes.
    ///
    /// # Examples
    /// ```
    /// use pagination::PageRequest;
    ///
    /// let request = PageRequest::new(3, 20).unwrap();
    /// assert_eq!(request.skip(), 40);
    /// ```
    pub const fn new(page: u64, limit: u64) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::PageOutOfRange);
        }
        if limit == 0 {
            return Err(PaginationError::LimitOutOfRange);
        }
        Ok(Self { page, limit })
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Maximum number of rows on the page.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of rows preceding this page.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Slice an already sorted collection down to this page.
    #[must_use]
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.into_iter().skip(skip).take(limit).collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// One page of query results together with the unpaged match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Total rows matching the filter across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Describe where this page sits within the full result set.
    #[must_use]
    pub fn info(&self, request: PageRequest) -> PageInfo {
        PageInfo::new(request, self.total)
    }

    /// Transform every row while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// Pagination envelope rendered alongside list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Requested page size.
    pub size: u64,
    /// Total rows matching the filter.
    pub total_data: u64,
    /// The 1-based page being returned.
    pub current_page: u64,
    /// Number of pages needed to cover `total_data`.
    pub total_page: u64,
}

impl PageInfo {
    /// Compute the envelope for `total` rows split by `request`.
    ///
    /// # Examples
    /// ```
    /// use pagination::{PageInfo, PageRequest};
    ///
    /// let info = PageInfo::new(PageRequest::new(2, 10).unwrap(), 21);
    /// assert_eq!(info.total_page, 3);
    /// ```
    #[must_use]
    pub const fn new(request: PageRequest, total: u64) -> Self {
        Self {
            size: request.limit,
            total_data: total,
            current_page: request.page,
            total_page: total.div_ceil(request.limit),
        }
    }
}
