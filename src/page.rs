//! Page requests and page envelopes for listing endpoints.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Default page size when the caller does not pass one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Zero-based page index plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Build a request; `size` must be at least 1.
    pub fn new(page: u32, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(AppError::Validation(
                "Page size must be at least 1".to_string(),
            ));
        }
        Ok(Self { page, size })
    }

    /// Page index.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }
}

/// One page of rows as returned by the database.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Total number of matching rows across all pages.
    pub total: u64,
    /// The request that produced this page.
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Map the rows and compute the response envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        let size = u64::from(self.request.size);
        let total_pages = self.total.div_ceil(size);
        let number = self.request.page;

        PageResponse {
            content: self.items.into_iter().map(f).collect(),
            number,
            size: self.request.size,
            total_elements: self.total,
            total_pages,
            first: number == 0,
            last: u64::from(number) + 1 >= total_pages,
        }
    }
}

/// Page envelope sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Page index.
    pub number: u32,
    /// Requested page size.
    pub size: u32,
    /// Total matching items.
    pub total_elements: u64,
    /// Number of pages.
    pub total_pages: u64,
    /// Is this the first page.
    pub first: bool,
    /// Is this the last page.
    pub last: bool,
}
