//! 1-based page requests and paginated results.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request from optional query parameters.
    ///
    /// Page 0 is treated as page 1; the limit is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Number of rows to skip: `(page - 1) * limit`.
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// The same page number with a different page size.
    ///
    /// Used by combined views, where each content type gets a share of the
    /// requested limit. A zero share yields an empty window.
    pub fn with_limit(&self, limit: u32) -> Window {
        Window {
            offset: u64::from(self.page - 1) * u64::from(limit),
            limit,
        }
    }

    pub fn window(&self) -> Window {
        Window {
            offset: self.skip(),
            limit: self.limit,
        }
    }

    /// Split the page size across two sources: ceiling first, floor second.
    pub fn split_in_two(&self) -> (u32, u32) {
        let first = self.limit.div_ceil(2);
        (first, self.limit - first)
    }
}

/// Offset/limit window handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u32,
}

impl Window {
    pub fn unbounded() -> Self {
        Self {
            offset: 0,
            limit: u32::MAX,
        }
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
            total_pages: total.div_ceil(u64::from(request.limit)),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_and_clamping() {
        let req = PageRequest::new(None, None);
        assert_eq!(req, PageRequest { page: 1, limit: 10 });

        let req = PageRequest::new(Some(0), Some(5000));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn skip_is_zero_based_offset_of_one_based_page() {
        let req = PageRequest::new(Some(2), Some(10));
        assert_eq!(req.skip(), 10);
        assert_eq!(req.window(), Window { offset: 10, limit: 10 });
    }

    #[test]
    fn split_gives_ceiling_to_first_source() {
        assert_eq!(PageRequest::new(Some(1), Some(9)).split_in_two(), (5, 4));
        assert_eq!(PageRequest::new(Some(1), Some(10)).split_in_two(), (5, 5));
        assert_eq!(PageRequest::new(Some(1), Some(1)).split_in_two(), (1, 0));
    }

    #[test]
    fn total_pages_for_fifteen_rows() {
        let page: Page<u8> = Page::new(vec![0; 5], 15, PageRequest::new(Some(2), Some(10)));
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 5);
    }

    proptest! {
        #[test]
        fn total_pages_is_ceiling(total in 0u64..100_000, limit in 1u32..=100) {
            let page: Page<()> = Page::new(Vec::new(), total, PageRequest::new(Some(1), Some(limit)));
            let expected = (total + u64::from(limit) - 1) / u64::from(limit);
            prop_assert_eq!(page.total_pages, expected);
        }

        #[test]
        fn split_covers_whole_limit(limit in 1u32..=100) {
            let (a, b) = PageRequest::new(Some(3), Some(limit)).split_in_two();
            prop_assert_eq!(a + b, limit);
            prop_assert!(a >= b && a - b <= 1);
        }
    }
}
