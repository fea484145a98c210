//! Pagination and sorting primitives for read paths.

use serde::{Deserialize, Serialize};

/// Sort field accepted by catalog read paths.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    CreatedAt,
    Price,
    Name,
    StockQuantity,
}

impl SortBy {
    /// Parse a query parameter, falling back to `createdAt` for anything
    /// unrecognized.
    pub fn from_param(s: &str) -> Self {
        match s {
            "price" => Self::Price,
            "name" => Self::Name,
            "stockQuantity" => Self::StockQuantity,
            _ => Self::CreatedAt,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_param(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

/// Pagination + ordering for a read query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 0-based page index.
    pub page: u32,
    /// Page size, capped for safety.
    pub size: u32,
    pub sort_by: SortBy,
    pub direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 12,
            sort_by: SortBy::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, 1000),
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort_by: SortBy, direction: SortDirection) -> Self {
        self.sort_by = sort_by;
        self.direction = direction;
        self
    }

    pub fn offset(&self) -> usize {
        self.page as usize * self.size as usize
    }
}

/// One page of results plus enough metadata to render pagination controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 0-based page index this page corresponds to.
    pub page: u32,
    pub size: u32,
    /// Total matching items across all pages.
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn empty(request: &PageRequest) -> Self {
        Self {
            items: Vec::new(),
            page: request.page,
            size: request.size,
            total_items: 0,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_items.div_ceil(self.size as u64)
    }

    pub fn has_next(&self) -> bool {
        (self.page as u64 + 1) < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_math_covers_partial_last_page() {
        let page = Page {
            items: vec![1, 2, 3],
            page: 0,
            size: 3,
            total_items: 7,
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn last_page_has_no_next() {
        let page: Page<i32> = Page {
            items: vec![7],
            page: 2,
            size: 3,
            total_items: 7,
        };
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn unknown_sort_param_falls_back_to_created_at() {
        assert_eq!(SortBy::from_param("bogus"), SortBy::CreatedAt);
        assert_eq!(SortBy::from_param("price"), SortBy::Price);
    }

    #[test]
    fn size_is_clamped() {
        assert_eq!(PageRequest::new(0, 0).size, 1);
        assert_eq!(PageRequest::new(0, 5000).size, 1000);
    }
}
