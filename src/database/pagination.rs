use serde::{Deserialize, Serialize};

use crate::constants::MAX_PAGE_SIZE;

/// `?page=&limit=` as sent by clients. Pages are 1-based.
#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn resolve(&self, default_size: i64) -> PageRequest {
        let page_size = self
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(default_size)
            .min(MAX_PAGE_SIZE);
        let page = self.page.filter(|page| *page > 0).unwrap_or(1);

        PageRequest { page, page_size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, request: PageRequest) -> Self {
        if rows.is_empty() && request.page == 1 {
            return Self::no_rows();
        }

        let next = if request.offset() + request.page_size < total_rows {
            Some(request.page + 1)
        } else {
            None
        };
        let previous = if request.page > 1 {
            Some(request.page - 1)
        } else {
            None
        };

        Self {
            count: total_rows,
            next,
            previous,
            results: rows,
        }
    }

    pub fn no_rows() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        }
    }

    /// Keeps the paging metadata and swaps in `results`, e.g. rows rendered into views.
    pub fn with_results<U>(self, results: Vec<U>) -> PageContext<U> {
        PageContext {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results,
        }
    }
}
