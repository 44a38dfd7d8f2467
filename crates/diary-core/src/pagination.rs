//! Fixed-size pagination over ordered result sets.

use serde::Serialize;

use crate::error::{Error, Result};

/// Page size used by the diary list unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 2;

/// Which page the caller asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageRequest {
    #[default]
    First,
    Number(usize),
    Last,
}

impl PageRequest {
    /// Parse a `?page=` query value: a 1-based number or `last`.
    ///
    /// A missing value selects the first page.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let Some(raw) = raw.map(str::trim) else {
            return Ok(Self::First);
        };
        if raw == "last" {
            return Ok(Self::Last);
        }
        raw.parse::<usize>()
            .map(Self::Number)
            .map_err(|_| Error::NotFound(format!("page `{raw}` is not a number")))
    }
}

/// Where a page sits within a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub number: usize,
    pub page_size: usize,
    pub total_items: usize,
}

impl PageWindow {
    /// Resolve a request against the total number of items.
    ///
    /// An empty result set still has page 1; any other out-of-range page is
    /// `NotFound`.
    pub fn resolve(request: PageRequest, page_size: usize, total_items: usize) -> Result<Self> {
        let page_size = page_size.max(1);
        let num_pages = total_items.div_ceil(page_size).max(1);
        let number = match request {
            PageRequest::First => 1,
            PageRequest::Last => num_pages,
            PageRequest::Number(number) => number,
        };
        if number == 0 || number > num_pages {
            return Err(Error::NotFound(format!("page {number} is out of range")));
        }
        Ok(Self {
            number,
            page_size,
            total_items,
        })
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        (self.number - 1) * self.page_size
    }

    #[must_use]
    pub fn num_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size).max(1)
    }
}

/// One page of items plus its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

impl<T> Page<T> {
    pub const fn number(&self) -> usize {
        self.window.number
    }

    pub fn num_pages(&self) -> usize {
        self.window.num_pages()
    }

    pub const fn has_previous(&self) -> bool {
        self.window.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.window.number < self.num_pages()
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then(|| self.window.number - 1)
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then(|| self.window.number + 1)
    }
}
