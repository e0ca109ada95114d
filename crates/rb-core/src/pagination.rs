//! Fixed-size page slicing for feed listings.
//!
//! A missing or non-numeric page parameter selects the first page; any
//! number outside `1..=num_pages` selects the last page.

use serde::Serialize;

/// Position of one page inside an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlot {
    pub number: usize,
    pub num_pages: usize,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: usize,
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Self { per_page: per_page.max(1) }
    }

    /// Resolves the raw `page` query value against a result set of `count` rows.
    pub fn locate(&self, count: i64, requested: Option<&str>) -> PageSlot {
        let count = count.max(0) as usize;
        // An empty result set still has one (empty) page.
        let num_pages = count.div_ceil(self.per_page).max(1);

        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n >= 1 && (n as usize) <= num_pages => n as usize,
            Some(Ok(_)) => num_pages,
        };

        PageSlot {
            number,
            num_pages,
            offset: ((number - 1) * self.per_page) as i64,
            limit: self.per_page as i64,
        }
    }
}

/// One page of a feed, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    /// Total rows across all pages
    pub count: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, slot: PageSlot, count: i64) -> Self {
        Self {
            items,
            number: slot.number,
            num_pages: slot.num_pages,
            count: count.max(0) as usize,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        (self.number > 1).then(|| self.number - 1)
    }

    pub fn next_page_number(&self) -> Option<usize> {
        (self.number < self.num_pages).then(|| self.number + 1)
    }

    pub fn page_range(&self) -> Vec<usize> {
        (1..=self.num_pages).collect()
    }

    pub fn is_current(&self, number: &usize) -> bool {
        self.number == *number
    }
}
