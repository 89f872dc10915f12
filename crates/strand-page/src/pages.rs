//! Readers producing pagination windows.

use async_trait::async_trait;
use strand_core::{Context, Error, Reader, Result};

use crate::{Page, PageBounds, TRACING_TARGET};

/// Pages from `0` to `total` in steps of `limit`, then ends.
///
/// Every window but the last holds exactly `limit` items; the last one is
/// truncated so the limits sum to `total`. A zero `limit` produces no windows.
///
/// # Example
///
/// ```
/// use strand_page::{Page, Pages};
///
/// let pages: Vec<Page> = Pages::new(5, 3).collect();
/// assert_eq!(pages, vec![Page::new(0, 3, 5), Page::new(3, 2, 5)]);
/// ```
#[derive(Debug, Clone)]
pub struct Pages {
    total: usize,
    limit: usize,
    skip: usize,
}

impl Pages {
    /// Creates a generator over `total` items with windows of `limit`.
    pub fn new(total: usize, limit: usize) -> Self {
        Self {
            total,
            limit,
            skip: 0,
        }
    }

    /// Returns the next window, or `None` once `total` is covered.
    pub fn next_page(&mut self) -> Option<Page> {
        if self.limit == 0 || self.skip >= self.total {
            return None;
        }

        let page = Page {
            skip: self.skip,
            limit: self.limit.min(self.total - self.skip),
            total: self.total,
        };

        self.skip = self.skip.saturating_add(self.limit);
        Some(page)
    }

    /// Returns the total this generator pages through.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Returns whether every window was produced.
    pub fn is_exhausted(&self) -> bool {
        self.limit == 0 || self.skip >= self.total
    }
}

impl From<PageBounds> for Pages {
    fn from(bounds: PageBounds) -> Self {
        Self::new(bounds.total, bounds.limit)
    }
}

impl Iterator for Pages {
    type Item = Page;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_page()
    }
}

#[async_trait]
impl Reader<Page> for Pages {
    async fn read(&mut self, _ctx: &Context) -> Result<Page> {
        self.next_page().ok_or(Error::StreamEnded)
    }
}

/// Pages through a stream of bounds as one continuous stream of windows.
///
/// Each total read from the bounds reader starts a fresh [`Pages`] run with
/// the shared `limit`. A zero total produces no windows and the next bound is
/// read right away. Once the bounds reader ends, so does this reader.
#[derive(Debug)]
pub struct ChainedPages<R> {
    bounds: R,
    limit: usize,
    current: Pages,
    ended: bool,
}

impl<R> ChainedPages<R> {
    /// Creates a chained generator reading totals from `bounds`.
    pub fn new(bounds: R, limit: usize) -> Self {
        Self {
            bounds,
            limit,
            current: Pages::new(0, limit),
            ended: limit == 0,
        }
    }
}

#[async_trait]
impl<R: Reader<usize>> Reader<Page> for ChainedPages<R> {
    async fn read(&mut self, ctx: &Context) -> Result<Page> {
        loop {
            if self.ended {
                return Err(Error::StreamEnded);
            }

            if let Some(page) = self.current.next_page() {
                return Ok(page);
            }

            match self.bounds.read(ctx).await {
                Ok(total) => {
                    tracing::trace!(
                        target: TRACING_TARGET,
                        total,
                        limit = self.limit,
                        "Starting next pagination bound"
                    );
                    self.current = Pages::new(total, self.limit);
                }
                Err(Error::StreamEnded) => {
                    self.ended = true;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
