//! Pagination window descriptors.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strand_core::Error;

/// A pagination window: `limit` items starting at `skip`, out of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Page {
    /// Number of items before this window.
    pub skip: usize,
    /// Number of items in this window.
    pub limit: usize,
    /// Total number of items across all windows.
    pub total: usize,
}

impl Page {
    /// Creates a new window.
    pub fn new(skip: usize, limit: usize, total: usize) -> Self {
        Self { skip, limit, total }
    }

    /// Returns the index one past the last item of this window.
    pub fn end(&self) -> usize {
        self.skip + self.limit
    }

    /// Returns whether this is the final window of its bound.
    pub fn is_last(&self) -> bool {
        self.end() >= self.total
    }
}

/// A value paired with the window under which it was produced or consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paged<T> {
    /// The pagination window.
    #[serde(flatten)]
    pub page: Page,
    /// The value.
    pub value: T,
}

impl<T> Paged<T> {
    /// Pairs `value` with `page`.
    pub fn new(page: Page, value: T) -> Self {
        Self { page, value }
    }

    /// Consumes the pair and returns the value.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Bounds of a single pagination run.
///
/// Built with [`PageBoundsBuilder`], which rejects a zero `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct PageBounds {
    /// Total number of items to page through.
    #[builder(default)]
    pub total: usize,
    /// Maximum number of items per window.
    pub limit: usize,
}

impl PageBounds {
    /// Returns a builder for page bounds.
    pub fn builder() -> PageBoundsBuilder {
        PageBoundsBuilder::default()
    }

    /// Returns the number of windows these bounds produce.
    pub fn page_count(&self) -> usize {
        if self.limit == 0 {
            return 0;
        }

        self.total.div_ceil(self.limit)
    }
}

impl PageBoundsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(limit) = self.limit {
            if limit == 0 {
                return Err("limit must be at least 1".into());
            }
        }
        Ok(())
    }
}

impl From<PageBoundsBuilderError> for Error {
    fn from(err: PageBoundsBuilderError) -> Self {
        Error::invalid_config(err.to_string())
    }
}
