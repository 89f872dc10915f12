#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for pagination.
pub const TRACING_TARGET: &str = "strand_page";

mod page;
mod pages;
mod writer;

pub use page::{Page, PageBounds, PageBoundsBuilder, PageBoundsBuilderError, Paged};
pub use pages::{ChainedPages, Pages};
pub use writer::{ChainedPagedWriter, PagedWriter};
