//! Writers attaching pagination windows to values.

use async_trait::async_trait;
use strand_core::{Context, Error, Reader, Result, Writer};

use crate::{ChainedPages, PageBounds, Paged, Pages, TRACING_TARGET};

/// Writes values to a [`Paged`] writer, one window per value.
///
/// Once the windows run out every write returns [`Error::SinkClosed`], even
/// if the wrapped writer would still accept values.
#[derive(Debug)]
pub struct PagedWriter<W> {
    writer: W,
    pages: Pages,
}

impl<W> PagedWriter<W> {
    /// Creates a paginating writer over `total` items with windows of `limit`.
    pub fn new(writer: W, total: usize, limit: usize) -> Self {
        Self {
            writer,
            pages: Pages::new(total, limit),
        }
    }

    /// Creates a paginating writer from validated bounds.
    pub fn with_bounds(writer: W, bounds: PageBounds) -> Self {
        Self {
            writer,
            pages: bounds.into(),
        }
    }

    /// Consumes the paginating writer and returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<T, W> Writer<T> for PagedWriter<W>
where
    T: Send + 'static,
    W: Writer<Paged<T>>,
{
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        let Some(page) = self.pages.next_page() else {
            tracing::trace!(target: TRACING_TARGET, "Pagination exhausted, closing writer");
            return Err(Error::SinkClosed);
        };

        self.writer.write(ctx, Paged::new(page, value)).await
    }
}

/// Writes values to a [`Paged`] writer with windows from [`ChainedPages`].
///
/// Closes once the bounds reader ends.
#[derive(Debug)]
pub struct ChainedPagedWriter<W, R> {
    writer: W,
    pages: ChainedPages<R>,
}

impl<W, R> ChainedPagedWriter<W, R> {
    /// Creates a paginating writer reading totals from `bounds`.
    pub fn new(writer: W, bounds: R, limit: usize) -> Self {
        Self {
            writer,
            pages: ChainedPages::new(bounds, limit),
        }
    }
}

#[async_trait]
impl<T, W, R> Writer<T> for ChainedPagedWriter<W, R>
where
    T: Send + 'static,
    W: Writer<Paged<T>>,
    R: Reader<usize>,
{
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        let page = match self.pages.read(ctx).await {
            Ok(page) => page,
            Err(Error::StreamEnded) => return Err(Error::SinkClosed),
            Err(err) => return Err(err),
        };

        self.writer.write(ctx, Paged::new(page, value)).await
    }
}

#[cfg(test)]
mod tests {
    use strand_core::{Discard, from_values};
    use strand_test::Recorder;

    use super::*;
    use crate::Page;

    #[tokio::test]
    async fn test_paged_writer_closes_after_last_page() {
        let ctx = Context::new();
        let recorder = Recorder::new();
        let mut writer = PagedWriter::new(recorder.clone(), 4, 2);

        writer.write(&ctx, "a").await.unwrap();
        writer.write(&ctx, "b").await.unwrap();
        assert!(writer.write(&ctx, "c").await.unwrap_err().is_sink_closed());
        assert!(writer.write(&ctx, "d").await.unwrap_err().is_sink_closed());

        assert_eq!(
            recorder.values(),
            vec![
                Paged::new(Page::new(0, 2, 4), "a"),
                Paged::new(Page::new(2, 2, 4), "b"),
            ]
        );
    }

    #[tokio::test]
    async fn test_paged_writer_ignores_inner_state() {
        let ctx = Context::new();
        let mut writer = PagedWriter::new(Discard, 1, 5);

        writer.write(&ctx, 1u8).await.unwrap();
        assert!(writer.write(&ctx, 2u8).await.unwrap_err().is_sink_closed());
    }

    #[tokio::test]
    async fn test_paged_writer_with_unset_inner() {
        let ctx = Context::new();
        let mut writer = PagedWriter::new(None::<Discard>, 4, 2);

        assert!(writer.write(&ctx, 1u8).await.unwrap_err().is_sink_closed());
    }

    #[tokio::test]
    async fn test_paged_writer_with_bounds() {
        let ctx = Context::new();
        let bounds = PageBounds::builder().total(3usize).limit(2usize).build().unwrap();
        let recorder = Recorder::new();
        let mut writer = PagedWriter::with_bounds(recorder.clone(), bounds);

        writer.write(&ctx, 'x').await.unwrap();
        writer.write(&ctx, 'y').await.unwrap();
        assert!(writer.write(&ctx, 'z').await.is_err());

        assert_eq!(recorder.values()[1].page, Page::new(2, 1, 3));
    }

    #[tokio::test]
    async fn test_chained_paged_writer() {
        let ctx = Context::new();
        let recorder = Recorder::new();
        let mut writer = ChainedPagedWriter::new(recorder.clone(), from_values([1usize, 3]), 2);

        for value in 0..3 {
            writer.write(&ctx, value).await.unwrap();
        }
        assert!(writer.write(&ctx, 3).await.unwrap_err().is_sink_closed());

        let pages: Vec<_> = recorder.values().into_iter().map(|p| p.page).collect();
        assert_eq!(
            pages,
            vec![Page::new(0, 1, 1), Page::new(0, 2, 3), Page::new(2, 1, 3)]
        );
    }
}
