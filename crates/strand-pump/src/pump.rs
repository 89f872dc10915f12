//! The pump and the handle controlling it.

use strand_core::{Context, Error, Reader, Result, Writer};
use tokio::task::JoinHandle;
use tokio_util::sync::DropGuard;

use crate::{PumpReport, StopReason, TRACING_TARGET};

/// Moves values from a reader into a writer on a background task.
///
/// Reads and writes strictly alternate. The loop checks for cancellation
/// before every read and yields to the runtime after every write; a cancelled
/// context never interrupts a read or write already in flight.
#[derive(Debug)]
pub struct Pump<R, W> {
    reader: Option<R>,
    writer: Option<W>,
    ctx: Context,
}

impl<R, W> Pump<R, W> {
    /// Creates a pump. A missing reader or writer makes the pump stop right
    /// away once spawned.
    pub fn new(reader: Option<R>, writer: Option<W>) -> Self {
        Self {
            reader,
            writer,
            ctx: Context::new(),
        }
    }

    /// Sets the parent context.
    ///
    /// The pump runs with a child of it: cancelling the parent stops the pump,
    /// while the pump finishing does not cancel the parent.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Spawns the pump on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn spawn<T>(self) -> PumpHandle
    where
        T: Send + 'static,
        R: Reader<T> + 'static,
        W: Writer<T> + 'static,
    {
        let ctx = self.ctx.child();
        let guard = ctx.cancellation_token().clone().drop_guard();

        let task = match (self.reader, self.writer) {
            (Some(reader), Some(writer)) => {
                tokio::spawn(run::<T, R, W>(reader, writer, ctx.clone(), guard))
            }
            _ => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    "Pump is missing its reader or writer, stopping"
                );
                drop(guard);
                tokio::spawn(async { PumpReport::unconfigured() })
            }
        };

        PumpHandle { ctx, task }
    }
}

async fn run<T, R, W>(mut reader: R, mut writer: W, ctx: Context, _guard: DropGuard) -> PumpReport
where
    T: Send + 'static,
    R: Reader<T>,
    W: Writer<T>,
{
    tracing::info!(target: TRACING_TARGET, "Starting pump");

    let mut reads = 0;
    let mut writes = 0;

    let stop = loop {
        if ctx.is_cancelled() {
            break StopReason::Cancelled;
        }

        let value = match reader.read(&ctx).await {
            Ok(value) => value,
            Err(err) => break StopReason::Reader(err),
        };
        reads += 1;

        if let Err(err) = writer.write(&ctx, value).await {
            break StopReason::Writer(err);
        }
        writes += 1;

        tokio::task::yield_now().await;
    };

    match &stop {
        StopReason::Reader(err) | StopReason::Writer(err) if !err.is_terminal() => {
            tracing::warn!(
                target: TRACING_TARGET,
                reads,
                writes,
                error = %err,
                "Pump stopped on error"
            );
        }
        _ => {
            tracing::info!(
                target: TRACING_TARGET,
                reads,
                writes,
                stop = ?stop,
                "Pump stopped"
            );
        }
    }

    PumpReport {
        reads,
        writes,
        stop,
    }
}

/// Controls a spawned [`Pump`].
///
/// Dropping the handle detaches the task; the pump keeps running until it
/// stops on its own or its parent context is cancelled.
#[derive(Debug)]
pub struct PumpHandle {
    ctx: Context,
    task: JoinHandle<PumpReport>,
}

impl PumpHandle {
    /// Requests the pump to stop before its next read.
    pub fn cancel(&self) {
        self.ctx.cancel();
    }

    /// Returns whether the pump was cancelled or has stopped.
    pub fn is_cancelled(&self) -> bool {
        self.ctx.is_cancelled()
    }

    /// Resolves once the pump was cancelled or has stopped.
    pub async fn cancelled(&self) {
        self.ctx.cancelled().await;
    }

    /// Returns the context the pump runs with.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Returns whether the background task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the pump to stop and returns its report.
    pub async fn join(self) -> Result<PumpReport> {
        self.task
            .await
            .map_err(|err| Error::operation("pump", err.to_string()))
    }

    /// Aborts the background task.
    ///
    /// Unlike [`PumpHandle::cancel`], this interrupts a read or write in flight.
    pub fn abort(&self) {
        self.task.abort();
    }
}
