//! A stage that always fails.

use async_trait::async_trait;
use strand_core::{Context, Error, Reader, Result, Writer};

/// Fails every read and write with a clone of the same error.
#[derive(Debug, Clone)]
pub struct Failing {
    error: Error,
}

impl Failing {
    /// Creates a stage failing with `error`.
    pub fn new(error: Error) -> Self {
        Self { error }
    }

    /// Creates a stage failing with an operation error.
    pub fn operation(operation: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(Error::operation(operation, details))
    }
}

#[async_trait]
impl<T: Send + 'static> Reader<T> for Failing {
    async fn read(&mut self, _ctx: &Context) -> Result<T> {
        Err(self.error.clone())
    }
}

#[async_trait]
impl<T: Send + 'static> Writer<T> for Failing {
    async fn write(&mut self, _ctx: &Context, _value: T) -> Result<()> {
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_repeats_error() {
        let ctx = Context::new();
        let mut stage = Failing::operation("fetch", "refused");

        for _ in 0..2 {
            let err = Reader::<u8>::read(&mut stage, &ctx).await.unwrap_err();
            assert_eq!(err.to_string(), "Operation failed: fetch - refused");
        }
        assert!(stage.write(&ctx, 1u8).await.is_err());
    }
}
