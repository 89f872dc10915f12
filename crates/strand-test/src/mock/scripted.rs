//! A reader replaying a fixed script of results.

use std::collections::VecDeque;

use async_trait::async_trait;
use strand_core::{Context, Error, Reader, Result};

/// Replays scripted results in order, then ends.
///
/// Unlike [`strand_core::Values`] the script may contain errors, which makes
/// it handy for testing how stages treat a failing upstream.
#[derive(Debug)]
pub struct Scripted<T> {
    script: VecDeque<Result<T>>,
}

impl<T> Scripted<T> {
    /// Creates a reader replaying `script`.
    pub fn new(script: impl IntoIterator<Item = Result<T>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Returns the number of results left to replay.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait]
impl<T: Send + 'static> Reader<T> for Scripted<T> {
    async fn read(&mut self, _ctx: &Context) -> Result<T> {
        self.script.pop_front().unwrap_or(Err(Error::StreamEnded))
    }
}
