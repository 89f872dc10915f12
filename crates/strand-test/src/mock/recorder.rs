//! A writer recording every value it accepts.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use strand_core::{Context, Error, Result, Writer};

#[derive(Debug)]
struct State<T> {
    values: Vec<T>,
    capacity: Option<usize>,
}

/// Records written values.
///
/// Clones share the same recording, so a test keeps one clone to inspect
/// while the other is moved into the stage under test. With
/// [`Recorder::closing_after`] the recorder closes once it holds `n` values.
#[derive(Debug)]
pub struct Recorder<T> {
    state: Arc<Mutex<State<T>>>,
}

impl<T> Recorder<T> {
    /// Creates a recorder accepting any number of values.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                values: Vec::new(),
                capacity: None,
            })),
        }
    }

    /// Creates a recorder that returns [`Error::SinkClosed`] once it holds
    /// `capacity` values.
    pub fn closing_after(capacity: usize) -> Self {
        let recorder = Self::new();
        recorder.lock().capacity = Some(capacity);
        recorder
    }

    /// Returns the number of recorded values.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    /// Returns whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().values.is_empty()
    }

    /// Removes and returns every recorded value.
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut self.lock().values)
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // A panicking test thread must not hide what was recorded.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> Recorder<T> {
    /// Returns a copy of the recorded values.
    pub fn values(&self) -> Vec<T> {
        self.lock().values.clone()
    }
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Writer<T> for Recorder<T> {
    async fn write(&mut self, _ctx: &Context, value: T) -> Result<()> {
        let mut state = self.lock();

        if state.capacity.is_some_and(|cap| state.values.len() >= cap) {
            return Err(Error::SinkClosed);
        }

        state.values.push(value);
        Ok(())
    }
}
