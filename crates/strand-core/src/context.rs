//! Context passed to every read and write.
//!
//! A [`Context`] carries a cooperative cancellation token and a small ordered
//! map of typed values. Observability decorators snapshot selected values into
//! their records with [`Context::snapshot`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Context for stream operations.
///
/// Cancellation is advisory: a cancelled context never aborts an in-flight
/// read or write, it only wins races against timers and is checked at loop
/// boundaries.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    values: Arc<BTreeMap<String, Value>>,
}

impl Context {
    /// Creates a new context that is not cancelled and holds no values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Adds a value.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.values).insert(key.into(), value.into());
        self
    }

    /// Returns the value stored under `key`, if any.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the values for `keys`, in the given order.
    ///
    /// Keys without a value map to [`Value::Null`].
    pub fn snapshot<S: AsRef<str>>(&self, keys: &[S]) -> ContextSnapshot {
        let entries = keys
            .iter()
            .map(|key| {
                let key = key.as_ref();
                let value = self.values.get(key).cloned().unwrap_or(Value::Null);
                (key.to_owned(), value)
            })
            .collect();

        ContextSnapshot { entries }
    }

    /// Derives a context with the same values whose cancellation is a child
    /// of this one: cancelling the parent cancels the child, not vice versa.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            values: Arc::clone(&self.values),
        }
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Returns the cancellation token.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Ordered key/value pairs taken from a [`Context`].
///
/// Serializes as a map keeping the requested key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSnapshot {
    entries: Vec<(String, Value)>,
}

impl ContextSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value captured for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Iterates over the captured pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of captured pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ContextSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
