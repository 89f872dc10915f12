//! Configuration shared by every observing decorator.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strand_core::{Context, ContextSnapshot, Error};

/// Tag used when none is configured.
pub const UNSET_TAG: &str = "<unset>";

/// Configuration of an observing decorator.
///
/// The tag names the decorator in its records: it becomes the stats tag or the
/// log message. The context keys select which [`Context`] values are copied
/// into every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(
    name = "ObserveConfigBuilder",
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
#[serde(default)]
pub struct ObserveConfig {
    /// Name of the decorator in its records.
    #[builder(default = "UNSET_TAG.to_owned()")]
    tag: String,
    /// Context keys to snapshot into every record.
    #[builder(default)]
    ctx_keys: Vec<String>,
}

impl ObserveConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(keys) = &self.ctx_keys {
            if keys.iter().any(|key| key.is_empty()) {
                return Err("context keys must not be empty".into());
            }
        }
        Ok(())
    }
}

impl ObserveConfig {
    /// Creates a configuration with `tag` and no context keys.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ctx_keys: Vec::new(),
        }
    }

    /// Returns a builder for an observing configuration.
    pub fn builder() -> ObserveConfigBuilder {
        ObserveConfigBuilder::default()
    }

    /// Returns the tag, or [`UNSET_TAG`] when it is empty.
    pub fn tag(&self) -> &str {
        if self.tag.is_empty() {
            return UNSET_TAG;
        }
        &self.tag
    }

    /// Returns the context keys.
    pub fn ctx_keys(&self) -> &[String] {
        &self.ctx_keys
    }

    /// Copies the configured keys out of `ctx`.
    pub fn snapshot(&self, ctx: &Context) -> ContextSnapshot {
        ctx.snapshot(self.ctx_keys.as_slice())
    }
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self::new(UNSET_TAG)
    }
}

impl From<ObserveConfigBuilderError> for Error {
    fn from(err: ObserveConfigBuilderError) -> Self {
        Error::invalid_config(err.to_string())
    }
}
