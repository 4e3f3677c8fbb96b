//! Problem type trait for dataset sessions.
//!
//! Defines what a pipeline must declare to be driven by a
//! [`DatasetSession`](super::DatasetSession).

use std::fmt::Debug;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// What to discard when input or config changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidationPolicy {
    pub clear_state: bool,
    pub clear_output: bool,
    pub clear_exports: bool,
}

impl InvalidationPolicy {
    pub const KEEP_ALL: Self = Self {
        clear_state: false,
        clear_output: false,
        clear_exports: false,
    };

    /// Drop state and output, keep exports already handed out.
    pub const CLEAR_COMPUTED: Self = Self {
        clear_state: true,
        clear_output: true,
        clear_exports: false,
    };
}

impl Default for InvalidationPolicy {
    fn default() -> Self {
        Self::KEEP_ALL
    }
}

/// A pipeline driven through a [`DatasetSession`](super::DatasetSession).
///
/// Behaviour lives in step functions taking `&mut DatasetSession<Self>`;
/// the trait only names the data flowing through the session and the
/// validation / invalidation hooks.
///
/// - **Config**: user settings, with defaults.
/// - **Input**: what the scene provides (camera, render settings).
/// - **State**: intermediate results between steps.
/// - **Output**: the final result of the pipeline.
/// - **Export**: what is handed to callers, derived from the output.
pub trait ProblemType: Sized + 'static {
    type Config: Clone + Default + Serialize + DeserializeOwned + Debug;
    type Input: Clone + Serialize + DeserializeOwned + Debug;
    type State: Clone + Default + Serialize + DeserializeOwned + Debug;
    type Output: Clone + Serialize + DeserializeOwned + Debug;
    type Export: Clone + Serialize + DeserializeOwned + Debug;

    /// Stable snake_case identifier stored in session files.
    fn name() -> &'static str;

    /// Bump on breaking changes to any serialized associated type.
    /// Sessions with a newer version are rejected on load.
    fn schema_version() -> u32 {
        1
    }

    fn validate_input(_input: &Self::Input) -> Result<()> {
        Ok(())
    }

    fn validate_config(_config: &Self::Config) -> Result<()> {
        Ok(())
    }

    /// Checks needing both input and config, run by
    /// [`DatasetSession::validate`](super::DatasetSession::validate).
    fn validate_input_config(_input: &Self::Input, _config: &Self::Config) -> Result<()> {
        Ok(())
    }

    fn on_input_change() -> InvalidationPolicy {
        InvalidationPolicy::CLEAR_COMPUTED
    }

    fn on_config_change() -> InvalidationPolicy {
        InvalidationPolicy::KEEP_ALL
    }

    fn export(output: &Self::Output, config: &Self::Config) -> Result<Self::Export>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policies_differ_in_what_they_clear() {
        let all = [InvalidationPolicy::KEEP_ALL, InvalidationPolicy::CLEAR_COMPUTED];
        let cleared: Vec<usize> = all
            .iter()
            .map(|p| [p.clear_state, p.clear_output, p.clear_exports].iter().filter(|b| **b).count())
            .collect();
        assert_eq!(cleared, vec![0, 2]);
        assert!(!InvalidationPolicy::CLEAR_COMPUTED.clear_exports);
        assert_eq!(InvalidationPolicy::default(), InvalidationPolicy::KEEP_ALL);
    }
}
