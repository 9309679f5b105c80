//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run itself.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: sugarscape_core::ConfigError,
    },

    /// Building or running the simulation failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: sugarscape_core::RunnerError,
    },
}
