//! Error types for the demo host binary.
//!
//! [`EngineError`] wraps the failure modes of startup so `main` can
//! propagate with `?`.

/// Top-level error for the demo host.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: toolgate_core::ConfigError,
    },

    /// Catalog or map construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: toolgate_world::WorldError,
    },

    /// Demo colony generation failed.
    #[error("colony error: {message}")]
    Colony {
        /// Description of the failure.
        message: String,
    },
}
