//! Error types for roof-script

use thiserror::Error;

/// Definition loading error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("model {model} extends unknown model {parent}")]
    UnknownParent { model: String, parent: String },

    #[error("inheritance cycle: {0}")]
    Cycle(String),

    #[error("model {model} declares action \"{action}\" but no implementation is registered")]
    MissingAction { model: String, action: String },

    #[error(transparent)]
    Core(#[from] roof_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
