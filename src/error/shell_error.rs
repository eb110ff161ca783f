//! Top-level shell errors.

use thiserror::Error;

use super::{ApprovalError, ExecutionError, ResolveError, StoreError};

/// Shell-level errors
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Config parse error: {0}")]
    ConfigParse(String),
    #[error("Coordinate collision at {coordinate}: {existing} and {incoming}")]
    CoordinateCollision {
        coordinate: String,
        existing: String,
        incoming: String,
    },
    #[error("Invalid nav coordinate '{0}'")]
    InvalidCoordinate(String),
    #[error("Command error: {0}")]
    Command(String),
    #[error("Invalid JSON arguments: {0}")]
    InvalidArguments(String),
    #[error("Variable '{0}' not found")]
    UnknownVariable(String),
    #[error("Chain step {step} failed: {source}")]
    ChainStep {
        step: usize,
        #[source]
        source: Box<ShellError>,
    },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
